mod authn_middleware;
pub(crate) mod api_resources;
pub(crate) mod api_scopes;
pub(crate) mod clients;
pub(crate) mod files;
pub(crate) mod health;
pub(crate) mod identity_resources;
pub(crate) mod roles;
pub(crate) mod tokens;
pub(crate) mod users;

use crate::api::authn_middleware::{access_token_middleware, api_key_middleware};
use crate::state::AppState;
use axum::{middleware, Router};

/// Combines all API routes into a single router
pub(super) fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(issuance_routes(state))
        .merge(admin_routes(state))
}

/// Token issuance, called by the identity engine with the service API key
fn issuance_routes(state: &AppState) -> Router<AppState> {
    tokens::issuance_router().route_layer(middleware::from_fn_with_state(
        state.clone(),
        api_key_middleware,
    ))
}

/// Administrative routes that require a bearer access token
fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(clients::router())
        .merge(api_resources::router())
        .merge(api_scopes::router())
        .merge(identity_resources::router())
        .merge(roles::router())
        .merge(users::router())
        .merge(files::router())
        .merge(tokens::userinfo_router())
        // route_layer keeps unmatched paths answering 404 instead of 401
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            access_token_middleware,
        ))
}
