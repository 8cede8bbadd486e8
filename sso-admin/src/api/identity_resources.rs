use crate::errors::ApiError;
use crate::models::{ListQuery, Page, Property};
use crate::openapi::IDENTITY_RESOURCES_TAG;
use crate::permissions::{
    Authorized, SsoServerCreate, SsoServerDelete, SsoServerUpdate, SsoServerView,
};
use crate::services::identity_resources::{self, IdentityResourceDetail, IdentityResourceSummary};
use crate::services::properties::PropertyRequest;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/identity-resources", post(create_identity_resource))
        .route("/identity-resources/filter", get(list_identity_resources))
        .route(
            "/identity-resources/{name}",
            get(get_identity_resource)
                .put(update_identity_resource)
                .delete(delete_identity_resource),
        )
        .route(
            "/identity-resources/{name}/properties",
            get(list_properties).post(add_property),
        )
        .route(
            "/identity-resources/{name}/properties/{key}",
            delete(remove_property),
        )
}

#[utoipa::path(
    get,
    path = "/identity-resources/filter",
    tag = IDENTITY_RESOURCES_TAG,
    params(
        ListQuery,
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Identity resources matching the filter", body = Page<IdentityResourceSummary>),
        (status = 400, description = "Invalid page window")
    )
)]
pub(crate) async fn list_identity_resources(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
    query: ListQuery,
) -> Result<Json<Page<IdentityResourceSummary>>, ApiError> {
    Ok(Json(
        identity_resources::list(state.store.as_ref(), &query).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/identity-resources",
    tag = IDENTITY_RESOURCES_TAG,
    request_body = IdentityResourceDetail,
    params(("Authorization" = String, Header, description = "Bearer access token")),
    responses(
        (status = 201, description = "Identity resource created"),
        (status = 400, description = "Missing name"),
        (status = 409, description = "Name already taken")
    )
)]
pub(crate) async fn create_identity_resource(
    State(state): State<AppState>,
    _: Authorized<SsoServerCreate>,
    Json(request): Json<IdentityResourceDetail>,
) -> Result<StatusCode, ApiError> {
    identity_resources::create(state.store.as_ref(), request).await?;
    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    get,
    path = "/identity-resources/{name}",
    tag = IDENTITY_RESOURCES_TAG,
    params(
        ("name" = String, Path, description = "Identity resource name"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Identity resource with its user claims", body = IdentityResourceDetail),
        (status = 404, description = "Identity resource not found")
    )
)]
pub(crate) async fn get_identity_resource(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
    Path(name): Path<String>,
) -> Result<Json<IdentityResourceDetail>, ApiError> {
    Ok(Json(
        identity_resources::get(state.store.as_ref(), &name).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/identity-resources/{name}",
    tag = IDENTITY_RESOURCES_TAG,
    request_body = IdentityResourceDetail,
    params(
        ("name" = String, Path, description = "Identity resource name"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 204, description = "Identity resource updated"),
        (status = 400, description = "Body name differs from the path"),
        (status = 404, description = "Identity resource not found")
    )
)]
pub(crate) async fn update_identity_resource(
    State(state): State<AppState>,
    _: Authorized<SsoServerUpdate>,
    Path(name): Path<String>,
    Json(request): Json<IdentityResourceDetail>,
) -> Result<StatusCode, ApiError> {
    identity_resources::update(state.store.as_ref(), &name, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/identity-resources/{name}",
    tag = IDENTITY_RESOURCES_TAG,
    params(
        ("name" = String, Path, description = "Identity resource name"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 204, description = "Identity resource deleted"),
        (status = 404, description = "Identity resource not found")
    )
)]
pub(crate) async fn delete_identity_resource(
    State(state): State<AppState>,
    _: Authorized<SsoServerDelete>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    identity_resources::delete(state.store.as_ref(), &name).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/identity-resources/{name}/properties",
    tag = IDENTITY_RESOURCES_TAG,
    params(
        ("name" = String, Path, description = "Identity resource name"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Identity resource properties", body = Vec<Property>),
        (status = 404, description = "Identity resource not found")
    )
)]
pub(crate) async fn list_properties(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Property>>, ApiError> {
    Ok(Json(
        identity_resources::list_properties(state.store.as_ref(), &name).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/identity-resources/{name}/properties",
    tag = IDENTITY_RESOURCES_TAG,
    request_body = PropertyRequest,
    params(
        ("name" = String, Path, description = "Identity resource name"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 201, description = "Property added", body = Property),
        (status = 404, description = "Identity resource not found"),
        (status = 409, description = "Property key already present")
    )
)]
pub(crate) async fn add_property(
    State(state): State<AppState>,
    _: Authorized<SsoServerCreate>,
    Path(name): Path<String>,
    Json(request): Json<PropertyRequest>,
) -> Result<(StatusCode, Json<Property>), ApiError> {
    let property =
        identity_resources::add_property(state.store.as_ref(), &name, request).await?;
    Ok((StatusCode::CREATED, Json(property)))
}

#[utoipa::path(
    delete,
    path = "/identity-resources/{name}/properties/{key}",
    tag = IDENTITY_RESOURCES_TAG,
    params(
        ("name" = String, Path, description = "Identity resource name"),
        ("key" = String, Path, description = "Property key"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 204, description = "Property removed"),
        (status = 404, description = "Identity resource or property not found")
    )
)]
pub(crate) async fn remove_property(
    State(state): State<AppState>,
    _: Authorized<SsoServerDelete>,
    Path((name, key)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    identity_resources::remove_property(state.store.as_ref(), &name, &key).await?;
    Ok(StatusCode::NO_CONTENT)
}
