use crate::errors::ApiError;
use crate::permissions::Principal;
use crate::state::AppState;
use crate::tokens::TokenError;
use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use log::{error, warn};

const API_KEY_REJECTED: &str =
    "You are not authorized to access this resource, please check your API key.";

/// Credential presented as `Authorization: Bearer <credential>`
fn bearer_credential(request: &Request<Body>) -> Result<Option<&str>, ApiError> {
    let Some(header) = request.headers().get(http::header::AUTHORIZATION) else {
        return Ok(None);
    };
    let header = header.to_str().map_err(|e| {
        warn!("Failed to parse Authorization header to string: {e}");
        ApiError::unauthorized("Malformed Authorization header")
    })?;
    match header.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => Ok(Some(header[7..].trim())),
        _ => {
            warn!("Invalid Authorization header format, missing 'Bearer ' prefix");
            Err(ApiError::unauthorized(
                "Authorization header must use the Bearer scheme",
            ))
        }
    }
}

fn missing_header() -> Response {
    warn!("Missing Authorization header");
    ApiError::unauthorized("Missing Authorization header").into_response()
}

/// Guards the token issuance surface with the service API key.
pub(super) async fn api_key_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let api_key = match bearer_credential(&request) {
        Ok(Some(api_key)) => api_key,
        Ok(None) => return missing_header(),
        Err(_) => return ApiError::new(API_KEY_REJECTED, StatusCode::FORBIDDEN).into_response(),
    };

    if api_key != state.config.api_key {
        warn!("Authentication failed: Invalid API key");
        return ApiError::new(API_KEY_REJECTED, StatusCode::FORBIDDEN).into_response();
    }
    next.run(request).await
}

/// Resolves the bearer token of an administrative request into a [`Principal`].
///
/// The principal carries the claims recorded at issuance; permission checks
/// happen per handler.
pub(super) async fn access_token_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = match bearer_credential(&request) {
        Ok(Some(token)) => token,
        Ok(None) => return missing_header(),
        Err(err) => return err.into_response(),
    };

    let principal = match state.tokens.validate(token).await {
        Ok(stored) => Principal::new(stored.subject, stored.claims),
        Err(TokenError::TokenNotFound) => {
            warn!("Authentication failed: unknown or expired access token");
            return ApiError::unauthorized("Invalid or expired access token").into_response();
        }
        Err(e) => {
            error!("Failed to validate access token: {e}");
            return ApiError::internal("Failed to validate access token").into_response();
        }
    };

    request.extensions_mut().insert(principal);
    next.run(request).await
}
