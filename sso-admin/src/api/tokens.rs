//! Token issuance surface used by the identity engine.
//!
//! `/connect/token` and `/connect/revoke` are guarded by the service API key;
//! `/connect/userinfo` by the access token it describes.

use crate::errors::ApiError;
use crate::headers::presets;
use crate::openapi::CONNECT_TAG;
use crate::permissions::{Claim, Principal};
use crate::services::profile;
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub(super) fn issuance_router() -> Router<AppState> {
    Router::new()
        .route("/connect/token", post(issue_token))
        .route("/connect/revoke", post(revoke_token))
}

pub(super) fn userinfo_router() -> Router<AppState> {
    Router::new().route("/connect/userinfo", get(userinfo))
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenRequest {
    /// User id or user name the token is issued to
    pub subject: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: u64,
    pub claims: Vec<Claim>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RevokeRequest {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserInfo {
    pub sub: String,
    pub claims: Vec<Claim>,
}

fn without_caching(body: impl IntoResponse) -> Response {
    let mut response = body.into_response();
    presets::credentials().apply(&mut response);
    response
}

/// Issues an access token carrying freshly computed claims for a user
#[utoipa::path(
    post,
    path = "/connect/token",
    tag = CONNECT_TAG,
    request_body = TokenRequest,
    params(("Authorization" = String, Header, description = "Bearer service API key")),
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Missing API key"),
        (status = 403, description = "Invalid API key"),
        (status = 404, description = "Unknown subject")
    )
)]
pub(crate) async fn issue_token(
    State(state): State<AppState>,
    Json(request): Json<TokenRequest>,
) -> Result<Response, ApiError> {
    let subject = request.subject.trim();
    if subject.is_empty() {
        return Err(ApiError::bad_request("subject is required"));
    }
    let (user, claims) = profile::issue_claims(
        state.store.as_ref(),
        subject,
        &state.config.default_avatar,
    )
    .await?;
    let (access_token, stored) = state
        .tokens
        .issue(&user.id, claims)
        .await
        .map_err(|e| {
            error!("Failed to issue token for '{}': {e}", user.user_name);
            ApiError::internal("Failed to issue token")
        })?;
    info!("Issued access token to '{}'", user.user_name);

    Ok(without_caching(Json(TokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.ttl(),
        claims: stored.claims,
    })))
}

/// Revokes an access token; unknown tokens are accepted silently
#[utoipa::path(
    post,
    path = "/connect/revoke",
    tag = CONNECT_TAG,
    request_body = RevokeRequest,
    params(("Authorization" = String, Header, description = "Bearer service API key")),
    responses(
        (status = 200, description = "Token revoked"),
        (status = 403, description = "Invalid API key")
    )
)]
pub(crate) async fn revoke_token(
    State(state): State<AppState>,
    Json(request): Json<RevokeRequest>,
) -> Result<StatusCode, ApiError> {
    state.tokens.revoke(request.token.trim()).await.map_err(|e| {
        error!("Failed to revoke token: {e}");
        ApiError::internal("Failed to revoke token")
    })?;
    Ok(StatusCode::OK)
}

/// Claims of the token presented with the request
#[utoipa::path(
    get,
    path = "/connect/userinfo",
    tag = CONNECT_TAG,
    params(("Authorization" = String, Header, description = "Bearer access token")),
    responses(
        (status = 200, description = "Claims of the caller", body = UserInfo),
        (status = 401, description = "Missing, unknown or expired token")
    )
)]
pub(crate) async fn userinfo(principal: Principal) -> Response {
    without_caching(Json(UserInfo {
        sub: principal.subject,
        claims: principal.claims,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::claims::{PERMISSIONS_CLAIM, ROLE_CLAIM, USER_NAME_CLAIM};
    use crate::test_utils::TestFixture;
    use http::header::CACHE_CONTROL;
    use http::Method;
    use serde_json::{json, Value};

    async fn issue(fixture: &TestFixture, subject: &str) -> crate::test_utils::TestResponse {
        fixture
            .send_as(
                Method::POST,
                "/connect/token",
                &fixture.config.api_key,
                Some(&json!({ "subject": subject })),
            )
            .await
    }

    fn claim<'a>(claims: &'a [Claim], claim_type: &str) -> &'a str {
        claims
            .iter()
            .find(|claim| claim.claim_type == claim_type)
            .map(|claim| claim.value.as_str())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_issue_token_for_admin() {
        let fixture = TestFixture::new().await;
        let response = issue(&fixture, "admin").await;
        response.assert_ok();
        assert_eq!(response.headers[CACHE_CONTROL], "no-cache, no-store");

        let token: TokenResponse = response.json_as();
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_in, 3600);
        assert_eq!(claim(&token.claims, ROLE_CLAIM), "Admin");
        let permissions: Vec<String> =
            serde_json::from_str(claim(&token.claims, PERMISSIONS_CLAIM)).unwrap();
        for action in ["VIEW", "CREATE", "UPDATE", "DELETE"] {
            assert!(permissions.contains(&format!("SSO_SERVER_{action}")));
        }

        let roles = fixture
            .send_as(Method::GET, "/roles/filter", &token.access_token, None::<&Value>)
            .await;
        roles.assert_ok();
    }

    #[tokio::test]
    async fn test_issuance_requires_the_api_key() {
        let fixture = TestFixture::new().await;
        let with_admin_token = fixture
            .post("/connect/token", &json!({"subject": "admin"}))
            .await;
        with_admin_token.assert_status(StatusCode::FORBIDDEN);

        let unknown = issue(&fixture, "ghost").await;
        unknown.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_userinfo_and_revoke() {
        let fixture = TestFixture::new().await;
        let info = fixture.get("/connect/userinfo").await;
        info.assert_ok();
        let info: UserInfo = info.json_as();
        assert_eq!(claim(&info.claims, USER_NAME_CLAIM), "admin");

        fixture
            .send_as(
                Method::POST,
                "/connect/revoke",
                &fixture.config.api_key,
                Some(&json!({ "token": fixture.admin_token })),
            )
            .await
            .assert_ok();
        fixture
            .get("/connect/userinfo")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
