use crate::errors::ApiError;
use crate::models::{ListQuery, Page};
use crate::openapi::ROLES_TAG;
use crate::permissions::{
    Authorized, Claim, SsoServerCreate, SsoServerDelete, SsoServerUpdate, SsoServerView,
};
use crate::services::roles::{self, RoleClientAccess, RolePermission, RoleRequest, RoleView};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/roles", post(create_role))
        .route("/roles/filter", get(list_roles))
        .route(
            "/roles/{role_id}",
            get(get_role).put(update_role).delete(delete_role),
        )
        .route("/roles/{role_id}/claims", post(set_permissions))
        .route("/roles/{role_id}/claims/filter", get(list_permissions))
        .route("/roles/{role_id}/clients", post(set_client_access))
        .route("/roles/{role_id}/clients/filter", get(list_client_access))
}

#[utoipa::path(
    get,
    path = "/roles/{role_id}",
    tag = ROLES_TAG,
    params(
        ("role_id" = String, Path, description = "Role identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Role", body = RoleView),
        (status = 404, description = "Role not found")
    )
)]
pub(crate) async fn get_role(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
    Path(role_id): Path<String>,
) -> Result<Json<RoleView>, ApiError> {
    Ok(Json(roles::get(state.store.as_ref(), &role_id).await?))
}

#[utoipa::path(
    get,
    path = "/roles/filter",
    tag = ROLES_TAG,
    params(
        ListQuery,
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Roles matching the filter", body = Page<RoleView>),
        (status = 400, description = "Invalid page window")
    )
)]
pub(crate) async fn list_roles(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
    query: ListQuery,
) -> Result<Json<Page<RoleView>>, ApiError> {
    Ok(Json(roles::list(state.store.as_ref(), &query).await?))
}

#[utoipa::path(
    post,
    path = "/roles",
    tag = ROLES_TAG,
    request_body = RoleRequest,
    params(("Authorization" = String, Header, description = "Bearer access token")),
    responses(
        (status = 201, description = "Role created", body = RoleView),
        (status = 400, description = "Missing name"),
        (status = 409, description = "Role name already taken")
    )
)]
pub(crate) async fn create_role(
    State(state): State<AppState>,
    _: Authorized<SsoServerCreate>,
    Json(request): Json<RoleRequest>,
) -> Result<(StatusCode, Json<RoleView>), ApiError> {
    let role = roles::create(state.store.as_ref(), request).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

#[utoipa::path(
    put,
    path = "/roles/{role_id}",
    tag = ROLES_TAG,
    request_body = RoleRequest,
    params(
        ("role_id" = String, Path, description = "Role identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 204, description = "Role renamed"),
        (status = 400, description = "Body id differs from the path"),
        (status = 404, description = "Role not found"),
        (status = 409, description = "Role name already taken")
    )
)]
pub(crate) async fn update_role(
    State(state): State<AppState>,
    _: Authorized<SsoServerUpdate>,
    Path(role_id): Path<String>,
    Json(request): Json<RoleRequest>,
) -> Result<StatusCode, ApiError> {
    roles::update(state.store.as_ref(), &role_id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/roles/{role_id}",
    tag = ROLES_TAG,
    params(
        ("role_id" = String, Path, description = "Role identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 204, description = "Role, its claims and memberships deleted"),
        (status = 404, description = "Role not found")
    )
)]
pub(crate) async fn delete_role(
    State(state): State<AppState>,
    _: Authorized<SsoServerDelete>,
    Path(role_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    roles::delete(state.store.as_ref(), &role_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Permission matrix of a role: one row per api resource
#[utoipa::path(
    get,
    path = "/roles/{role_id}/claims/filter",
    tag = ROLES_TAG,
    params(
        ("role_id" = String, Path, description = "Role identifier"),
        ListQuery,
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Grants per api resource", body = Page<RolePermission>),
        (status = 404, description = "Role not found")
    )
)]
pub(crate) async fn list_permissions(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
    Path(role_id): Path<String>,
    query: ListQuery,
) -> Result<Json<Page<RolePermission>>, ApiError> {
    Ok(Json(
        roles::permissions(state.store.as_ref(), &role_id, &query).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/roles/{role_id}/claims",
    tag = ROLES_TAG,
    request_body = RolePermission,
    params(
        ("role_id" = String, Path, description = "Role identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Resulting claims of the role", body = Vec<Claim>),
        (status = 400, description = "Unknown resource"),
        (status = 404, description = "Role not found")
    )
)]
pub(crate) async fn set_permissions(
    State(state): State<AppState>,
    _: Authorized<SsoServerUpdate>,
    Path(role_id): Path<String>,
    Json(request): Json<RolePermission>,
) -> Result<Json<Vec<Claim>>, ApiError> {
    Ok(Json(
        roles::set_permissions(state.store.as_ref(), &role_id, request).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/roles/{role_id}/clients/filter",
    tag = ROLES_TAG,
    params(
        ("role_id" = String, Path, description = "Role identifier"),
        ListQuery,
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Client enablement of the role", body = Page<RoleClientAccess>),
        (status = 404, description = "Role not found")
    )
)]
pub(crate) async fn list_client_access(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
    Path(role_id): Path<String>,
    query: ListQuery,
) -> Result<Json<Page<RoleClientAccess>>, ApiError> {
    Ok(Json(
        roles::client_access(state.store.as_ref(), &role_id, &query).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/roles/{role_id}/clients",
    tag = ROLES_TAG,
    request_body = RoleClientAccess,
    params(
        ("role_id" = String, Path, description = "Role identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Resulting claims of the role", body = Vec<Claim>),
        (status = 400, description = "Unknown client"),
        (status = 404, description = "Role not found")
    )
)]
pub(crate) async fn set_client_access(
    State(state): State<AppState>,
    _: Authorized<SsoServerUpdate>,
    Path(role_id): Path<String>,
    Json(request): Json<RoleClientAccess>,
) -> Result<Json<Vec<Claim>>, ApiError> {
    Ok(Json(
        roles::set_client_access(state.store.as_ref(), &role_id, request).await?,
    ))
}

#[cfg(test)]
mod tests {
    use crate::models::Page;
    use crate::permissions::{ActionMatrix, Claim};
    use crate::services::roles::{RoleClientAccess, RolePermission, RoleView};
    use crate::store::seed::{ADMIN_ROLE, MEMBER_ROLE};
    use crate::test_utils::TestFixture;
    use http::{Method, StatusCode};
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_seeded_permission_matrix() {
        let fixture = TestFixture::new().await;
        let page: Page<RolePermission> = fixture
            .get(format!("/roles/{MEMBER_ROLE}/claims/filter"))
            .await
            .json_as();
        assert_eq!(page.total_records, 1);
        assert_eq!(page.items[0].resource, "SSO_SERVER");
        assert_eq!(
            page.items[0].actions,
            ActionMatrix {
                view: true,
                ..Default::default()
            }
        );
    }

    #[tokio::test]
    async fn test_granting_a_role_reaches_new_tokens() {
        let fixture = TestFixture::new().await;
        fixture
            .post(
                "/users",
                &json!({"userName": "editor", "email": "editor@example.com", "dob": "1990-01-01"}),
            )
            .await
            .assert_status(StatusCode::CREATED);
        let before = fixture.token_for("editor").await;
        let body = json!({"name": "Support"});
        fixture
            .send_as(Method::POST, "/roles", &before, Some(&body))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let response = fixture
            .post(
                &format!("/roles/{MEMBER_ROLE}/claims"),
                &json!({"type": "SSO_SERVER", "view": true, "create": true, "update": false, "delete": false}),
            )
            .await;
        response.assert_ok();
        let claims: Vec<Claim> = response.json_as();
        assert_eq!(claims.len(), 2);

        let after = fixture.token_for("editor").await;
        fixture
            .send_as(Method::POST, "/roles", &after, Some(&body))
            .await
            .assert_status(StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_unknown_permission_type_is_rejected() {
        let fixture = TestFixture::new().await;
        fixture
            .post("/api-resources", &json!({"name": "orders"}))
            .await
            .assert_status(StatusCode::CREATED);
        for resource in ["orders", "NOPE"] {
            let response = fixture
                .post(
                    &format!("/roles/{ADMIN_ROLE}/claims"),
                    &json!({"type": resource, "view": true, "create": false, "update": false, "delete": false}),
                )
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_role_crud() {
        let fixture = TestFixture::new().await;
        let response = fixture.post("/roles", &json!({"name": "Auditor"})).await;
        response.assert_status(StatusCode::CREATED);
        let role: RoleView = response.json_as();
        assert_eq!(role.normalized_name, "AUDITOR");

        fixture
            .post("/roles", &json!({"name": "Auditor"}))
            .await
            .assert_status(StatusCode::CONFLICT);
        fixture
            .put(
                format!("/roles/{}", role.id),
                &json!({"id": "someone-else", "name": "Auditors"}),
            )
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        fixture
            .put(
                format!("/roles/{}", role.id),
                &json!({"id": role.id, "name": "Auditors"}),
            )
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let renamed: RoleView = fixture.get(format!("/roles/{}", role.id)).await.json_as();
        assert_eq!(renamed.name, "Auditors");

        fixture
            .delete(format!("/roles/{}", role.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        fixture
            .get(format!("/roles/{}", role.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_client_enablement() {
        let fixture = TestFixture::new().await;
        fixture
            .post("/clients", &json!({"clientName": "portal", "clientType": "spa"}))
            .await
            .assert_status(StatusCode::CREATED);

        let uri = format!("/roles/{MEMBER_ROLE}/clients");
        fixture
            .post(&uri, &json!({"type": "portal", "enable": true}))
            .await
            .assert_ok();
        let page: Page<RoleClientAccess> = fixture.get(format!("{uri}/filter")).await.json_as();
        assert_eq!(
            page.items,
            vec![RoleClientAccess {
                client_name: "portal".into(),
                enable: true
            }]
        );

        let response = fixture
            .post(&uri, &json!({"type": "portal", "enable": false}))
            .await;
        response.assert_ok();
        let claims: Vec<Value> = response.json_as();
        assert!(claims.contains(&json!({"type": "portal", "value": "false"})));

        fixture
            .post(&uri, &json!({"type": "ghost", "enable": true}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
