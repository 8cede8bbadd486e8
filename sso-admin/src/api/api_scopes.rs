use crate::errors::ApiError;
use crate::models::{ListQuery, Page, Property};
use crate::openapi::API_SCOPES_TAG;
use crate::permissions::{
    Authorized, SsoServerCreate, SsoServerDelete, SsoServerUpdate, SsoServerView,
};
use crate::services::api_scopes::{self, ApiScopeDetail, ApiScopeSummary};
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
        .route("/api-scopes", post(create_api_scope))
        .route("/api-scopes/filter", get(list_api_scopes))
        .route(
            "/api-scopes/{name}",
            get(get_api_scope)
                .put(update_api_scope)
                .delete(delete_api_scope),
        )
        .route(
            "/api-scopes/{name}/properties",
            get(list_properties).post(add_property),
        )
        .route(
            "/api-scopes/{name}/properties/{key}",
            delete(remove_property),
        )
}

#[utoipa::path(
    get,
    path = "/api-scopes/filter",
    tag = API_SCOPES_TAG,
    params(
        ListQuery,
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Api scopes matching the filter", body = Page<ApiScopeSummary>),
        (status = 400, description = "Invalid page window")
    )
)]
pub(crate) async fn list_api_scopes(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
    query: ListQuery,
) -> Result<Json<Page<ApiScopeSummary>>, ApiError> {
    Ok(Json(api_scopes::list(state.store.as_ref(), &query).await?))
}

#[utoipa::path(
    post,
    path = "/api-scopes",
    tag = API_SCOPES_TAG,
    request_body = ApiScopeDetail,
    params(("Authorization" = String, Header, description = "Bearer access token")),
    responses(
        (status = 201, description = "Api scope created"),
        (status = 400, description = "Missing name"),
        (status = 409, description = "Name already taken")
    )
)]
pub(crate) async fn create_api_scope(
    State(state): State<AppState>,
    _: Authorized<SsoServerCreate>,
    Json(request): Json<ApiScopeDetail>,
) -> Result<StatusCode, ApiError> {
    api_scopes::create(state.store.as_ref(), request).await?;
    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    get,
    path = "/api-scopes/{name}",
    tag = API_SCOPES_TAG,
    params(
        ("name" = String, Path, description = "Api scope name"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Api scope with its user claims", body = ApiScopeDetail),
        (status = 404, description = "Api scope not found")
    )
)]
pub(crate) async fn get_api_scope(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
    Path(name): Path<String>,
) -> Result<Json<ApiScopeDetail>, ApiError> {
    Ok(Json(api_scopes::get(state.store.as_ref(), &name).await?))
}

#[utoipa::path(
    put,
    path = "/api-scopes/{name}",
    tag = API_SCOPES_TAG,
    request_body = ApiScopeDetail,
    params(
        ("name" = String, Path, description = "Api scope name"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 204, description = "Api scope updated"),
        (status = 400, description = "Body name differs from the path"),
        (status = 404, description = "Api scope not found")
    )
)]
pub(crate) async fn update_api_scope(
    State(state): State<AppState>,
    _: Authorized<SsoServerUpdate>,
    Path(name): Path<String>,
    Json(request): Json<ApiScopeDetail>,
) -> Result<StatusCode, ApiError> {
    api_scopes::update(state.store.as_ref(), &name, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api-scopes/{name}",
    tag = API_SCOPES_TAG,
    params(
        ("name" = String, Path, description = "Api scope name"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 204, description = "Api scope deleted"),
        (status = 404, description = "Api scope not found")
    )
)]
pub(crate) async fn delete_api_scope(
    State(state): State<AppState>,
    _: Authorized<SsoServerDelete>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    api_scopes::delete(state.store.as_ref(), &name).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api-scopes/{name}/properties",
    tag = API_SCOPES_TAG,
    params(
        ("name" = String, Path, description = "Api scope name"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Api scope properties", body = Vec<Property>),
        (status = 404, description = "Api scope not found")
    )
)]
pub(crate) async fn list_properties(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Property>>, ApiError> {
    Ok(Json(
        api_scopes::list_properties(state.store.as_ref(), &name).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api-scopes/{name}/properties",
    tag = API_SCOPES_TAG,
    request_body = PropertyRequest,
    params(
        ("name" = String, Path, description = "Api scope name"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 201, description = "Property added", body = Property),
        (status = 404, description = "Api scope not found"),
        (status = 409, description = "Property key already present")
    )
)]
pub(crate) async fn add_property(
    State(state): State<AppState>,
    _: Authorized<SsoServerCreate>,
    Path(name): Path<String>,
    Json(request): Json<PropertyRequest>,
) -> Result<(StatusCode, Json<Property>), ApiError> {
    let property = api_scopes::add_property(state.store.as_ref(), &name, request).await?;
    Ok((StatusCode::CREATED, Json(property)))
}

#[utoipa::path(
    delete,
    path = "/api-scopes/{name}/properties/{key}",
    tag = API_SCOPES_TAG,
    params(
        ("name" = String, Path, description = "Api scope name"),
        ("key" = String, Path, description = "Property key"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 204, description = "Property removed"),
        (status = 404, description = "Api scope or property not found")
    )
)]
pub(crate) async fn remove_property(
    State(state): State<AppState>,
    _: Authorized<SsoServerDelete>,
    Path((name, key)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    api_scopes::remove_property(state.store.as_ref(), &name, &key).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::models::{Page, Property};
    use crate::services::api_scopes::{ApiScopeDetail, ApiScopeSummary};
    use crate::test_utils::TestFixture;
    use http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_api_scope_crud() {
        let fixture = TestFixture::new().await;
        fixture
            .post(
                "/api-scopes",
                &json!({"name": "orders.read", "displayName": "Read orders", "userClaims": ["sub"]}),
            )
            .await
            .assert_status(StatusCode::CREATED);
        fixture
            .post("/api-scopes", &json!({"name": "orders.read"}))
            .await
            .assert_status(StatusCode::CONFLICT);

        let page: Page<ApiScopeSummary> =
            fixture.get("/api-scopes/filter?filter=orders").await.json_as();
        assert_eq!(page.total_records, 1);

        let mut detail: ApiScopeDetail = fixture.get("/api-scopes/orders.read").await.json_as();
        assert!(detail.enabled);
        detail.user_claims = vec!["email".into()];
        detail.required = true;
        fixture
            .put("/api-scopes/orders.read", &detail)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        let updated: ApiScopeDetail = fixture.get("/api-scopes/orders.read").await.json_as();
        assert_eq!(updated, detail);

        fixture
            .delete("/api-scopes/orders.read")
            .await
            .assert_status(StatusCode::NO_CONTENT);
        fixture
            .get("/api-scopes/orders.read")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_api_scope_properties() {
        let fixture = TestFixture::new().await;
        fixture
            .post("/api-scopes", &json!({"name": "orders.read"}))
            .await
            .assert_status(StatusCode::CREATED);
        let uri = "/api-scopes/orders.read/properties";
        fixture
            .post(uri, &json!({"key": "audience", "value": "orders"}))
            .await
            .assert_status(StatusCode::CREATED);

        let properties: Vec<Property> = fixture.get(uri).await.json_as();
        assert_eq!(properties.len(), 1);
        assert_eq!(properties[0].key, "audience");

        fixture
            .delete(format!("{uri}/audience"))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        fixture
            .delete(format!("{uri}/audience"))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
