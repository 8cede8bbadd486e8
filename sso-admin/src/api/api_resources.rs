use crate::errors::ApiError;
use crate::models::{ListQuery, Page, Property};
use crate::openapi::API_RESOURCES_TAG;
use crate::permissions::{
    Authorized, SsoServerCreate, SsoServerDelete, SsoServerUpdate, SsoServerView,
};
use crate::services::api_resources::{self, ApiResourceDetail, ApiResourceSummary};
use crate::services::properties::PropertyRequest;
use crate::services::secrets::{SecretRequest, SecretView};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api-resources",
            get(list_names).post(create_api_resource),
        )
        .route("/api-resources/filter", get(list_api_resources))
        .route(
            "/api-resources/{name}",
            get(get_api_resource)
                .put(update_api_resource)
                .delete(delete_api_resource),
        )
        .route(
            "/api-resources/{name}/secrets",
            get(list_secrets).post(add_secret),
        )
        .route(
            "/api-resources/{name}/secrets/{secret_id}",
            delete(remove_secret),
        )
        .route(
            "/api-resources/{name}/properties",
            get(list_properties).post(add_property),
        )
        .route(
            "/api-resources/{name}/properties/{key}",
            delete(remove_property),
        )
}

/// Names of every api resource, e.g. to build the role permission matrix
#[utoipa::path(
    get,
    path = "/api-resources",
    tag = API_RESOURCES_TAG,
    params(("Authorization" = String, Header, description = "Bearer access token")),
    responses((status = 200, description = "Api resource names", body = Vec<String>))
)]
pub(crate) async fn list_names(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(api_resources::names(state.store.as_ref()).await?))
}

#[utoipa::path(
    get,
    path = "/api-resources/filter",
    tag = API_RESOURCES_TAG,
    params(
        ListQuery,
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Api resources matching the filter", body = Page<ApiResourceSummary>),
        (status = 400, description = "Invalid page window")
    )
)]
pub(crate) async fn list_api_resources(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
    query: ListQuery,
) -> Result<Json<Page<ApiResourceSummary>>, ApiError> {
    Ok(Json(api_resources::list(state.store.as_ref(), &query).await?))
}

#[utoipa::path(
    post,
    path = "/api-resources",
    tag = API_RESOURCES_TAG,
    request_body = ApiResourceDetail,
    params(("Authorization" = String, Header, description = "Bearer access token")),
    responses(
        (status = 201, description = "Api resource created"),
        (status = 400, description = "Missing name"),
        (status = 409, description = "Name already taken")
    )
)]
pub(crate) async fn create_api_resource(
    State(state): State<AppState>,
    _: Authorized<SsoServerCreate>,
    Json(request): Json<ApiResourceDetail>,
) -> Result<StatusCode, ApiError> {
    api_resources::create(state.store.as_ref(), request).await?;
    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    get,
    path = "/api-resources/{name}",
    tag = API_RESOURCES_TAG,
    params(
        ("name" = String, Path, description = "Api resource name"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Api resource with claims and scopes", body = ApiResourceDetail),
        (status = 404, description = "Api resource not found")
    )
)]
pub(crate) async fn get_api_resource(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
    Path(name): Path<String>,
) -> Result<Json<ApiResourceDetail>, ApiError> {
    Ok(Json(api_resources::get(state.store.as_ref(), &name).await?))
}

#[utoipa::path(
    put,
    path = "/api-resources/{name}",
    tag = API_RESOURCES_TAG,
    request_body = ApiResourceDetail,
    params(
        ("name" = String, Path, description = "Api resource name"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 204, description = "Api resource updated"),
        (status = 400, description = "Body name differs from the path"),
        (status = 404, description = "Api resource not found")
    )
)]
pub(crate) async fn update_api_resource(
    State(state): State<AppState>,
    _: Authorized<SsoServerUpdate>,
    Path(name): Path<String>,
    Json(request): Json<ApiResourceDetail>,
) -> Result<StatusCode, ApiError> {
    api_resources::update(state.store.as_ref(), &name, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api-resources/{name}",
    tag = API_RESOURCES_TAG,
    params(
        ("name" = String, Path, description = "Api resource name"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 204, description = "Api resource deleted"),
        (status = 404, description = "Api resource not found")
    )
)]
pub(crate) async fn delete_api_resource(
    State(state): State<AppState>,
    _: Authorized<SsoServerDelete>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    api_resources::delete(state.store.as_ref(), &name).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api-resources/{name}/secrets",
    tag = API_RESOURCES_TAG,
    params(
        ("name" = String, Path, description = "Api resource name"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Hashed api resource secrets", body = Vec<SecretView>),
        (status = 404, description = "Api resource not found")
    )
)]
pub(crate) async fn list_secrets(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
    Path(name): Path<String>,
) -> Result<Json<Vec<SecretView>>, ApiError> {
    Ok(Json(
        api_resources::list_secrets(state.store.as_ref(), &name).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api-resources/{name}/secrets",
    tag = API_RESOURCES_TAG,
    request_body = SecretRequest,
    params(
        ("name" = String, Path, description = "Api resource name"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 201, description = "Secret hashed and stored", body = SecretView),
        (status = 400, description = "Missing value or invalid expiration"),
        (status = 404, description = "Api resource not found")
    )
)]
pub(crate) async fn add_secret(
    State(state): State<AppState>,
    _: Authorized<SsoServerCreate>,
    Path(name): Path<String>,
    Json(request): Json<SecretRequest>,
) -> Result<(StatusCode, Json<SecretView>), ApiError> {
    let secret = api_resources::add_secret(
        state.store.as_ref(),
        state.hasher.as_ref(),
        &name,
        request,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(secret)))
}

#[utoipa::path(
    delete,
    path = "/api-resources/{name}/secrets/{secret_id}",
    tag = API_RESOURCES_TAG,
    params(
        ("name" = String, Path, description = "Api resource name"),
        ("secret_id" = i64, Path, description = "Secret identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 204, description = "Secret removed"),
        (status = 404, description = "Api resource or secret not found")
    )
)]
pub(crate) async fn remove_secret(
    State(state): State<AppState>,
    _: Authorized<SsoServerDelete>,
    Path((name, secret_id)): Path<(String, i64)>,
) -> Result<StatusCode, ApiError> {
    api_resources::remove_secret(state.store.as_ref(), &name, secret_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api-resources/{name}/properties",
    tag = API_RESOURCES_TAG,
    params(
        ("name" = String, Path, description = "Api resource name"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Api resource properties", body = Vec<Property>),
        (status = 404, description = "Api resource not found")
    )
)]
pub(crate) async fn list_properties(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Property>>, ApiError> {
    Ok(Json(
        api_resources::list_properties(state.store.as_ref(), &name).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api-resources/{name}/properties",
    tag = API_RESOURCES_TAG,
    request_body = PropertyRequest,
    params(
        ("name" = String, Path, description = "Api resource name"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 201, description = "Property added", body = Property),
        (status = 404, description = "Api resource not found"),
        (status = 409, description = "Property key already present")
    )
)]
pub(crate) async fn add_property(
    State(state): State<AppState>,
    _: Authorized<SsoServerCreate>,
    Path(name): Path<String>,
    Json(request): Json<PropertyRequest>,
) -> Result<(StatusCode, Json<Property>), ApiError> {
    let property = api_resources::add_property(state.store.as_ref(), &name, request).await?;
    Ok((StatusCode::CREATED, Json(property)))
}

#[utoipa::path(
    delete,
    path = "/api-resources/{name}/properties/{key}",
    tag = API_RESOURCES_TAG,
    params(
        ("name" = String, Path, description = "Api resource name"),
        ("key" = String, Path, description = "Property key"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 204, description = "Property removed"),
        (status = 404, description = "Api resource or property not found")
    )
)]
pub(crate) async fn remove_property(
    State(state): State<AppState>,
    _: Authorized<SsoServerDelete>,
    Path((name, key)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    api_resources::remove_property(state.store.as_ref(), &name, &key).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::models::Page;
    use crate::services::api_resources::{ApiResourceDetail, ApiResourceSummary};
    use crate::test_utils::TestFixture;
    use http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_seeded_resource_is_listed() {
        let fixture = TestFixture::new().await;
        let names: Vec<String> = fixture.get("/api-resources").await.json_as();
        assert_eq!(names, vec!["SSO_SERVER"]);

        let page: Page<ApiResourceSummary> = fixture
            .get("/api-resources/filter?pageIndex=1&pageSize=5")
            .await
            .json_as();
        assert_eq!(page.total_records, 1);
    }

    #[tokio::test]
    async fn test_update_reconciles_claims_and_scopes() {
        let fixture = TestFixture::new().await;
        fixture
            .post(
                "/api-resources",
                &json!({"name": "orders", "userClaims": ["email"], "scopes": ["orders.read"]}),
            )
            .await
            .assert_status(StatusCode::CREATED);

        let mut detail: ApiResourceDetail = fixture.get("/api-resources/orders").await.json_as();
        detail.user_claims = vec!["email".into(), "role".into()];
        detail.scopes = vec!["orders.write".into()];
        fixture
            .put("/api-resources/orders", &detail)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let updated: ApiResourceDetail = fixture.get("/api-resources/orders").await.json_as();
        assert_eq!(updated.user_claims, vec!["email", "role"]);
        assert_eq!(updated.scopes, vec!["orders.write"]);

        detail.name = "renamed".into();
        fixture
            .put("/api-resources/orders", &detail)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_page_window_is_rejected() {
        let fixture = TestFixture::new().await;
        for query in ["pageIndex=0", "pageSize=0", "pageSize=101"] {
            let response = fixture.get(format!("/api-resources/filter?{query}")).await;
            response.assert_status(StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_delete_api_resource() {
        let fixture = TestFixture::new().await;
        fixture
            .post("/api-resources", &json!({"name": "orders"}))
            .await
            .assert_status(StatusCode::CREATED);
        fixture
            .post("/api-resources/orders/properties", &json!({"key": "k", "value": "v"}))
            .await
            .assert_status(StatusCode::CREATED);
        fixture
            .delete("/api-resources/orders")
            .await
            .assert_status(StatusCode::NO_CONTENT);
        fixture
            .get("/api-resources/orders")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
