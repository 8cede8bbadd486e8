use crate::errors::ApiError;
use crate::models::{ClientClaim, ClientDeviceFlow, ClientTokenSettings, ListQuery, Page, Property};
use crate::openapi::CLIENTS_TAG;
use crate::permissions::{
    Authorized, SsoServerCreate, SsoServerDelete, SsoServerUpdate, SsoServerView,
};
use crate::services::clients::{
    self, ClientAuthenticationSettings, ClientBasicsRequest, ClientBasicsView, ClientClaimRequest,
    ClientSettings, ClientSummary, ClientTokensRequest, CreateClientRequest,
};
use crate::services::properties::PropertyRequest;
use crate::services::secrets::{SecretRequest, SecretView};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/clients", post(create_client))
        .route("/clients/filter", get(list_clients))
        .route("/clients/scopes", get(available_scopes))
        .route("/clients/{client_id}", delete(delete_client))
        .route(
            "/clients/{client_id}/basics",
            get(get_basics).put(update_basics),
        )
        .route(
            "/clients/{client_id}/settings",
            get(get_settings).put(update_settings),
        )
        .route(
            "/clients/{client_id}/authentications",
            get(get_authentication).put(update_authentication),
        )
        .route(
            "/clients/{client_id}/tokens",
            get(get_tokens).put(update_tokens),
        )
        .route(
            "/clients/{client_id}/device-flows",
            get(get_device_flow).put(update_device_flow),
        )
        .route(
            "/clients/{client_id}/secrets",
            get(list_secrets).post(add_secret),
        )
        .route(
            "/clients/{client_id}/secrets/{secret_id}",
            delete(remove_secret),
        )
        .route(
            "/clients/{client_id}/properties",
            get(list_properties).post(add_property),
        )
        .route(
            "/clients/{client_id}/properties/{key}",
            delete(remove_property),
        )
        .route(
            "/clients/{client_id}/claims",
            get(list_claims).post(add_claim),
        )
        .route(
            "/clients/{client_id}/claims/{claim_type}",
            delete(remove_claim),
        )
}

#[utoipa::path(
    get,
    path = "/clients/filter",
    tag = CLIENTS_TAG,
    params(
        ListQuery,
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Clients matching the filter", body = Page<ClientSummary>),
        (status = 400, description = "Invalid page window"),
        (status = 401, description = "Missing or insufficient permissions")
    )
)]
pub(crate) async fn list_clients(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
    query: ListQuery,
) -> Result<Json<Page<ClientSummary>>, ApiError> {
    Ok(Json(clients::list(state.store.as_ref(), &query).await?))
}

#[utoipa::path(
    post,
    path = "/clients",
    tag = CLIENTS_TAG,
    request_body = CreateClientRequest,
    params(("Authorization" = String, Header, description = "Bearer access token")),
    responses(
        (status = 201, description = "Client created", body = ClientSummary),
        (status = 400, description = "Invalid client"),
        (status = 409, description = "Client name already taken")
    )
)]
pub(crate) async fn create_client(
    State(state): State<AppState>,
    _: Authorized<SsoServerCreate>,
    Json(request): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<ClientSummary>), ApiError> {
    let created = clients::create(state.store.as_ref(), request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    delete,
    path = "/clients/{client_id}",
    tag = CLIENTS_TAG,
    params(
        ("client_id" = String, Path, description = "Client identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 204, description = "Client deleted"),
        (status = 404, description = "Client not found")
    )
)]
pub(crate) async fn delete_client(
    State(state): State<AppState>,
    _: Authorized<SsoServerDelete>,
    Path(client_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    clients::delete(state.store.as_ref(), &client_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Scope names a client may be allowed: identity resources, `offline_access` and api scopes
#[utoipa::path(
    get,
    path = "/clients/scopes",
    tag = CLIENTS_TAG,
    params(("Authorization" = String, Header, description = "Bearer access token")),
    responses((status = 200, description = "Assignable scope names", body = Vec<String>))
)]
pub(crate) async fn available_scopes(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(clients::available_scopes(state.store.as_ref()).await?))
}

#[utoipa::path(
    get,
    path = "/clients/{client_id}/basics",
    tag = CLIENTS_TAG,
    params(
        ("client_id" = String, Path, description = "Client identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Client basics", body = ClientBasicsView),
        (status = 404, description = "Client not found")
    )
)]
pub(crate) async fn get_basics(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
    Path(client_id): Path<String>,
) -> Result<Json<ClientBasicsView>, ApiError> {
    Ok(Json(clients::basics(state.store.as_ref(), &client_id).await?))
}

#[utoipa::path(
    put,
    path = "/clients/{client_id}/basics",
    tag = CLIENTS_TAG,
    request_body = ClientBasicsRequest,
    params(
        ("client_id" = String, Path, description = "Client identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 204, description = "Basics updated"),
        (status = 400, description = "Invalid origin"),
        (status = 404, description = "Client not found"),
        (status = 409, description = "Origin already used by another client")
    )
)]
pub(crate) async fn update_basics(
    State(state): State<AppState>,
    _: Authorized<SsoServerUpdate>,
    Path(client_id): Path<String>,
    Json(request): Json<ClientBasicsRequest>,
) -> Result<StatusCode, ApiError> {
    clients::update_basics(state.store.as_ref(), &client_id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/clients/{client_id}/settings",
    tag = CLIENTS_TAG,
    params(
        ("client_id" = String, Path, description = "Client identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Client settings", body = ClientSettings),
        (status = 404, description = "Client not found")
    )
)]
pub(crate) async fn get_settings(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
    Path(client_id): Path<String>,
) -> Result<Json<ClientSettings>, ApiError> {
    Ok(Json(clients::settings(state.store.as_ref(), &client_id).await?))
}

#[utoipa::path(
    put,
    path = "/clients/{client_id}/settings",
    tag = CLIENTS_TAG,
    request_body = ClientSettings,
    params(
        ("client_id" = String, Path, description = "Client identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 204, description = "Settings updated"),
        (status = 400, description = "Invalid redirect uri"),
        (status = 404, description = "Client not found"),
        (status = 409, description = "Redirect uri already used by another client")
    )
)]
pub(crate) async fn update_settings(
    State(state): State<AppState>,
    _: Authorized<SsoServerUpdate>,
    Path(client_id): Path<String>,
    Json(request): Json<ClientSettings>,
) -> Result<StatusCode, ApiError> {
    clients::update_settings(state.store.as_ref(), &client_id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/clients/{client_id}/authentications",
    tag = CLIENTS_TAG,
    params(
        ("client_id" = String, Path, description = "Client identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Login and logout settings", body = ClientAuthenticationSettings),
        (status = 404, description = "Client not found")
    )
)]
pub(crate) async fn get_authentication(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
    Path(client_id): Path<String>,
) -> Result<Json<ClientAuthenticationSettings>, ApiError> {
    Ok(Json(
        clients::authentication(state.store.as_ref(), &client_id).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/clients/{client_id}/authentications",
    tag = CLIENTS_TAG,
    request_body = ClientAuthenticationSettings,
    params(
        ("client_id" = String, Path, description = "Client identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 204, description = "Authentication settings updated"),
        (status = 404, description = "Client not found"),
        (status = 409, description = "Post logout redirect uri already used by another client")
    )
)]
pub(crate) async fn update_authentication(
    State(state): State<AppState>,
    _: Authorized<SsoServerUpdate>,
    Path(client_id): Path<String>,
    Json(request): Json<ClientAuthenticationSettings>,
) -> Result<StatusCode, ApiError> {
    clients::update_authentication(state.store.as_ref(), &client_id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/clients/{client_id}/tokens",
    tag = CLIENTS_TAG,
    params(
        ("client_id" = String, Path, description = "Client identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Token lifetimes and options", body = ClientTokenSettings),
        (status = 404, description = "Client not found")
    )
)]
pub(crate) async fn get_tokens(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
    Path(client_id): Path<String>,
) -> Result<Json<ClientTokenSettings>, ApiError> {
    Ok(Json(clients::tokens(state.store.as_ref(), &client_id).await?))
}

#[utoipa::path(
    put,
    path = "/clients/{client_id}/tokens",
    tag = CLIENTS_TAG,
    request_body = ClientTokensRequest,
    params(
        ("client_id" = String, Path, description = "Client identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 204, description = "Token settings updated"),
        (status = 400, description = "Unknown token type, usage or expiration"),
        (status = 404, description = "Client not found")
    )
)]
pub(crate) async fn update_tokens(
    State(state): State<AppState>,
    _: Authorized<SsoServerUpdate>,
    Path(client_id): Path<String>,
    Json(request): Json<ClientTokensRequest>,
) -> Result<StatusCode, ApiError> {
    clients::update_tokens(state.store.as_ref(), &client_id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/clients/{client_id}/device-flows",
    tag = CLIENTS_TAG,
    params(
        ("client_id" = String, Path, description = "Client identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Device flow settings", body = ClientDeviceFlow),
        (status = 404, description = "Client not found")
    )
)]
pub(crate) async fn get_device_flow(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
    Path(client_id): Path<String>,
) -> Result<Json<ClientDeviceFlow>, ApiError> {
    Ok(Json(
        clients::device_flow(state.store.as_ref(), &client_id).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/clients/{client_id}/device-flows",
    tag = CLIENTS_TAG,
    request_body = ClientDeviceFlow,
    params(
        ("client_id" = String, Path, description = "Client identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 204, description = "Device flow settings updated"),
        (status = 400, description = "Invalid device code lifetime"),
        (status = 404, description = "Client not found")
    )
)]
pub(crate) async fn update_device_flow(
    State(state): State<AppState>,
    _: Authorized<SsoServerUpdate>,
    Path(client_id): Path<String>,
    Json(request): Json<ClientDeviceFlow>,
) -> Result<StatusCode, ApiError> {
    clients::update_device_flow(state.store.as_ref(), &client_id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/clients/{client_id}/secrets",
    tag = CLIENTS_TAG,
    params(
        ("client_id" = String, Path, description = "Client identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Hashed client secrets", body = Vec<SecretView>),
        (status = 404, description = "Client not found")
    )
)]
pub(crate) async fn list_secrets(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
    Path(client_id): Path<String>,
) -> Result<Json<Vec<SecretView>>, ApiError> {
    Ok(Json(
        clients::list_secrets(state.store.as_ref(), &client_id).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/clients/{client_id}/secrets",
    tag = CLIENTS_TAG,
    request_body = SecretRequest,
    params(
        ("client_id" = String, Path, description = "Client identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 201, description = "Secret hashed and stored", body = SecretView),
        (status = 400, description = "Missing value or invalid expiration"),
        (status = 404, description = "Client not found")
    )
)]
pub(crate) async fn add_secret(
    State(state): State<AppState>,
    _: Authorized<SsoServerCreate>,
    Path(client_id): Path<String>,
    Json(request): Json<SecretRequest>,
) -> Result<(StatusCode, Json<SecretView>), ApiError> {
    let secret = clients::add_secret(
        state.store.as_ref(),
        state.hasher.as_ref(),
        &client_id,
        request,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(secret)))
}

#[utoipa::path(
    delete,
    path = "/clients/{client_id}/secrets/{secret_id}",
    tag = CLIENTS_TAG,
    params(
        ("client_id" = String, Path, description = "Client identifier"),
        ("secret_id" = i64, Path, description = "Secret identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 204, description = "Secret removed"),
        (status = 404, description = "Client or secret not found")
    )
)]
pub(crate) async fn remove_secret(
    State(state): State<AppState>,
    _: Authorized<SsoServerDelete>,
    Path((client_id, secret_id)): Path<(String, i64)>,
) -> Result<StatusCode, ApiError> {
    clients::remove_secret(state.store.as_ref(), &client_id, secret_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/clients/{client_id}/properties",
    tag = CLIENTS_TAG,
    params(
        ("client_id" = String, Path, description = "Client identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Client properties", body = Vec<Property>),
        (status = 404, description = "Client not found")
    )
)]
pub(crate) async fn list_properties(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
    Path(client_id): Path<String>,
) -> Result<Json<Vec<Property>>, ApiError> {
    Ok(Json(
        clients::list_properties(state.store.as_ref(), &client_id).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/clients/{client_id}/properties",
    tag = CLIENTS_TAG,
    request_body = PropertyRequest,
    params(
        ("client_id" = String, Path, description = "Client identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 201, description = "Property added", body = Property),
        (status = 404, description = "Client not found"),
        (status = 409, description = "Property key already present")
    )
)]
pub(crate) async fn add_property(
    State(state): State<AppState>,
    _: Authorized<SsoServerCreate>,
    Path(client_id): Path<String>,
    Json(request): Json<PropertyRequest>,
) -> Result<(StatusCode, Json<Property>), ApiError> {
    let property = clients::add_property(state.store.as_ref(), &client_id, request).await?;
    Ok((StatusCode::CREATED, Json(property)))
}

#[utoipa::path(
    delete,
    path = "/clients/{client_id}/properties/{key}",
    tag = CLIENTS_TAG,
    params(
        ("client_id" = String, Path, description = "Client identifier"),
        ("key" = String, Path, description = "Property key"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 204, description = "Property removed"),
        (status = 404, description = "Client or property not found")
    )
)]
pub(crate) async fn remove_property(
    State(state): State<AppState>,
    _: Authorized<SsoServerDelete>,
    Path((client_id, key)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    clients::remove_property(state.store.as_ref(), &client_id, &key).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/clients/{client_id}/claims",
    tag = CLIENTS_TAG,
    params(
        ("client_id" = String, Path, description = "Client identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Claims issued to the client", body = Vec<ClientClaim>),
        (status = 404, description = "Client not found")
    )
)]
pub(crate) async fn list_claims(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
    Path(client_id): Path<String>,
) -> Result<Json<Vec<ClientClaim>>, ApiError> {
    Ok(Json(
        clients::list_claims(state.store.as_ref(), &client_id).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/clients/{client_id}/claims",
    tag = CLIENTS_TAG,
    request_body = ClientClaimRequest,
    params(
        ("client_id" = String, Path, description = "Client identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 201, description = "Claim added", body = ClientClaim),
        (status = 404, description = "Client not found"),
        (status = 409, description = "Claim type already present")
    )
)]
pub(crate) async fn add_claim(
    State(state): State<AppState>,
    _: Authorized<SsoServerCreate>,
    Path(client_id): Path<String>,
    Json(request): Json<ClientClaimRequest>,
) -> Result<(StatusCode, Json<ClientClaim>), ApiError> {
    let claim = clients::add_claim(state.store.as_ref(), &client_id, request).await?;
    Ok((StatusCode::CREATED, Json(claim)))
}

#[utoipa::path(
    delete,
    path = "/clients/{client_id}/claims/{claim_type}",
    tag = CLIENTS_TAG,
    params(
        ("client_id" = String, Path, description = "Client identifier"),
        ("claim_type" = String, Path, description = "Claim type"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 204, description = "Claim removed"),
        (status = 404, description = "Client or claim not found")
    )
)]
pub(crate) async fn remove_claim(
    State(state): State<AppState>,
    _: Authorized<SsoServerDelete>,
    Path((client_id, claim_type)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    clients::remove_claim(state.store.as_ref(), &client_id, &claim_type).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::models::{ClientTokenSettings, Page};
    use crate::services::clients::{ClientSettings, ClientSummary};
    use crate::services::secrets::SecretView;
    use crate::test_utils::TestFixture;
    use http::{Method, StatusCode};
    use serde_json::{json, Value};

    async fn create(fixture: &TestFixture, name: &str, client_type: &str) -> ClientSummary {
        let response = fixture
            .post(
                "/clients",
                &json!({"clientName": name, "clientType": client_type}),
            )
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json_as()
    }

    #[tokio::test]
    async fn test_create_and_filter_clients() {
        let fixture = TestFixture::new().await;
        let portal = create(&fixture, "portal", "spa").await;
        create(&fixture, "billing", "server").await;

        let response = fixture.get("/clients/filter?filter=port").await;
        response.assert_ok();
        let page: Page<ClientSummary> = response.json_as();
        assert_eq!(page.total_records, 1);
        assert_eq!(page.items[0].client_id, portal.client_id);

        let settings: ClientSettings = fixture
            .get(format!("/clients/{}/settings", portal.client_id))
            .await
            .json_as();
        assert_eq!(settings.allowed_grant_types, vec!["authorization_code"]);

        let duplicate = fixture
            .post("/clients", &json!({"clientName": "portal", "clientType": "spa"}))
            .await;
        duplicate.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_redirect_uri_conflict_across_clients() {
        let fixture = TestFixture::new().await;
        let first = create(&fixture, "first", "spa").await;
        let second = create(&fixture, "second", "spa").await;

        let settings_uri = format!("/clients/{}/settings", first.client_id);
        let mut settings: Value = fixture.get(&settings_uri).await.json;
        settings["redirectUris"] = json!(["https://app.example.com/callback"]);
        fixture
            .put(&settings_uri, &settings)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let other_uri = format!("/clients/{}/settings", second.client_id);
        let mut other: Value = fixture.get(&other_uri).await.json;
        other["redirectUris"] = json!(["https://app.example.com/callback"]);
        let response = fixture.put(&other_uri, &other).await;
        response.assert_status(StatusCode::CONFLICT);

        let unchanged: ClientSettings = fixture.get(&other_uri).await.json_as();
        assert!(unchanged.redirect_uris.is_empty());
    }

    #[tokio::test]
    async fn test_token_settings_validation() {
        let fixture = TestFixture::new().await;
        let client = create(&fixture, "portal", "web_app_hybrid").await;
        let uri = format!("/clients/{}/tokens", client.client_id);

        let mut tokens: Value = fixture.get(&uri).await.json;
        tokens["accessTokenType"] = json!("Reference");
        fixture.put(&uri, &tokens).await.assert_status(StatusCode::NO_CONTENT);
        let stored: ClientTokenSettings = fixture.get(&uri).await.json_as();
        assert_eq!(stored.access_token_type, crate::models::AccessTokenType::Reference);

        tokens["accessTokenType"] = json!("Opaque");
        fixture.put(&uri, &tokens).await.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_secret_lifecycle() {
        let fixture = TestFixture::new().await;
        let client = create(&fixture, "portal", "server").await;
        let uri = format!("/clients/{}/secrets", client.client_id);

        let response = fixture
            .post(&uri, &json!({"value": "secret", "description": "ci"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let secret: SecretView = response.json_as();
        assert_eq!(secret.value, "K7gNU3sdo+OL0wNhqoVWhr3g6s1xYv72ol/pe/Unols=");

        fixture
            .delete(format!("{uri}/{}", secret.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        fixture
            .delete(format!("{uri}/{}", secret.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        let remaining: Vec<SecretView> = fixture.get(&uri).await.json_as();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn test_property_and_claim_conflicts() {
        let fixture = TestFixture::new().await;
        let client = create(&fixture, "portal", "spa").await;

        let properties = format!("/clients/{}/properties", client.client_id);
        let property = json!({"key": "theme", "value": "dark"});
        fixture.post(&properties, &property).await.assert_status(StatusCode::CREATED);
        fixture.post(&properties, &property).await.assert_status(StatusCode::CONFLICT);

        let claims = format!("/clients/{}/claims", client.client_id);
        let claim = json!({"type": "tenant", "value": "acme"});
        fixture.post(&claims, &claim).await.assert_status(StatusCode::CREATED);
        fixture.post(&claims, &claim).await.assert_status(StatusCode::CONFLICT);
        fixture
            .delete(format!("{claims}/tenant"))
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_member_may_view_but_not_create() {
        let fixture = TestFixture::new().await;
        let created = fixture
            .post(
                "/users",
                &json!({
                    "userName": "viewer",
                    "email": "viewer@example.com",
                    "dob": "1990-01-01"
                }),
            )
            .await;
        created.assert_status(StatusCode::CREATED);
        let token = fixture.token_for("viewer").await;

        let listed = fixture
            .send_as(Method::GET, "/clients/filter", &token, None::<&Value>)
            .await;
        listed.assert_ok();

        let denied = fixture
            .send_as(
                Method::POST,
                "/clients",
                &token,
                Some(&json!({"clientName": "sneaky", "clientType": "spa"})),
            )
            .await;
        denied.assert_status(StatusCode::UNAUTHORIZED);
        assert!(denied.detail().contains("SSO_SERVER"));
    }

    #[tokio::test]
    async fn test_denial_precedes_body_validation() {
        let fixture = TestFixture::new().await;
        fixture
            .post(
                "/users",
                &json!({"userName": "viewer", "email": "viewer@example.com", "dob": "1990-01-01"}),
            )
            .await
            .assert_status(StatusCode::CREATED);
        let token = fixture.token_for("viewer").await;

        let create = fixture
            .send_as(Method::POST, "/clients", &token, Some(&json!({})))
            .await;
        create.assert_status(StatusCode::UNAUTHORIZED);
        assert!(create.detail().contains("SSO_SERVER_CREATE"));

        let update = fixture
            .send_as(Method::PUT, "/clients/ghost/tokens", &token, Some(&json!({"x": 1})))
            .await;
        update.assert_status(StatusCode::UNAUTHORIZED);
        assert!(update.detail().contains("SSO_SERVER_UPDATE"));
    }

    #[tokio::test]
    async fn test_unknown_client_is_not_found() {
        let fixture = TestFixture::new().await;
        for uri in ["/clients/ghost/basics", "/clients/ghost/device-flows"] {
            fixture.get(uri).await.assert_status(StatusCode::NOT_FOUND);
        }
    }
}
