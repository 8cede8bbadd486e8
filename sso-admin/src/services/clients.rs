use crate::errors::ServiceError;
use crate::models::client::grant_types_for_client_type;
use crate::models::{
    AccessTokenType, Client, ClientAuthentication, ClientBasics, ClientClaim, ClientDeviceFlow,
    ClientOptions, ClientTokenSettings, ListQuery, Page, Property, RefreshTokenExpiration,
    RefreshTokenUsage,
};
use crate::reconcile::reconcile;
use crate::services::properties::PropertyRequest;
use crate::services::secrets::{SecretHasher, SecretRequest, SecretView};
use crate::services::{commit, properties, required, secrets};
use crate::store::{Change, ChangeSet, ChildKind, Owner, Store};
use log::info;
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;
use uuid::Uuid;

pub const OFFLINE_ACCESS_SCOPE: &str = "offline_access";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientSummary {
    pub client_id: String,
    pub client_name: String,
    pub logo_uri: Option<String>,
}

impl From<&Client> for ClientSummary {
    fn from(client: &Client) -> Self {
        Self {
            client_id: client.client_id.clone(),
            client_name: client.client_name.clone(),
            logo_uri: client.basics.logo_uri.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientRequest {
    pub client_name: String,
    #[serde(flatten)]
    pub basics: ClientBasics,
    /// Picks the initial grant types, e.g. `spa`, `server` or `device`
    #[serde(default)]
    pub client_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientBasicsView {
    pub client_id: String,
    pub client_name: String,
    #[serde(flatten)]
    pub basics: ClientBasics,
    pub allowed_cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientBasicsRequest {
    #[serde(flatten)]
    pub basics: ClientBasics,
    #[serde(default)]
    pub allowed_cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientSettings {
    #[serde(flatten)]
    pub options: ClientOptions,
    #[serde(default)]
    pub allowed_scopes: Vec<String>,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    #[serde(default)]
    pub allowed_grant_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientAuthenticationSettings {
    #[serde(flatten)]
    pub authentication: ClientAuthentication,
    #[serde(default)]
    pub post_logout_redirect_uris: Vec<String>,
}

/// Token settings as sent by the UI, enum values as their display strings
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientTokensRequest {
    pub identity_token_lifetime: i32,
    pub access_token_lifetime: i32,
    /// `Jwt` or `Reference`
    pub access_token_type: String,
    pub authorization_code_lifetime: i32,
    pub absolute_refresh_token_lifetime: i32,
    pub sliding_refresh_token_lifetime: i32,
    /// `ReUse` or `OneTimeOnly`
    pub refresh_token_usage: String,
    /// `Sliding` or `Absolute`
    pub refresh_token_expiration: String,
    #[serde(default)]
    pub update_access_token_claims_on_refresh: bool,
    #[serde(default)]
    pub include_jwt_id: bool,
    #[serde(default)]
    pub always_send_client_claims: bool,
    #[serde(default)]
    pub always_include_user_claims_in_id_token: bool,
    #[serde(default)]
    pub pair_wise_subject_salt: Option<String>,
    #[serde(default)]
    pub client_claims_prefix: Option<String>,
}

impl TryFrom<ClientTokensRequest> for ClientTokenSettings {
    type Error = ServiceError;

    fn try_from(request: ClientTokensRequest) -> Result<Self, Self::Error> {
        let access_token_type: AccessTokenType = request
            .access_token_type
            .parse()
            .map_err(ServiceError::Validation)?;
        let refresh_token_usage: RefreshTokenUsage = request
            .refresh_token_usage
            .parse()
            .map_err(ServiceError::Validation)?;
        let refresh_token_expiration: RefreshTokenExpiration = request
            .refresh_token_expiration
            .parse()
            .map_err(ServiceError::Validation)?;
        Ok(Self {
            identity_token_lifetime: request.identity_token_lifetime,
            access_token_lifetime: request.access_token_lifetime,
            access_token_type,
            authorization_code_lifetime: request.authorization_code_lifetime,
            absolute_refresh_token_lifetime: request.absolute_refresh_token_lifetime,
            sliding_refresh_token_lifetime: request.sliding_refresh_token_lifetime,
            refresh_token_usage,
            refresh_token_expiration,
            update_access_token_claims_on_refresh: request.update_access_token_claims_on_refresh,
            include_jwt_id: request.include_jwt_id,
            always_send_client_claims: request.always_send_client_claims,
            always_include_user_claims_in_id_token: request.always_include_user_claims_in_id_token,
            pair_wise_subject_salt: request.pair_wise_subject_salt,
            client_claims_prefix: request.client_claims_prefix,
        })
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ClientClaimRequest {
    #[serde(rename = "type")]
    pub claim_type: String,
    #[serde(default)]
    pub value: String,
}

async fn load(store: &dyn Store, client_id: &str) -> Result<Client, ServiceError> {
    store
        .find_client(client_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("client", client_id))
}

/// Stages the client row with a fresh `updated` timestamp
fn stage_touch(mut client: Client, changes: &mut ChangeSet) {
    client.touch();
    changes.push(Change::UpdateClient(client));
}

fn vec_of(keys: std::collections::BTreeSet<String>) -> Vec<String> {
    keys.into_iter().collect()
}

/// Absolute URIs only; origins additionally without path, query or fragment
fn validate_uris(values: &[String], field: &str, origins_only: bool) -> Result<(), ServiceError> {
    for value in values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
        let url = Url::parse(value).map_err(|e| {
            ServiceError::Validation(format!("{field} contains an invalid uri '{value}': {e}"))
        })?;
        if origins_only
            && (url.path() != "/" || url.query().is_some() || url.fragment().is_some())
        {
            return Err(ServiceError::Validation(format!(
                "{field} must contain origins only, got '{value}'"
            )));
        }
    }
    Ok(())
}

pub async fn list(store: &dyn Store, query: &ListQuery) -> Result<Page<ClientSummary>, ServiceError> {
    let page = query.page().map_err(ServiceError::Validation)?;
    let clients = store.list_clients(query.filter(), page).await?;
    Ok(clients.map(|client| ClientSummary::from(&client)))
}

pub async fn create(
    store: &dyn Store,
    request: CreateClientRequest,
) -> Result<ClientSummary, ServiceError> {
    let client_name = required(&request.client_name, "clientName")?;
    if store.find_client_by_name(client_name).await?.is_some() {
        return Err(ServiceError::conflict("client", client_name));
    }

    let client = Client::new(
        store.next_id().await?,
        Uuid::new_v4().to_string(),
        client_name.to_string(),
        request.basics,
    );
    let mut changes = ChangeSet::new();
    changes.push(Change::InsertClient(client.clone()));
    changes.extend(
        grant_types_for_client_type(request.client_type.trim())
            .iter()
            .map(|grant_type| Change::AddChild {
                kind: ChildKind::ClientGrantType,
                parent: client.id,
                key: grant_type.to_string(),
            }),
    );
    commit(store, changes, "create client").await?;
    info!("Created client '{}' ({})", client.client_name, client.client_id);
    Ok(ClientSummary::from(&client))
}

pub async fn delete(store: &dyn Store, client_id: &str) -> Result<(), ServiceError> {
    let client = load(store, client_id).await?;
    commit(
        store,
        ChangeSet::from(vec![Change::DeleteClient(client.id)]),
        "delete client",
    )
    .await?;
    info!("Deleted client '{}'", client.client_id);
    Ok(())
}

/// Every scope a client may be allowed: identity resources, offline access, api scopes
pub async fn available_scopes(store: &dyn Store) -> Result<Vec<String>, ServiceError> {
    let mut scopes = store.identity_resource_names().await?;
    scopes.push(OFFLINE_ACCESS_SCOPE.to_string());
    scopes.extend(store.api_scope_names().await?);
    Ok(scopes)
}

pub async fn basics(store: &dyn Store, client_id: &str) -> Result<ClientBasicsView, ServiceError> {
    let client = load(store, client_id).await?;
    let origins = store
        .child_keys(ChildKind::ClientCorsOrigin, client.id)
        .await?;
    Ok(ClientBasicsView {
        client_id: client.client_id,
        client_name: client.client_name,
        basics: client.basics,
        allowed_cors_origins: vec_of(origins),
    })
}

pub async fn update_basics(
    store: &dyn Store,
    client_id: &str,
    request: ClientBasicsRequest,
) -> Result<(), ServiceError> {
    validate_uris(&request.allowed_cors_origins, "allowedCorsOrigins", true)?;
    let mut client = load(store, client_id).await?;
    let mut changes = ChangeSet::new();
    reconcile(
        store,
        ChildKind::ClientCorsOrigin,
        client.id,
        &request.allowed_cors_origins,
        &mut changes,
    )
    .await?;
    client.basics = request.basics;
    stage_touch(client, &mut changes);
    commit(store, changes, "update client basics").await
}

pub async fn settings(store: &dyn Store, client_id: &str) -> Result<ClientSettings, ServiceError> {
    let client = load(store, client_id).await?;
    Ok(ClientSettings {
        options: client.options,
        allowed_scopes: vec_of(store.child_keys(ChildKind::ClientScope, client.id).await?),
        redirect_uris: vec_of(
            store
                .child_keys(ChildKind::ClientRedirectUri, client.id)
                .await?,
        ),
        allowed_grant_types: vec_of(
            store
                .child_keys(ChildKind::ClientGrantType, client.id)
                .await?,
        ),
    })
}

pub async fn update_settings(
    store: &dyn Store,
    client_id: &str,
    request: ClientSettings,
) -> Result<(), ServiceError> {
    validate_uris(&request.redirect_uris, "redirectUris", false)?;
    let mut client = load(store, client_id).await?;
    let mut changes = ChangeSet::new();
    reconcile(
        store,
        ChildKind::ClientScope,
        client.id,
        &request.allowed_scopes,
        &mut changes,
    )
    .await?;
    reconcile(
        store,
        ChildKind::ClientRedirectUri,
        client.id,
        &request.redirect_uris,
        &mut changes,
    )
    .await?;
    reconcile(
        store,
        ChildKind::ClientGrantType,
        client.id,
        &request.allowed_grant_types,
        &mut changes,
    )
    .await?;
    client.options = request.options;
    stage_touch(client, &mut changes);
    commit(store, changes, "update client settings").await
}

pub async fn authentication(
    store: &dyn Store,
    client_id: &str,
) -> Result<ClientAuthenticationSettings, ServiceError> {
    let client = load(store, client_id).await?;
    let uris = store
        .child_keys(ChildKind::ClientPostLogoutRedirectUri, client.id)
        .await?;
    Ok(ClientAuthenticationSettings {
        authentication: client.authentication,
        post_logout_redirect_uris: vec_of(uris),
    })
}

pub async fn update_authentication(
    store: &dyn Store,
    client_id: &str,
    request: ClientAuthenticationSettings,
) -> Result<(), ServiceError> {
    validate_uris(
        &request.post_logout_redirect_uris,
        "postLogoutRedirectUris",
        false,
    )?;
    let mut client = load(store, client_id).await?;
    let mut changes = ChangeSet::new();
    reconcile(
        store,
        ChildKind::ClientPostLogoutRedirectUri,
        client.id,
        &request.post_logout_redirect_uris,
        &mut changes,
    )
    .await?;
    client.authentication = request.authentication;
    stage_touch(client, &mut changes);
    commit(store, changes, "update client authentication").await
}

pub async fn tokens(store: &dyn Store, client_id: &str) -> Result<ClientTokenSettings, ServiceError> {
    Ok(load(store, client_id).await?.tokens)
}

pub async fn update_tokens(
    store: &dyn Store,
    client_id: &str,
    request: ClientTokensRequest,
) -> Result<(), ServiceError> {
    let settings = ClientTokenSettings::try_from(request)?;
    let mut client = load(store, client_id).await?;
    client.tokens = settings;
    let mut changes = ChangeSet::new();
    stage_touch(client, &mut changes);
    commit(store, changes, "update client tokens").await
}

pub async fn device_flow(store: &dyn Store, client_id: &str) -> Result<ClientDeviceFlow, ServiceError> {
    Ok(load(store, client_id).await?.device_flow)
}

pub async fn update_device_flow(
    store: &dyn Store,
    client_id: &str,
    request: ClientDeviceFlow,
) -> Result<(), ServiceError> {
    if request.device_code_lifetime <= 0 {
        return Err(ServiceError::Validation(
            "deviceCodeLifetime must be positive".to_string(),
        ));
    }
    let mut client = load(store, client_id).await?;
    client.device_flow = request;
    let mut changes = ChangeSet::new();
    stage_touch(client, &mut changes);
    commit(store, changes, "update client device flow").await
}

pub async fn list_secrets(store: &dyn Store, client_id: &str) -> Result<Vec<SecretView>, ServiceError> {
    let client = load(store, client_id).await?;
    secrets::list(store, Owner::client(client.id)).await
}

pub async fn add_secret(
    store: &dyn Store,
    hasher: &dyn SecretHasher,
    client_id: &str,
    request: SecretRequest,
) -> Result<SecretView, ServiceError> {
    let client = load(store, client_id).await?;
    let mut changes = ChangeSet::new();
    let secret =
        secrets::stage_add(store, hasher, Owner::client(client.id), &request, &mut changes).await?;
    stage_touch(client, &mut changes);
    commit(store, changes, "add client secret").await?;
    Ok(secret.into())
}

pub async fn remove_secret(store: &dyn Store, client_id: &str, id: i64) -> Result<(), ServiceError> {
    let client = load(store, client_id).await?;
    let mut changes = ChangeSet::new();
    secrets::stage_remove(store, Owner::client(client.id), id, &mut changes).await?;
    stage_touch(client, &mut changes);
    commit(store, changes, "remove client secret").await
}

pub async fn list_properties(store: &dyn Store, client_id: &str) -> Result<Vec<Property>, ServiceError> {
    let client = load(store, client_id).await?;
    properties::list(store, Owner::client(client.id)).await
}

pub async fn add_property(
    store: &dyn Store,
    client_id: &str,
    request: PropertyRequest,
) -> Result<Property, ServiceError> {
    let client = load(store, client_id).await?;
    let mut changes = ChangeSet::new();
    let property =
        properties::stage_add(store, Owner::client(client.id), &request, &mut changes).await?;
    stage_touch(client, &mut changes);
    commit(store, changes, "add client property").await?;
    Ok(property)
}

pub async fn remove_property(store: &dyn Store, client_id: &str, key: &str) -> Result<(), ServiceError> {
    let client = load(store, client_id).await?;
    let mut changes = ChangeSet::new();
    properties::stage_remove(store, Owner::client(client.id), key, &mut changes).await?;
    stage_touch(client, &mut changes);
    commit(store, changes, "remove client property").await
}

pub async fn list_claims(store: &dyn Store, client_id: &str) -> Result<Vec<ClientClaim>, ServiceError> {
    let client = load(store, client_id).await?;
    Ok(store.client_claims(client.id).await?)
}

pub async fn add_claim(
    store: &dyn Store,
    client_id: &str,
    request: ClientClaimRequest,
) -> Result<ClientClaim, ServiceError> {
    let claim_type = required(&request.claim_type, "type")?;
    let client = load(store, client_id).await?;
    if store
        .client_claims(client.id)
        .await?
        .iter()
        .any(|claim| claim.claim_type == claim_type)
    {
        return Err(ServiceError::conflict("client claim", claim_type));
    }
    let claim = ClientClaim {
        id: store.next_id().await?,
        claim_type: claim_type.to_string(),
        value: request.value,
    };
    let mut changes = ChangeSet::new();
    changes.push(Change::InsertClientClaim {
        client: client.id,
        claim: claim.clone(),
    });
    stage_touch(client, &mut changes);
    commit(store, changes, "add client claim").await?;
    Ok(claim)
}

pub async fn remove_claim(store: &dyn Store, client_id: &str, claim_type: &str) -> Result<(), ServiceError> {
    let client = load(store, client_id).await?;
    if !store
        .client_claims(client.id)
        .await?
        .iter()
        .any(|claim| claim.claim_type == claim_type)
    {
        return Err(ServiceError::not_found("client claim", claim_type));
    }
    let mut changes = ChangeSet::new();
    changes.push(Change::DeleteClientClaim {
        client: client.id,
        claim_type: claim_type.to_string(),
    });
    stage_touch(client, &mut changes);
    commit(store, changes, "remove client claim").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::secrets::Sha256SecretHasher;
    use crate::store::memory::MemoryStore;

    async fn create_client(store: &MemoryStore, name: &str, client_type: &str) -> ClientSummary {
        create(
            store,
            CreateClientRequest {
                client_name: name.to_string(),
                basics: ClientBasics {
                    description: Some(format!("{name} client")),
                    ..Default::default()
                },
                client_type: client_type.to_string(),
            },
        )
        .await
        .unwrap()
    }

    fn settings_with_redirects(uris: &[&str]) -> ClientSettings {
        ClientSettings {
            options: ClientOptions::default(),
            allowed_scopes: vec!["openid".to_string(), "profile".to_string()],
            redirect_uris: uris.iter().map(|uri| uri.to_string()).collect(),
            allowed_grant_types: vec!["authorization_code".to_string()],
        }
    }

    #[tokio::test]
    async fn test_create_assigns_grant_types_and_rejects_duplicates() {
        let store = MemoryStore::new();
        let summary = create_client(&store, "portal", "server").await;
        assert_eq!(summary.client_name, "portal");
        assert_eq!(summary.client_id.len(), 36);

        let settings = settings(&store, &summary.client_id).await.unwrap();
        assert_eq!(settings.allowed_grant_types, vec!["client_credentials"]);

        let duplicate = create(
            &store,
            CreateClientRequest {
                client_name: "portal".to_string(),
                basics: ClientBasics::default(),
                client_type: "spa".to_string(),
            },
        )
        .await;
        assert!(matches!(duplicate, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_redirect_uri_owned_by_another_client_conflicts() {
        let store = MemoryStore::new();
        let a = create_client(&store, "a", "spa").await;
        let b = create_client(&store, "b", "spa").await;

        update_settings(&store, &a.client_id, settings_with_redirects(&["https://a/callback"]))
            .await
            .unwrap();
        update_settings(&store, &b.client_id, settings_with_redirects(&["https://b/callback"]))
            .await
            .unwrap();

        let result = update_settings(
            &store,
            &b.client_id,
            settings_with_redirects(&["https://b/callback", "https://a/callback"]),
        )
        .await;
        assert!(matches!(result, Err(ServiceError::Conflict(_))));

        let b_settings = settings(&store, &b.client_id).await.unwrap();
        assert_eq!(b_settings.redirect_uris, vec!["https://b/callback"]);
    }

    #[tokio::test]
    async fn test_unchanged_settings_still_succeed() {
        let store = MemoryStore::new();
        let client = create_client(&store, "a", "spa").await;
        let request = settings_with_redirects(&["https://a/callback"]);
        update_settings(&store, &client.client_id, request.clone())
            .await
            .unwrap();
        update_settings(&store, &client.client_id, request)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_basics_keep_name_and_reconcile_origins() {
        let store = MemoryStore::new();
        let client = create_client(&store, "a", "spa").await;
        update_basics(
            &store,
            &client.client_id,
            ClientBasicsRequest {
                basics: ClientBasics {
                    description: Some("new".to_string()),
                    client_uri: Some("https://a".to_string()),
                    logo_uri: None,
                },
                allowed_cors_origins: vec![
                    "https://a".to_string(),
                    "https://a".to_string(),
                    "https://b:8443".to_string(),
                ],
            },
        )
        .await
        .unwrap();

        let view = basics(&store, &client.client_id).await.unwrap();
        assert_eq!(view.client_name, "a");
        assert_eq!(view.basics.description.as_deref(), Some("new"));
        assert_eq!(view.allowed_cors_origins, vec!["https://a", "https://b:8443"]);

        let stored = store.find_client(&client.client_id).await.unwrap().unwrap();
        assert!(stored.updated.is_some());
    }

    #[tokio::test]
    async fn test_origin_with_path_is_invalid() {
        let store = MemoryStore::new();
        let client = create_client(&store, "a", "spa").await;
        let result = update_basics(
            &store,
            &client.client_id,
            ClientBasicsRequest {
                basics: ClientBasics::default(),
                allowed_cors_origins: vec!["https://a/path".to_string()],
            },
        )
        .await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_unknown_token_type_is_a_validation_failure() {
        let store = MemoryStore::new();
        let client = create_client(&store, "a", "spa").await;
        let request = ClientTokensRequest {
            identity_token_lifetime: 300,
            access_token_lifetime: 3600,
            access_token_type: "Opaque".to_string(),
            authorization_code_lifetime: 300,
            absolute_refresh_token_lifetime: 2_592_000,
            sliding_refresh_token_lifetime: 1_296_000,
            refresh_token_usage: "OneTimeOnly".to_string(),
            refresh_token_expiration: "Absolute".to_string(),
            update_access_token_claims_on_refresh: false,
            include_jwt_id: true,
            always_send_client_claims: false,
            always_include_user_claims_in_id_token: false,
            pair_wise_subject_salt: None,
            client_claims_prefix: Some("client_".to_string()),
        };
        let result = update_tokens(&store, &client.client_id, request.clone()).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));

        let valid = ClientTokensRequest {
            access_token_type: "Reference".to_string(),
            ..request
        };
        update_tokens(&store, &client.client_id, valid).await.unwrap();
        let stored = tokens(&store, &client.client_id).await.unwrap();
        assert_eq!(stored.access_token_type, AccessTokenType::Reference);
        assert_eq!(stored.client_claims_prefix.as_deref(), Some("client_"));
    }

    #[tokio::test]
    async fn test_device_flow_lifetime_is_persisted() {
        let store = MemoryStore::new();
        let client = create_client(&store, "tv", "device").await;
        update_device_flow(
            &store,
            &client.client_id,
            ClientDeviceFlow {
                user_code_type: Some("Numeric".to_string()),
                device_code_lifetime: 600,
            },
        )
        .await
        .unwrap();
        let flow = device_flow(&store, &client.client_id).await.unwrap();
        assert_eq!(flow.device_code_lifetime, 600);
        assert_eq!(flow.user_code_type.as_deref(), Some("Numeric"));
    }

    #[tokio::test]
    async fn test_secrets_touch_the_client() {
        let store = MemoryStore::new();
        let client = create_client(&store, "a", "server").await;
        let secret = add_secret(
            &store,
            &Sha256SecretHasher,
            &client.client_id,
            SecretRequest {
                value: "s3cr3t".to_string(),
                description: None,
                expiration: None,
            },
        )
        .await
        .unwrap();
        let touched = store.find_client(&client.client_id).await.unwrap().unwrap();
        assert!(touched.updated.is_some());

        remove_secret(&store, &client.client_id, secret.id).await.unwrap();
        assert!(list_secrets(&store, &client.client_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_client_claim_types_are_unique() {
        let store = MemoryStore::new();
        let client = create_client(&store, "a", "server").await;
        let request = || ClientClaimRequest {
            claim_type: "tenant".to_string(),
            value: "acme".to_string(),
        };
        add_claim(&store, &client.client_id, request()).await.unwrap();
        assert!(matches!(
            add_claim(&store, &client.client_id, request()).await,
            Err(ServiceError::Conflict(_))
        ));
        remove_claim(&store, &client.client_id, "tenant").await.unwrap();
        assert!(matches!(
            remove_claim(&store, &client.client_id, "tenant").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_client_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            basics(&store, "missing").await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            delete(&store, "missing").await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
