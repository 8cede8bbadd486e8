use crate::api::{
    api_resources, api_scopes, clients, files, health, identity_resources, roles, tokens, users,
};
use crate::state::AppState;
use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

pub(crate) const HEALTH_TAG: &str = "Health API";
pub(crate) const CLIENTS_TAG: &str = "Clients API";
pub(crate) const API_RESOURCES_TAG: &str = "Api Resources API";
pub(crate) const API_SCOPES_TAG: &str = "Api Scopes API";
pub(crate) const IDENTITY_RESOURCES_TAG: &str = "Identity Resources API";
pub(crate) const ROLES_TAG: &str = "Roles API";
pub(crate) const USERS_TAG: &str = "Users API";
pub(crate) const CONNECT_TAG: &str = "Connect API";
pub(crate) const FILES_TAG: &str = "Files API";

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::ready_check,
        clients::list_clients,
        clients::create_client,
        clients::delete_client,
        clients::available_scopes,
        clients::get_basics,
        clients::update_basics,
        clients::get_settings,
        clients::update_settings,
        clients::get_authentication,
        clients::update_authentication,
        clients::get_tokens,
        clients::update_tokens,
        clients::get_device_flow,
        clients::update_device_flow,
        clients::list_secrets,
        clients::add_secret,
        clients::remove_secret,
        clients::list_properties,
        clients::add_property,
        clients::remove_property,
        clients::list_claims,
        clients::add_claim,
        clients::remove_claim,
        api_resources::list_names,
        api_resources::list_api_resources,
        api_resources::create_api_resource,
        api_resources::get_api_resource,
        api_resources::update_api_resource,
        api_resources::delete_api_resource,
        api_resources::list_secrets,
        api_resources::add_secret,
        api_resources::remove_secret,
        api_resources::list_properties,
        api_resources::add_property,
        api_resources::remove_property,
        api_scopes::list_api_scopes,
        api_scopes::create_api_scope,
        api_scopes::get_api_scope,
        api_scopes::update_api_scope,
        api_scopes::delete_api_scope,
        api_scopes::list_properties,
        api_scopes::add_property,
        api_scopes::remove_property,
        identity_resources::list_identity_resources,
        identity_resources::create_identity_resource,
        identity_resources::get_identity_resource,
        identity_resources::update_identity_resource,
        identity_resources::delete_identity_resource,
        identity_resources::list_properties,
        identity_resources::add_property,
        identity_resources::remove_property,
        roles::list_roles,
        roles::create_role,
        roles::get_role,
        roles::update_role,
        roles::delete_role,
        roles::list_permissions,
        roles::set_permissions,
        roles::list_client_access,
        roles::set_client_access,
        users::create_user,
        users::list_users,
        users::get_user,
        users::update_user,
        users::delete_user,
        users::get_user_roles,
        users::set_user_roles,
        tokens::issue_token,
        tokens::revoke_token,
        tokens::userinfo,
        files::upload_file,
    ),
    tags(
        (name = HEALTH_TAG, description = "Liveness and readiness probes"),
        (name = CLIENTS_TAG, description = "OAuth client configuration"),
        (name = API_RESOURCES_TAG, description = "Protected APIs, their scopes and secrets"),
        (name = API_SCOPES_TAG, description = "Scopes requestable by clients"),
        (name = IDENTITY_RESOURCES_TAG, description = "Groups of user identity claims"),
        (name = ROLES_TAG, description = "Roles, their permission grants and client access"),
        (name = USERS_TAG, description = "User profiles and role memberships"),
        (name = CONNECT_TAG, description = "Access token issuance and introspection"),
        (name = FILES_TAG, description = "Avatar and logo uploads"),
    ),
    info(
        title = "SSO Admin API",
        description = "Administration of an OAuth 2.0 / OpenID Connect identity provider",
        version = "1.0.0"
    )
)]
pub(crate) struct ApiDoc;

async fn openapi_json_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Serves the generated document at `/openapi.json`
pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json_handler))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::TestFixture;

    #[tokio::test]
    async fn test_openapi_document_lists_admin_paths() {
        let fixture = TestFixture::new().await;
        let response = fixture.get_anonymous("/openapi.json").await;
        response.assert_ok();

        let paths = response.json["paths"].as_object().unwrap();
        for path in [
            "/clients/filter",
            "/roles/{role_id}/claims",
            "/users/{user_id}/roles",
            "/connect/token",
            "/files/upload",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }
        assert_eq!(response.json["info"]["title"], "SSO Admin API");
    }
}
