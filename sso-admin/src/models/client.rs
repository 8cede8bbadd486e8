use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Grant types issued to a newly created client, keyed by the client type picked in the UI
pub fn grant_types_for_client_type(client_type: &str) -> &'static [&'static str] {
    match client_type {
        "web_app_authorization_code" | "spa" | "native" => &["authorization_code"],
        "web_app_hybrid" => &["hybrid"],
        "server" => &["client_credentials"],
        "device" => &["urn:ietf:params:oauth:grant-type:device_code"],
        _ => &["implicit"],
    }
}

/// An OAuth/OIDC client registered with the identity provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Client {
    /// Internal row identifier, owner key of all child collections
    pub id: i64,
    /// Public client identifier
    pub client_id: String,
    pub client_name: String,
    pub basics: ClientBasics,
    pub options: ClientOptions,
    pub authentication: ClientAuthentication,
    pub tokens: ClientTokenSettings,
    pub device_flow: ClientDeviceFlow,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

impl Client {
    pub fn new(id: i64, client_id: String, client_name: String, basics: ClientBasics) -> Self {
        Self {
            id,
            client_id,
            client_name,
            basics,
            options: ClientOptions::default(),
            authentication: ClientAuthentication::default(),
            tokens: ClientTokenSettings::default(),
            device_flow: ClientDeviceFlow::default(),
            created: Utc::now(),
            updated: None,
        }
    }

    pub fn touch(&mut self) {
        self.updated = Some(Utc::now());
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientBasics {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub client_uri: Option<String>,
    #[serde(default)]
    pub logo_uri: Option<String>,
}

/// Protocol switches edited on the client "settings" page
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientOptions {
    pub enabled: bool,
    pub require_consent: bool,
    pub allow_remember_consent: bool,
    pub allow_offline_access: bool,
    pub require_client_secret: bool,
    pub protocol_type: String,
    pub require_pkce: bool,
    pub allow_plain_text_pkce: bool,
    pub allow_access_tokens_via_browser: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            require_consent: false,
            allow_remember_consent: true,
            allow_offline_access: false,
            require_client_secret: true,
            protocol_type: "oidc".to_string(),
            require_pkce: true,
            allow_plain_text_pkce: false,
            allow_access_tokens_via_browser: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientAuthentication {
    pub enable_local_login: bool,
    #[serde(default)]
    pub front_channel_logout_uri: Option<String>,
    pub front_channel_logout_session_required: bool,
    #[serde(default)]
    pub back_channel_logout_uri: Option<String>,
    pub back_channel_logout_session_required: bool,
    /// Maximum SSO session lifetime in seconds, unlimited when absent
    #[serde(default)]
    pub user_sso_lifetime: Option<i32>,
}

impl Default for ClientAuthentication {
    fn default() -> Self {
        Self {
            enable_local_login: true,
            front_channel_logout_uri: None,
            front_channel_logout_session_required: true,
            back_channel_logout_uri: None,
            back_channel_logout_session_required: true,
            user_sso_lifetime: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub enum AccessTokenType {
    Jwt,
    Reference,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub enum RefreshTokenUsage {
    ReUse,
    OneTimeOnly,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub enum RefreshTokenExpiration {
    Sliding,
    Absolute,
}

macro_rules! string_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(format!(
                        "unknown {} '{}'",
                        stringify!($ty),
                        other
                    )),
                }
            }
        }
    };
}

string_enum!(AccessTokenType { Jwt => "Jwt", Reference => "Reference" });
string_enum!(RefreshTokenUsage { ReUse => "ReUse", OneTimeOnly => "OneTimeOnly" });
string_enum!(RefreshTokenExpiration { Sliding => "Sliding", Absolute => "Absolute" });

/// Token lifetimes and token content options (all lifetimes in seconds)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientTokenSettings {
    pub identity_token_lifetime: i32,
    pub access_token_lifetime: i32,
    pub access_token_type: AccessTokenType,
    pub authorization_code_lifetime: i32,
    pub absolute_refresh_token_lifetime: i32,
    pub sliding_refresh_token_lifetime: i32,
    pub refresh_token_usage: RefreshTokenUsage,
    pub refresh_token_expiration: RefreshTokenExpiration,
    pub update_access_token_claims_on_refresh: bool,
    pub include_jwt_id: bool,
    pub always_send_client_claims: bool,
    pub always_include_user_claims_in_id_token: bool,
    #[serde(default)]
    pub pair_wise_subject_salt: Option<String>,
    #[serde(default)]
    pub client_claims_prefix: Option<String>,
}

impl Default for ClientTokenSettings {
    fn default() -> Self {
        Self {
            identity_token_lifetime: 300,
            access_token_lifetime: 3600,
            access_token_type: AccessTokenType::Jwt,
            authorization_code_lifetime: 300,
            absolute_refresh_token_lifetime: 2_592_000,
            sliding_refresh_token_lifetime: 1_296_000,
            refresh_token_usage: RefreshTokenUsage::OneTimeOnly,
            refresh_token_expiration: RefreshTokenExpiration::Absolute,
            update_access_token_claims_on_refresh: false,
            include_jwt_id: true,
            always_send_client_claims: false,
            always_include_user_claims_in_id_token: false,
            pair_wise_subject_salt: None,
            client_claims_prefix: Some("client_".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientDeviceFlow {
    #[serde(default)]
    pub user_code_type: Option<String>,
    pub device_code_lifetime: i32,
}

impl Default for ClientDeviceFlow {
    fn default() -> Self {
        Self {
            user_code_type: None,
            device_code_lifetime: 300,
        }
    }
}

/// A hashed shared secret owned by a client or an api resource
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    pub id: i64,
    #[serde(rename = "type")]
    pub secret_type: String,
    /// SHA-256 digest of the secret, never the raw value
    pub value: String,
    pub description: Option<String>,
    pub expiration: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
}

/// Free-form key/value pair, keys are unique per owner
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Property {
    pub id: i64,
    pub key: String,
    pub value: String,
}

/// Claim always sent in tokens issued to a client, types are unique per client
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ClientClaim {
    pub id: i64,
    #[serde(rename = "type")]
    pub claim_type: String,
    pub value: String,
}
