use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A protected API. Its name doubles as the claim type of role permission claims.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResource {
    pub id: i64,
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub enabled: bool,
    pub show_in_discovery_document: bool,
    pub allowed_access_token_signing_algorithms: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

impl ApiResource {
    pub fn touch(&mut self) {
        self.updated = Some(Utc::now());
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiScope {
    pub id: i64,
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub enabled: bool,
    pub required: bool,
    pub emphasize: bool,
    pub show_in_discovery_document: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdentityResource {
    pub id: i64,
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub enabled: bool,
    pub required: bool,
    pub emphasize: bool,
    pub show_in_discovery_document: bool,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

impl IdentityResource {
    pub fn touch(&mut self) {
        self.updated = Some(Utc::now());
    }
}
