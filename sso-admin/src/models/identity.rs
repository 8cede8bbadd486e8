use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub normalized_name: String,
}

/// One (role, type, value) claim row. Rows are unique as a whole triple.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoleClaim {
    pub role_id: String,
    pub claim_type: String,
    pub claim_value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub dob: NaiveDate,
    pub avatar_uri: Option<String>,
    pub create_date: DateTime<Utc>,
    pub last_modified_date: Option<DateTime<Utc>>,
}

impl User {
    /// Display name in "last first" order
    pub fn full_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
            .trim()
            .to_string()
    }
}
