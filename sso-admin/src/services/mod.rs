//! Administrative use cases.
//!
//! Each operation loads what it needs from the [`Store`], stages every write
//! into one [`ChangeSet`] and commits it at the end, so a rejected request
//! leaves nothing behind.

use crate::errors::ServiceError;
use crate::store::{ChangeSet, Store};
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, error};

pub mod api_resources;
pub mod api_scopes;
pub mod clients;
pub mod files;
pub mod identity_resources;
pub mod profile;
pub mod properties;
pub mod roles;
pub mod secrets;
pub mod users;

/// Commits staged changes for one use case.
///
/// An empty change set is a successful no-op. A non-empty one that affects no
/// rows is reported as a persistence failure.
pub(crate) async fn commit(
    store: &dyn Store,
    changes: ChangeSet,
    what: &str,
) -> Result<(), ServiceError> {
    if changes.is_empty() {
        debug!("Nothing to commit for {what}");
        return Ok(());
    }
    let staged = changes.len();
    let rows = store.commit(changes).await?;
    if rows == 0 {
        error!("Commit of {staged} change(s) for {what} affected no rows");
        return Err(ServiceError::Persistence(format!("Failed to {what}")));
    }
    debug!("Committed {what}: {rows} row(s)");
    Ok(())
}

/// Rejects blank required values, returning the trimmed text
pub(crate) fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, ServiceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::Validation(format!("{field} is required")));
    }
    Ok(value)
}

/// Parses a calendar date given as `YYYY-MM-DD`, `YYYY/MM/DD` or an RFC 3339 timestamp
pub(crate) fn parse_date(value: &str, field: &str) -> Result<NaiveDate, ServiceError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y/%m/%d"))
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|at| at.date_naive()))
        .map_err(|_| ServiceError::Validation(format!("{field} '{value}' is not a valid date")))
}

/// Parses an optional expiration, a bare date meaning midnight UTC of that day
pub(crate) fn parse_expiration(
    value: Option<&str>,
) -> Result<Option<DateTime<Utc>>, ServiceError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(at.with_timezone(&Utc)));
    }
    let date = parse_date(value, "expiration")?;
    Ok(date.and_hms_opt(0, 0, 0).map(|midnight| midnight.and_utc()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::{Change, ChildKind};

    #[tokio::test]
    async fn test_empty_commit_is_success() {
        let store = MemoryStore::new();
        assert!(commit(&store, ChangeSet::new(), "update nothing").await.is_ok());
    }

    #[tokio::test]
    async fn test_commit_affecting_no_rows_fails() {
        let store = MemoryStore::new();
        let changes = ChangeSet::from(vec![Change::RemoveChild {
            kind: ChildKind::ClientScope,
            parent: 1,
            key: "openid".to_string(),
        }]);
        assert_eq!(
            commit(&store, changes, "update client").await,
            Err(ServiceError::Persistence("Failed to update client".to_string()))
        );
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(1990, 4, 21).unwrap();
        assert_eq!(parse_date("1990-04-21", "dob").unwrap(), expected);
        assert_eq!(parse_date("1990/04/21", "dob").unwrap(), expected);
        assert_eq!(parse_date("1990-04-21T10:00:00Z", "dob").unwrap(), expected);
        assert!(matches!(
            parse_date("21 April", "dob"),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_expiration() {
        assert_eq!(parse_expiration(None).unwrap(), None);
        assert_eq!(parse_expiration(Some("  ")).unwrap(), None);
        let at = parse_expiration(Some("2030-01-02")).unwrap().unwrap();
        assert_eq!(at.to_rfc3339(), "2030-01-02T00:00:00+00:00");
        assert!(parse_expiration(Some("soon")).is_err());
    }

    #[test]
    fn test_required_trims() {
        assert_eq!(required("  web  ", "clientName").unwrap(), "web");
        assert!(required(" ", "clientName").is_err());
    }
}
