//! Error taxonomy for issue operations.
//!
//! Three kinds of failure reach callers:
//! - `BadRequest`: a precondition or field constraint was violated before any
//!   mutation happened
//! - `NotFound`: a lookup by id yielded nothing
//! - `Storage`: the backend failed; carried as an opaque `anyhow::Error`
//!
//! Storage backends speak `anyhow`. A backend that needs to report one of the
//! typed kinds wraps a `TrackerError` in the `anyhow::Error`, and
//! [`TrackerError::from_store`] recovers it.

use crate::domain::ISSUE_ENTITY;
use thiserror::Error;

/// Errors returned by the issue service and query service.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The request violates a precondition or field constraint
    #[error("{message}")]
    BadRequest {
        /// Entity the request targeted (e.g. "issue")
        entity: &'static str,
        /// Stable machine-readable key (e.g. "idexists")
        key: &'static str,
        /// Human-readable description
        message: String,
    },

    /// No entity with the given id exists
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// Backend failure, not specially handled
    #[error("storage failure: {0:#}")]
    Storage(#[source] anyhow::Error),
}

impl TrackerError {
    /// Bad request against the issue entity
    pub fn bad_request(key: &'static str, message: impl Into<String>) -> Self {
        TrackerError::BadRequest {
            entity: ISSUE_ENTITY,
            key,
            message: message.into(),
        }
    }

    /// A new issue arrived with an id already set
    pub fn id_exists() -> Self {
        Self::bad_request("idexists", "A new issue cannot already have an ID")
    }

    /// An update arrived without an id
    pub fn id_null() -> Self {
        Self::bad_request("idnull", "Invalid id")
    }

    /// A comment carries an id that is not one of this issue's stored comments
    pub fn foreign_comment(comment_id: i64) -> Self {
        Self::bad_request(
            "badrequest",
            format!("Comment {} is not attached to this issue", comment_id),
        )
    }

    /// A filter, paging or sort parameter could not be parsed
    pub fn bad_filter(message: impl Into<String>) -> Self {
        Self::bad_request("badfilter", message)
    }

    pub fn not_found(id: i64) -> Self {
        TrackerError::NotFound {
            entity: ISSUE_ENTITY,
            id,
        }
    }

    /// Recover a typed error from a storage-layer `anyhow::Error`.
    ///
    /// If the error chain's outermost value is a `TrackerError` it is
    /// returned as-is, otherwise the error is wrapped as `Storage`.
    pub fn from_store(err: anyhow::Error) -> Self {
        match err.downcast::<TrackerError>() {
            Ok(typed) => typed,
            Err(other) => TrackerError::Storage(other),
        }
    }

    /// Stable error key used in response headers and bodies
    pub fn key(&self) -> &'static str {
        match self {
            TrackerError::BadRequest { key, .. } => key,
            TrackerError::NotFound { .. } => "notfound",
            TrackerError::Storage(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_from_store_recovers_typed_error() {
        let err = anyhow::Error::new(TrackerError::not_found(12));
        let recovered = TrackerError::from_store(err);
        assert!(matches!(recovered, TrackerError::NotFound { id: 12, .. }));
    }

    #[test]
    fn test_from_store_wraps_other_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = Err::<(), _>(io)
            .context("Failed to write issue file")
            .unwrap_err();

        let wrapped = TrackerError::from_store(err);
        assert!(matches!(wrapped, TrackerError::Storage(_)));
        assert!(wrapped.to_string().contains("Failed to write issue file"));
        assert!(wrapped.to_string().contains("disk on fire"));
    }

    #[test]
    fn test_keys() {
        assert_eq!(TrackerError::id_exists().key(), "idexists");
        assert_eq!(TrackerError::id_null().key(), "idnull");
        assert_eq!(TrackerError::bad_filter("x").key(), "badfilter");
        assert_eq!(TrackerError::not_found(1).key(), "notfound");
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            TrackerError::id_exists().to_string(),
            "A new issue cannot already have an ID"
        );
        assert_eq!(TrackerError::not_found(5).to_string(), "issue not found: 5");
    }
}
