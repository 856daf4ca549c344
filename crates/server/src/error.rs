//! Mapping of tracker errors to HTTP responses.
//!
//! Every error response carries a JSON problem body and the application's
//! failure headers:
//!
//! ```json
//! {"entityName":"issue","errorKey":"idexists","title":"A new issue cannot already have an ID",
//!  "status":400,"message":"error.idexists","params":"issue"}
//! ```

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use issuetracker::domain::ISSUE_ENTITY;
use issuetracker::TrackerError;
use serde::Serialize;

use crate::headers::AlertHeaders;

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub entity_name: String,
    pub error_key: String,
    pub title: String,
    pub status: u16,
    pub message: String,
    pub params: String,
}

/// A tracker error bound to the header names it is reported with
#[derive(Debug)]
pub struct ApiError {
    error: TrackerError,
    headers: AlertHeaders,
}

impl ApiError {
    pub fn new(error: TrackerError, headers: &AlertHeaders) -> Self {
        Self {
            error,
            headers: headers.clone(),
        }
    }

    /// Malformed or mistyped JSON body
    pub fn from_json_rejection(rejection: JsonRejection, headers: &AlertHeaders) -> Self {
        Self::new(
            TrackerError::bad_request("badrequest", rejection.body_text()),
            headers,
        )
    }

    /// Query string that does not decode into key/value pairs
    pub fn from_query_rejection(rejection: QueryRejection, headers: &AlertHeaders) -> Self {
        Self::new(TrackerError::bad_filter(rejection.body_text()), headers)
    }

    /// Path segment that does not parse, such as a non-numeric id
    pub fn from_path_rejection(rejection: PathRejection, headers: &AlertHeaders) -> Self {
        Self::new(
            TrackerError::bad_request("badrequest", rejection.body_text()),
            headers,
        )
    }

    pub fn error(&self) -> &TrackerError {
        &self.error
    }

    pub fn status(&self) -> StatusCode {
        match self.error {
            TrackerError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            TrackerError::NotFound { .. } => StatusCode::NOT_FOUND,
            TrackerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let entity = match &self.error {
            TrackerError::BadRequest { entity, .. } | TrackerError::NotFound { entity, .. } => {
                *entity
            }
            TrackerError::Storage(_) => ISSUE_ENTITY,
        };

        let title = match &self.error {
            TrackerError::Storage(e) => {
                tracing::error!("Storage failure: {:?}", e);
                "Internal server error".to_string()
            }
            other => {
                tracing::debug!("Request failed: {}", other);
                other.to_string()
            }
        };

        let key = self.error.key();
        let body = ErrorBody {
            entity_name: entity.to_string(),
            error_key: key.to_string(),
            title,
            status: status.as_u16(),
            message: format!("error.{}", key),
            params: entity.to_string(),
        };

        (status, self.headers.failure(entity, key), Json(body)).into_response()
    }
}
