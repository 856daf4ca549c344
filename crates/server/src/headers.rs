//! Application alert headers.
//!
//! Mutating endpoints tell the client what happened through
//! `X-<app>-alert` / `X-<app>-params`; failures use `X-<app>-error` instead of
//! the alert. `<app>` is the configured application name.

use anyhow::{Context, Result};
use axum::http::{HeaderMap, HeaderName, HeaderValue};

/// Header names for one application, parsed once at startup
#[derive(Debug, Clone)]
pub struct AlertHeaders {
    alert: HeaderName,
    error: HeaderName,
    params: HeaderName,
}

impl AlertHeaders {
    /// # Errors
    ///
    /// Fails if `app_name` cannot appear in an HTTP header name.
    pub fn new(app_name: &str) -> Result<Self> {
        let name = |suffix: &str| {
            let raw = format!("X-{}-{}", app_name, suffix);
            HeaderName::try_from(raw.as_str())
                .with_context(|| format!("Invalid application name for headers: '{}'", app_name))
        };
        Ok(Self {
            alert: name("alert")?,
            error: name("error")?,
            params: name("params")?,
        })
    }

    pub fn alert_name(&self) -> &HeaderName {
        &self.alert
    }

    pub fn error_name(&self) -> &HeaderName {
        &self.error
    }

    pub fn params_name(&self) -> &HeaderName {
        &self.params
    }

    pub fn entity_creation(&self, entity: &str, id: i64) -> HeaderMap {
        self.alert(
            format!("A new {} is created with identifier {}", entity, id),
            id,
        )
    }

    pub fn entity_update(&self, entity: &str, id: i64) -> HeaderMap {
        self.alert(
            format!("A {} is updated with identifier {}", entity, id),
            id,
        )
    }

    pub fn entity_deletion(&self, entity: &str, id: i64) -> HeaderMap {
        self.alert(
            format!("A {} is deleted with identifier {}", entity, id),
            id,
        )
    }

    /// Headers for a failed request: `error.<key>` plus the entity name
    pub fn failure(&self, entity: &str, error_key: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        insert(&mut headers, &self.error, format!("error.{}", error_key));
        insert(&mut headers, &self.params, entity.to_string());
        headers
    }

    fn alert(&self, message: String, id: i64) -> HeaderMap {
        let mut headers = HeaderMap::new();
        insert(&mut headers, &self.alert, message);
        insert(&mut headers, &self.params, id.to_string());
        headers
    }
}

// Values that are not valid header text are dropped.
fn insert(headers: &mut HeaderMap, name: &HeaderName, value: String) {
    if let Ok(value) = HeaderValue::try_from(value) {
        headers.insert(name.clone(), value);
    }
}
