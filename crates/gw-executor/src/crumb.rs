//! CSRF crumb cache (spec.md §4.3 step 5, §5).
//!
//! First read goes through the mutex; the refresh GET itself is performed
//! without holding the lock, and the result is committed back under the
//! lock afterwards (spec.md §5, "refresh performed without holding the
//! mutex then committed").

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::Mutex;

use gw_core::CrumbEntry;

use crate::error::ExecutorError;

/// Per-executor cache of one [`CrumbEntry`] per service.
#[derive(Debug, Default)]
pub struct CrumbCache {
    entries: Mutex<HashMap<String, CrumbEntry>>,
}

impl CrumbCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the `(field, token)` header pair to attach for `service`,
    /// fetching and caching a fresh crumb if needed. Returns `None` if the
    /// service is tombstoned (its crumb endpoint returned 404 at some
    /// point) — callers should then send the request without a crumb
    /// header.
    pub async fn header_for(
        &self,
        service: &str,
        base_url: &str,
        client: &reqwest::Client,
    ) -> Result<Option<(String, String)>, ExecutorError> {
        let now = Utc::now();
        {
            let entries = self.entries.lock().await;
            match entries.get(service) {
                Some(entry @ CrumbEntry::Active { field, token, .. }) if entry.is_valid(now) => {
                    return Ok(Some((field.clone(), token.clone())));
                }
                Some(CrumbEntry::Disabled) => return Ok(None),
                _ => {}
            }
        }

        let url = format!("{}/crumbIssuer/api/json", base_url.trim_end_matches('/'));
        let response = client.get(&url).send().await.map_err(|e| ExecutorError::BackendTransport {
            service: service.to_string(),
            message: e.to_string(),
        })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            let mut entries = self.entries.lock().await;
            entries.insert(service.to_string(), CrumbEntry::Disabled);
            return Ok(None);
        }

        let response = response.error_for_status().map_err(|e| ExecutorError::BackendTransport {
            service: service.to_string(),
            message: e.to_string(),
        })?;

        let body: CrumbIssuerResponse = response.json().await.map_err(|e| ExecutorError::BackendTransport {
            service: service.to_string(),
            message: e.to_string(),
        })?;

        let entry = CrumbEntry::active(body.crumb_request_field, body.crumb, Utc::now());
        let pair = match &entry {
            CrumbEntry::Active { field, token, .. } => (field.clone(), token.clone()),
            CrumbEntry::Disabled => unreachable!("just constructed an Active entry"),
        };
        let mut entries = self.entries.lock().await;
        entries.insert(service.to_string(), entry);
        Ok(Some(pair))
    }
}

#[derive(Debug, serde::Deserialize)]
struct CrumbIssuerResponse {
    #[serde(rename = "crumbRequestField")]
    crumb_request_field: String,
    crumb: String,
}
