//! Auth header assembly and the OAuth2 client-credentials token cache
//! (spec.md §4.3 step 3; SPEC_FULL.md §4.3 supplement).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use gw_core::AuthDescriptor;

use crate::error::ExecutorError;

/// Five-minute expiry buffer on cached OAuth2 access tokens (SPEC_FULL.md
/// §4.3 supplement).
const EXPIRY_BUFFER_SECONDS: i64 = 300;

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn usable(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - chrono::Duration::seconds(EXPIRY_BUFFER_SECONDS) > now
    }
}

/// Per-service OAuth2 token cache. Concurrent refreshers coalesce by
/// holding the mutex across the refresh call itself (spec.md §5), so a
/// waiter that acquires the lock after a refresh completed simply observes
/// the now-valid cached token instead of triggering its own request.
#[derive(Debug, Default)]
pub struct OAuthTokenCache {
    tokens: Mutex<HashMap<String, CachedToken>>,
}

impl OAuthTokenCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a valid access token for `service`, refreshing via
    /// client-credentials (or `refresh_token` grant, if a prior token
    /// carried one) if the cached one is absent, expired, or within the
    /// five-minute buffer.
    pub async fn token_for(
        &self,
        service: &str,
        client: &reqwest::Client,
        token_url: &str,
        client_id: &str,
        client_secret: &str,
        scope: Option<&str>,
        redactor: &gw_core::Redactor,
    ) -> Result<String, ExecutorError> {
        let now = Utc::now();
        let mut tokens = self.tokens.lock().await;
        if let Some(cached) = tokens.get(service) {
            if cached.usable(now) {
                return Ok(cached.access_token.clone());
            }
        }

        let refresh_token = tokens.get(service).and_then(|c| c.refresh_token.clone());
        let mut form: Vec<(&str, &str)> = if let Some(rt) = refresh_token.as_deref() {
            vec![
                ("grant_type", "refresh_token"),
                ("refresh_token", rt),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ]
        } else {
            vec![
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ]
        };
        if let Some(scope) = scope {
            form.push(("scope", scope));
        }

        let response = client
            .post(token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| ExecutorError::OAuth2 {
                service: service.to_string(),
                message: redactor.scrub(&e.to_string()),
            })?;

        let response = response.error_for_status().map_err(|e| ExecutorError::OAuth2 {
            service: service.to_string(),
            message: redactor.scrub(&e.to_string()),
        })?;

        let body: TokenResponse = response.json().await.map_err(|e| ExecutorError::OAuth2 {
            service: service.to_string(),
            message: e.to_string(),
        })?;

        redactor.register(body.access_token.clone());
        if let Some(rt) = &body.refresh_token {
            redactor.register(rt.clone());
        }

        let cached = CachedToken {
            access_token: body.access_token.clone(),
            refresh_token: body.refresh_token,
            expires_at: now + chrono::Duration::seconds(i64::from(body.expires_in.unwrap_or(3600))),
        };
        tokens.insert(service.to_string(), cached.clone());
        Ok(cached.access_token)
    }
}

#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u32>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[allow(dead_code)]
    #[serde(default)]
    token_type: Option<String>,
}

/// Build the `Authorization` (or other) header name/value pair for a given
/// [`AuthDescriptor`]. Returns `None` for variants that carry no static
/// header (none currently — every descriptor yields exactly one header).
pub async fn auth_header(
    auth: &AuthDescriptor,
    service: &str,
    client: &reqwest::Client,
    oauth_cache: &Arc<OAuthTokenCache>,
    redactor: &gw_core::Redactor,
) -> Result<(String, String), ExecutorError> {
    match auth {
        AuthDescriptor::Bearer { token } => Ok(("Authorization".to_string(), format!("Bearer {token}"))),
        AuthDescriptor::Basic { username, password } => {
            use base64::engine::general_purpose::STANDARD;
            use base64::Engine;
            let encoded = STANDARD.encode(format!("{username}:{password}"));
            Ok(("Authorization".to_string(), format!("Basic {encoded}")))
        }
        AuthDescriptor::ApiKey { header, key } => Ok((header.clone(), key.clone())),
        AuthDescriptor::OAuth2 {
            token_url,
            client_id,
            client_secret,
            scope,
        } => {
            let token = oauth_cache
                .token_for(
                    service,
                    client,
                    token_url,
                    client_id,
                    client_secret,
                    scope.as_deref(),
                    redactor,
                )
                .await?;
            Ok(("Authorization".to_string(), format!("Bearer {token}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bearer_header() {
        let auth = AuthDescriptor::Bearer {
            token: "tok123".into(),
        };
        let client = reqwest::Client::new();
        let cache = Arc::new(OAuthTokenCache::new());
        let redactor = gw_core::Redactor::new(Vec::<String>::new());
        let (name, value) = auth_header(&auth, "svc", &client, &cache, &redactor)
            .await
            .unwrap();
        assert_eq!(name, "Authorization");
        assert_eq!(value, "Bearer tok123");
    }

    #[tokio::test]
    async fn basic_header_encodes_userpass() {
        let auth = AuthDescriptor::Basic {
            username: "user".into(),
            password: "pass".into(),
        };
        let client = reqwest::Client::new();
        let cache = Arc::new(OAuthTokenCache::new());
        let redactor = gw_core::Redactor::new(Vec::<String>::new());
        let (name, value) = auth_header(&auth, "svc", &client, &cache, &redactor)
            .await
            .unwrap();
        assert_eq!(name, "Authorization");
        assert_eq!(value, "Basic dXNlcjpwYXNz");
    }

    #[tokio::test]
    async fn api_key_header_uses_configured_name() {
        let auth = AuthDescriptor::ApiKey {
            header: "X-Api-Key".into(),
            key: "k-1".into(),
        };
        let client = reqwest::Client::new();
        let cache = Arc::new(OAuthTokenCache::new());
        let redactor = gw_core::Redactor::new(Vec::<String>::new());
        let (name, value) = auth_header(&auth, "svc", &client, &cache, &redactor)
            .await
            .unwrap();
        assert_eq!(name, "X-Api-Key");
        assert_eq!(value, "k-1");
    }

    #[test]
    fn cached_token_unusable_within_buffer() {
        let now = Utc::now();
        let token = CachedToken {
            access_token: "a".into(),
            refresh_token: None,
            expires_at: now + chrono::Duration::seconds(60),
        };
        assert!(!token.usable(now));
    }

    #[test]
    fn cached_token_usable_well_before_expiry() {
        let now = Utc::now();
        let token = CachedToken {
            access_token: "a".into(),
            refresh_token: None,
            expires_at: now + chrono::Duration::seconds(3600),
        };
        assert!(token.usable(now));
    }
}
