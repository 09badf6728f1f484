//! Auth descriptors: reference-only markers; secret values live in the
//! [`Redactor`](crate::redact::Redactor), never in the model.

use serde::{Deserialize, Serialize};

/// How the executor should authenticate outgoing calls for a [`Service`](crate::Service).
///
/// Secret values are carried here because the executor needs them to build
/// headers, but they must be registered with the [`Redactor`](crate::Redactor)
/// the moment they're loaded so they never leak into logs or error strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AuthDescriptor {
    /// `Authorization: Bearer <token>`.
    Bearer {
        /// The bearer token.
        token: String,
    },
    /// `Authorization: Basic base64(user:pass)`.
    Basic {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// An arbitrary header carrying an API key.
    ApiKey {
        /// Header name to send the key under.
        header: String,
        /// The key value.
        key: String,
    },
    /// OAuth2 client-credentials flow with token caching and refresh.
    OAuth2 {
        /// Token endpoint URL.
        token_url: String,
        /// Client id.
        client_id: String,
        /// Client secret.
        client_secret: String,
        /// Optional scope string.
        #[serde(default)]
        scope: Option<String>,
    },
}

impl AuthDescriptor {
    /// Every secret substring this descriptor carries, for registration
    /// with the [`Redactor`](crate::Redactor) at load time.
    #[must_use]
    pub fn secrets(&self) -> Vec<String> {
        match self {
            Self::Bearer { token } => vec![token.clone()],
            Self::Basic { username, password } => vec![username.clone(), password.clone()],
            Self::ApiKey { key, .. } => vec![key.clone()],
            Self::OAuth2 {
                client_id,
                client_secret,
                ..
            } => vec![client_id.clone(), client_secret.clone()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_secrets_contains_token() {
        let auth = AuthDescriptor::Bearer {
            token: "sk-secret".into(),
        };
        assert_eq!(auth.secrets(), vec!["sk-secret".to_string()]);
    }

    #[test]
    fn oauth2_secrets_contains_both_ids() {
        let auth = AuthDescriptor::OAuth2 {
            token_url: "https://auth.example/token".into(),
            client_id: "client".into(),
            client_secret: "shh".into(),
            scope: None,
        };
        let secrets = auth.secrets();
        assert!(secrets.contains(&"client".to_string()));
        assert!(secrets.contains(&"shh".to_string()));
    }
}
