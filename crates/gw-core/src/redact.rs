//! Secret-substring scrubbing for logs and error strings (spec.md §4, "Redaction").
//!
//! A single [`Redactor`] is built once from the loaded configuration and
//! shared (behind an `Arc`) across the executor, registry, and transports.
//! Every string handed back to a client or written to a log line passes
//! through [`Redactor::scrub`] first.

use std::collections::HashSet;
use std::sync::RwLock;

/// Scrubs registered secret substrings out of arbitrary text, replacing
/// each occurrence with `***`.
///
/// New secrets (e.g. an OAuth2 access token minted at runtime) can be
/// registered after construction via [`Redactor::register`]; scrubbing
/// itself takes a read lock so concurrent requests never block each other.
#[derive(Debug, Default)]
pub struct Redactor {
    secrets: RwLock<HashSet<String>>,
}

impl Redactor {
    /// Build a redactor seeded with the given secrets (typically every
    /// `AuthDescriptor::secrets()` collected at config-load time).
    #[must_use]
    pub fn new(seed: impl IntoIterator<Item = String>) -> Self {
        let mut secrets = HashSet::new();
        for s in seed {
            if !s.is_empty() {
                secrets.insert(s);
            }
        }
        Self {
            secrets: RwLock::new(secrets),
        }
    }

    /// Register an additional secret (e.g. a freshly-minted OAuth2 access
    /// token) for scrubbing in all subsequent calls.
    pub fn register(&self, secret: impl Into<String>) {
        let secret = secret.into();
        if secret.is_empty() {
            return;
        }
        self.secrets
            .write()
            .expect("redactor lock poisoned")
            .insert(secret);
    }

    /// Recursively scrub every string found inside a JSON value — used for
    /// the decoded backend body attached to a `BackendHttp` error (spec.md
    /// §7: "surfaced as errors... with the decoded body attached"), which
    /// must be scrubbed exactly as a log line or error string would be.
    #[must_use]
    pub fn scrub_json(&self, value: &serde_json::Value) -> serde_json::Value {
        match value {
            serde_json::Value::String(s) => serde_json::Value::String(self.scrub(s)),
            serde_json::Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(|v| self.scrub_json(v)).collect())
            }
            serde_json::Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.scrub_json(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Replace every occurrence of a registered secret in `text` with `***`.
    #[must_use]
    pub fn scrub(&self, text: &str) -> String {
        let secrets = self.secrets.read().expect("redactor lock poisoned");
        let mut out = text.to_string();
        // Longest-first so a secret that is a substring of another is not
        // partially scrubbed before the longer match runs.
        let mut ordered: Vec<&String> = secrets.iter().collect();
        ordered.sort_by_key(|s| std::cmp::Reverse(s.len()));
        for secret in ordered {
            if !secret.is_empty() && out.contains(secret.as_str()) {
                out = out.replace(secret.as_str(), "***");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrubs_registered_secret() {
        let r = Redactor::new(["sk-secret".to_string()]);
        assert_eq!(r.scrub("token=sk-secret end"), "token=*** end");
    }

    #[test]
    fn leaves_unrelated_text_untouched() {
        let r = Redactor::new(["sk-secret".to_string()]);
        assert_eq!(r.scrub("hello world"), "hello world");
    }

    #[test]
    fn register_adds_runtime_secret() {
        let r = Redactor::new([]);
        assert_eq!(r.scrub("abc123"), "abc123");
        r.register("abc123");
        assert_eq!(r.scrub("abc123"), "***");
    }

    #[test]
    fn empty_secret_is_never_registered() {
        let r = Redactor::new(["".to_string()]);
        assert_eq!(r.scrub("anything"), "anything");
    }

    #[test]
    fn longer_secret_scrubbed_before_substring() {
        let r = Redactor::new(["ab".to_string(), "abcdef".to_string()]);
        assert_eq!(r.scrub("abcdef"), "***");
    }

    #[test]
    fn scrub_json_walks_nested_strings() {
        let r = Redactor::new(["sk-secret".to_string()]);
        let value = serde_json::json!({
            "error": "token sk-secret leaked",
            "details": ["sk-secret", {"inner": "sk-secret here"}],
            "status": 500,
        });
        let scrubbed = r.scrub_json(&value);
        assert_eq!(
            scrubbed,
            serde_json::json!({
                "error": "token *** leaked",
                "details": ["***", {"inner": "*** here"}],
                "status": 500,
            })
        );
    }
}
