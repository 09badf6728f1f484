//! JSON-RPC 2.0 envelope types and the MCP protocol version handshake
//! (spec.md §4.4).

use serde::{Deserialize, Serialize};

/// The protocol version this server advertises in `initialize` responses.
pub const PROTOCOL_VERSION: &str = "2025-11-25";

/// Protocol versions this server still accepts on `initialize` requests,
/// in addition to [`PROTOCOL_VERSION`] itself.
pub const ACCEPTED_PROTOCOL_VERSIONS: &[&str] = &["2025-11-25", "2025-06-18", "2025-03-26"];

/// Whether `version` is one this server will negotiate `initialize` with.
#[must_use]
pub fn is_accepted_protocol_version(version: &str) -> bool {
    ACCEPTED_PROTOCOL_VERSIONS.contains(&version)
}

/// One JSON-RPC 2.0 request object, or one element of a batch.
///
/// `id` is `None` both when the field is absent and when it is JSON
/// `null`; spec.md §4.4 treats both as "this is a notification, send no
/// reply" (the distinction `serde_json::Value::Null` vs absent is not
/// meaningful to a caller and is collapsed here).
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    /// Always `"2.0"`; not enforced strictly on inbound requests.
    #[serde(default, rename = "jsonrpc")]
    pub jsonrpc: Option<String>,
    /// Method name to dispatch.
    pub method: String,
    /// Method parameters, if any.
    #[serde(default)]
    pub params: serde_json::Value,
    /// Request id; `None` (absent or `null`) marks a notification.
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: Option<serde_json::Value>,
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => None,
        other => Some(other),
    })
}

impl JsonRpcRequest {
    /// Whether this request carries no id and therefore expects no reply.
    #[must_use]
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// A successful JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    /// Always `"2.0"`.
    pub jsonrpc: &'static str,
    /// Echoes the request's id.
    pub id: serde_json::Value,
    /// The method's result value.
    pub result: serde_json::Value,
}

impl JsonRpcResponse {
    /// Build a response echoing `id` with `result`.
    #[must_use]
    pub fn new(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result,
        }
    }
}

/// A failed JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcErrorResponse {
    /// Always `"2.0"`.
    pub jsonrpc: &'static str,
    /// Echoes the request's id; `null` if the id couldn't be determined
    /// (e.g. the request body itself failed to parse).
    pub id: serde_json::Value,
    /// The error object.
    pub error: JsonRpcErrorObject,
}

/// The JSON-RPC 2.0 error object shape.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcErrorObject {
    /// Reserved or application error code.
    pub code: i64,
    /// Human-readable, redacted message.
    pub message: String,
    /// Structured detail (spec.md §7: "with the decoded body attached"),
    /// redacted the same as `message`. Omitted entirely when there is none
    /// to carry, rather than serialized as `null`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcErrorResponse {
    /// Build an error response for `id` (pass `Value::Null` when the id is
    /// unknown) from an [`crate::error::McpError`], redacting its message.
    #[must_use]
    pub fn from_error(
        id: serde_json::Value,
        error: &crate::error::McpError,
        redactor: &gw_core::Redactor,
    ) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            error: JsonRpcErrorObject {
                code: error.code(),
                message: error.redacted_message(redactor),
                data: error.redacted_data(redactor),
            },
        }
    }
}

/// Either a single reply or nothing (for notifications), as produced by
/// dispatching one [`JsonRpcRequest`].
pub enum DispatchReply {
    /// A successful result.
    Result(JsonRpcResponse),
    /// A failure.
    Error(JsonRpcErrorResponse),
    /// No reply — the request was a notification.
    None,
}

impl DispatchReply {
    /// Serialize this reply to a JSON value, if it produces one.
    #[must_use]
    pub fn into_json(self) -> Option<serde_json::Value> {
        match self {
            Self::Result(r) => serde_json::to_value(r).ok(),
            Self::Error(e) => serde_json::to_value(e).ok(),
            Self::None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_current_and_legacy_protocol_versions() {
        assert!(is_accepted_protocol_version("2025-11-25"));
        assert!(is_accepted_protocol_version("2025-06-18"));
        assert!(is_accepted_protocol_version("2025-03-26"));
        assert!(!is_accepted_protocol_version("2024-01-01"));
    }

    #[test]
    fn null_id_is_treated_as_notification() {
        let request: JsonRpcRequest =
            serde_json::from_value(serde_json::json!({"method": "ping", "id": null})).unwrap();
        assert!(request.is_notification());
    }

    #[test]
    fn absent_id_is_treated_as_notification() {
        let request: JsonRpcRequest =
            serde_json::from_value(serde_json::json!({"method": "ping"})).unwrap();
        assert!(request.is_notification());
    }

    #[test]
    fn present_id_is_not_a_notification() {
        let request: JsonRpcRequest =
            serde_json::from_value(serde_json::json!({"method": "ping", "id": 1})).unwrap();
        assert!(!request.is_notification());
    }
}
