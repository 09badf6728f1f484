//! JSON-RPC error codes (spec.md §4.4, §7, "Protocol errors").

use thiserror::Error;

/// Every way a dispatched JSON-RPC call can fail, tagged with the wire
/// error code spec.md §4.4/§7 assigns it.
#[derive(Debug, Error)]
pub enum McpError {
    /// The request body was not valid JSON.
    #[error("parse error: {0}")]
    ParseError(String),

    /// The request was valid JSON but not a legal JSON-RPC 2.0 request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// `method` named something this server doesn't implement.
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// `params` failed validation against the target tool's schema, or was
    /// otherwise the wrong shape for the method.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// Everything else: backend transport/HTTP failures after retry
    /// exhaustion, unknown tool/resource lookups, internal wiring errors.
    #[error("internal error: {message}")]
    Internal {
        /// Human-readable detail.
        message: String,
        /// Structured detail carried alongside `message` into the JSON-RPC
        /// error object's `data` field — currently only populated from
        /// `ExecutorError::BackendHttp`'s decoded response body (spec.md
        /// §7: "surfaced as errors... with the decoded body attached").
        /// Scrubbed by [`Redactor::scrub_json`](gw_core::Redactor::scrub_json)
        /// the same as `message` is scrubbed by `scrub`.
        data: Option<serde_json::Value>,
    },
}

impl McpError {
    /// The JSON-RPC 2.0 reserved error code for this variant (spec.md
    /// §4.4: "-32700"/"-32601"/"-32602"; §7: validation and backend
    /// failures both surface as "-32000").
    #[must_use]
    pub fn code(&self) -> i64 {
        match self {
            Self::ParseError(_) => -32700,
            Self::InvalidRequest(_) => -32600,
            Self::MethodNotFound(_) => -32601,
            Self::InvalidParams(_) => -32602,
            Self::Internal { .. } => -32000,
        }
    }

    /// The redacted message this error's `message` field should carry.
    #[must_use]
    pub fn redacted_message(&self, redactor: &gw_core::Redactor) -> String {
        redactor.scrub(&self.to_string())
    }

    /// The redacted structured detail this error's `data` field should
    /// carry, if any (spec.md §7, "with the decoded body attached").
    #[must_use]
    pub fn redacted_data(&self, redactor: &gw_core::Redactor) -> Option<serde_json::Value> {
        match self {
            Self::Internal { data: Some(data), .. } => Some(redactor.scrub_json(data)),
            _ => None,
        }
    }
}

impl From<gw_executor::ExecutorError> for McpError {
    fn from(err: gw_executor::ExecutorError) -> Self {
        let data = match &err {
            gw_executor::ExecutorError::BackendHttp { body, .. } => Some(body.clone()),
            _ => None,
        };
        Self::Internal {
            message: err.to_string(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_code_is_32700() {
        assert_eq!(McpError::ParseError("bad".into()).code(), -32700);
    }

    #[test]
    fn method_not_found_code_is_32601() {
        assert_eq!(McpError::MethodNotFound("foo".into()).code(), -32601);
    }

    #[test]
    fn invalid_params_code_is_32602() {
        assert_eq!(McpError::InvalidParams("bad".into()).code(), -32602);
    }

    #[test]
    fn internal_code_is_32000() {
        let err = McpError::Internal {
            message: "boom".into(),
            data: None,
        };
        assert_eq!(err.code(), -32000);
    }

    #[test]
    fn redacted_message_scrubs_secrets() {
        let redactor = gw_core::Redactor::new(["sk-secret".to_string()]);
        let err = McpError::Internal {
            message: "token sk-secret leaked".into(),
            data: None,
        };
        assert_eq!(err.redacted_message(&redactor), "internal error: token *** leaked");
    }

    #[test]
    fn backend_http_error_carries_redacted_body_as_data() {
        let redactor = gw_core::Redactor::new(["sk-secret".to_string()]);
        let executor_err = gw_executor::ExecutorError::BackendHttp {
            service: "petstore".into(),
            status: 500,
            body: serde_json::json!({"error": "token sk-secret leaked"}),
        };
        let mcp_err = McpError::from(executor_err);

        let message = mcp_err.redacted_message(&redactor);
        assert!(message.contains("***"));
        assert!(!message.contains("sk-secret"));

        let data = mcp_err.redacted_data(&redactor).expect("BackendHttp body becomes `data`");
        assert_eq!(data, serde_json::json!({"error": "token *** leaked"}));
    }

    #[test]
    fn non_backend_http_errors_carry_no_data() {
        let redactor = gw_core::Redactor::new(Vec::<String>::new());
        let executor_err = gw_executor::ExecutorError::UnknownService("petstore".into());
        let mcp_err = McpError::from(executor_err);
        assert!(mcp_err.redacted_data(&redactor).is_none());
    }
}
