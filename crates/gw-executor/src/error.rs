//! Executor errors (spec.md §7, "Backend transport errors" / "Backend HTTP
//! errors"). The executor is the boundary at which backend failures become
//! MCP errors — adapters never raise at request time, only at startup.

use thiserror::Error;

/// Everything that can go wrong assembling or performing one backend call.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// A required path parameter was not supplied.
    #[error("operation `{operation}` is missing required path parameter `{name}`")]
    MissingPathParameter {
        /// Tool name of the operation.
        operation: String,
        /// The missing parameter's name.
        name: String,
    },

    /// A `dynamic_url_param` value's scheme or host differs from the
    /// service's base URL (spec.md §4.3 step 1, cross-host redirection
    /// prevention).
    #[error("operation `{operation}`: url argument `{attempted}` is not on the same host as the service base URL")]
    CrossHostUrl {
        /// Tool name of the operation.
        operation: String,
        /// The rejected URL argument.
        attempted: String,
    },

    /// No [`gw_core::model::Service`] context was registered for this
    /// operation's `service_name` (an executor wiring bug, not a user
    /// error).
    #[error("no runtime context registered for service `{0}`")]
    UnknownService(String),

    /// A GraphQL operation's composite return type requires a `selection`
    /// but the caller supplied none and no default exists.
    #[error("operation `{operation}` requires a `selection` argument for its composite return type")]
    SelectionRequired {
        /// Tool name of the operation.
        operation: String,
    },

    /// A GraphQL operation's scalar return type forbids `selection` but the
    /// caller supplied one.
    #[error("operation `{operation}` has a scalar return type and forbids a `selection` argument")]
    SelectionForbidden {
        /// Tool name of the operation.
        operation: String,
    },

    /// The `body` argument was required but missing, or present with the
    /// wrong shape for the operation's content type.
    #[error("operation `{operation}`: invalid request body: {message}")]
    InvalidBody {
        /// Tool name of the operation.
        operation: String,
        /// Human-readable detail.
        message: String,
    },

    /// The service's configured rate-limit ceiling (per minute/hour/day)
    /// was exhausted (spec.md §6, "rate-limit ceilings").
    #[error("service `{0}`: rate limit exceeded")]
    RateLimitExceeded(String),

    /// The OAuth2 client-credentials/refresh flow failed.
    #[error("service `{service}`: OAuth2 token request failed: {message}")]
    OAuth2 {
        /// Owning service name.
        service: String,
        /// Underlying error message.
        message: String,
    },

    /// A network-level failure (connection refused/reset, TLS failure,
    /// timeout) that exhausted its retry budget, or that was never
    /// eligible for retry in the first place (spec.md §4.3 step 6).
    #[error("service `{service}`: backend transport error: {message}")]
    BackendTransport {
        /// Owning service name.
        service: String,
        /// Underlying error message.
        message: String,
    },

    /// A retryable HTTP status (429, or a 5xx eligible for retry) that
    /// remained failing after the retry budget was exhausted. A
    /// non-retryable 4xx received on the single attempt it gets is *not*
    /// an error — spec.md §7's "Tool calls that succeed at the HTTP level
    /// but carry a non-2xx status are successful MCP responses" — it is
    /// returned as a normal `{status, content_type, body}` payload instead.
    #[error("service `{service}`: backend returned {status} after exhausting retries: {body}")]
    BackendHttp {
        /// Owning service name.
        service: String,
        /// The final HTTP status code.
        status: u16,
        /// Decoded response body, best-effort.
        body: serde_json::Value,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_parameter_message() {
        let err = ExecutorError::MissingPathParameter {
            operation: "petstore__getPet".into(),
            name: "id".into(),
        };
        assert!(err.to_string().contains("id"));
        assert!(err.to_string().contains("petstore__getPet"));
    }

    #[test]
    fn backend_http_message_includes_decoded_body() {
        let err = ExecutorError::BackendHttp {
            service: "petstore".into(),
            status: 500,
            body: serde_json::json!({"error": "token sk-secret leaked"}),
        };
        assert!(err.to_string().contains("sk-secret"));
        assert!(err.to_string().contains("500"));
    }
}
