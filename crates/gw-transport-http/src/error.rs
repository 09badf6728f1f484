//! Transport-level (HTTP status code) failures (spec.md §4.5, "Failure
//! semantics"). Distinct from [`gw_mcp::McpError`], which surfaces as a
//! JSON-RPC error object within a 200 response body instead.

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

/// A failure that short-circuits request handling before dispatch, mapped
/// straight to an HTTP status rather than a JSON-RPC error object.
#[derive(Debug)]
pub enum TransportError {
    /// A request that requires a session carried none.
    MissingSession,
    /// `Mcp-Session-Id` named a session that doesn't exist (or has been
    /// terminated/swept).
    UnknownSession,
    /// Malformed preflight conditions: bad `Accept`, unrecognized
    /// `Mcp-Protocol-Version`, or unparseable JSON body.
    BadRequest(String),
    /// The inbound bearer token was missing or didn't match.
    AuthFailed,
    /// Request body exceeded the 10 MiB ceiling (spec.md §5, "Resource
    /// ceilings"; §8, "A request body ≥ 10 MiB returns 413").
    PayloadTooLarge,
}

impl IntoResponse for TransportError {
    fn into_response(self) -> Response {
        match self {
            Self::MissingSession => {
                (StatusCode::BAD_REQUEST, "Mcp-Session-Id header is required").into_response()
            }
            Self::UnknownSession => (StatusCode::NOT_FOUND, "unknown session").into_response(),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            Self::AuthFailed => {
                let mut response = (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", HeaderValue::from_static("Bearer"));
                response
            }
            Self::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, "request body exceeds the size limit").into_response()
            }
        }
    }
}
