//! `/mcp` request handlers (spec.md §4.5, "Streamable-HTTP Transport").
//!
//! A single endpoint carries all three verbs: `POST` for JSON-RPC
//! requests/notifications/batches, `GET` to open an SSE stream, and
//! `DELETE` to terminate a session. `OPTIONS` answers CORS preflight.

use std::convert::Infallible;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use futures_util::stream::{self, Stream, StreamExt};
use gw_core::session::SessionId;
use gw_mcp::JsonRpcRequest;

use crate::error::TransportError;
use crate::state::AppState;

/// Request bodies are capped at this size; anything larger is rejected
/// with `413 Payload Too Large` (spec.md §5, "Resource ceilings").
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

const HEADER_SESSION_ID: &str = "Mcp-Session-Id";
const HEADER_PROTOCOL_VERSION: &str = "Mcp-Protocol-Version";
const HEADER_LAST_EVENT_ID: &str = "Last-Event-ID";

/// Build the router exposing the single `/mcp` endpoint.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/mcp", post(post_mcp).get(get_mcp).delete(delete_mcp).options(options_mcp))
        .with_state(state)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn session_id_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    header_str(headers, HEADER_SESSION_ID).map(|s| SessionId(s.to_string()))
}

fn accepts(headers: &HeaderMap, media_type: &str) -> bool {
    match header_str(headers, "accept") {
        Some(accept) => accept.contains(media_type) || accept.contains("*/*"),
        None => false,
    }
}

fn validate_protocol_version(headers: &HeaderMap) -> Result<(), TransportError> {
    match header_str(headers, HEADER_PROTOCOL_VERSION) {
        Some(version) if !gw_mcp::is_accepted_protocol_version(version) => Err(
            TransportError::BadRequest(format!("unsupported {HEADER_PROTOCOL_VERSION} `{version}`")),
        ),
        _ => Ok(()),
    }
}

fn check_inbound_auth(state: &AppState, headers: &HeaderMap) -> Result<(), TransportError> {
    let Some(expected) = &state.inbound_bearer_token else {
        return Ok(());
    };
    let presented = header_str(headers, "authorization").and_then(|v| v.strip_prefix("Bearer "));
    if presented == Some(expected.as_str()) {
        Ok(())
    } else {
        Err(TransportError::AuthFailed)
    }
}

/// Set the CORS response headers, echoing the request's `Origin` back
/// verbatim on every response (spec.md §4.5: "Non-preflight responses echo
/// the request's Origin"). Falls back to `*` when the request carried no
/// `Origin` header at all (e.g. a same-origin or non-browser client).
fn cors_headers(request_headers: &HeaderMap, response: &mut Response) {
    let origin = request_headers
        .get("origin")
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("*"));
    let headers = response.headers_mut();
    headers.insert("Access-Control-Allow-Origin", origin);
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET, POST, DELETE, OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type, Mcp-Session-Id, Mcp-Protocol-Version, Last-Event-ID, Authorization"),
    );
    headers.insert(
        "Access-Control-Expose-Headers",
        HeaderValue::from_static("Mcp-Session-Id"),
    );
}

/// `OPTIONS /mcp` — CORS preflight (spec.md §4.5).
pub async fn options_mcp(headers: HeaderMap) -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    cors_headers(&headers, &mut response);
    response
}

/// `POST /mcp` — submit one JSON-RPC request, notification, or batch.
///
/// `initialize` is the only method allowed without an existing
/// `Mcp-Session-Id`; it creates one and returns it in the response
/// header. Every other method on a fresh connection must carry a
/// session id naming an already-initialized session.
pub async fn post_mcp(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Response, TransportError> {
    check_inbound_auth(&state, &headers)?;

    if !accepts(&headers, "application/json") && !accepts(&headers, "text/event-stream") {
        return Err(TransportError::BadRequest(
            "Accept header must include application/json or text/event-stream".to_string(),
        ));
    }
    validate_protocol_version(&headers)?;

    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| TransportError::PayloadTooLarge)?;

    let value: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| TransportError::BadRequest(format!("invalid JSON: {e}")))?;

    let requests = parse_requests(value)?;
    let is_initialize = requests.len() == 1 && requests[0].method == "initialize";

    let session_id = match session_id_from_headers(&headers) {
        Some(id) => {
            if !state.sessions.contains(&id).await {
                return Err(TransportError::UnknownSession);
            }
            id
        }
        None => {
            if !is_initialize {
                return Err(TransportError::MissingSession);
            }
            state.sessions.create(None).await
        }
    };

    let mut replies = Vec::with_capacity(requests.len());
    for request in requests {
        let reply = state.dispatcher.dispatch(session_id.0.as_str(), request).await;
        if let Some(json) = reply.into_json() {
            replies.push(json);
        }
    }

    let mut response = if replies.is_empty() {
        StatusCode::ACCEPTED.into_response()
    } else if replies.len() == 1 {
        axum::Json(replies.into_iter().next().unwrap()).into_response()
    } else {
        axum::Json(replies).into_response()
    };

    response.headers_mut().insert(
        HeaderName::from_static("mcp-session-id"),
        HeaderValue::from_str(&session_id.0).expect("session ids are hex ascii"),
    );
    cors_headers(&headers, &mut response);
    Ok(response)
}

fn parse_requests(value: serde_json::Value) -> Result<Vec<JsonRpcRequest>, TransportError> {
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| {
                serde_json::from_value(item)
                    .map_err(|e| TransportError::BadRequest(format!("invalid batch entry: {e}")))
            })
            .collect(),
        other => serde_json::from_value(other)
            .map(|request| vec![request])
            .map_err(|e| TransportError::BadRequest(format!("invalid JSON-RPC request: {e}"))),
    }
}

/// `GET /mcp` — open an SSE stream for server-initiated events, replaying
/// anything buffered since `Last-Event-ID` (spec.md §4.5, "Resumability").
pub async fn get_mcp(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, TransportError> {
    check_inbound_auth(&state, &headers)?;

    if !accepts(&headers, "text/event-stream") {
        return Err(TransportError::BadRequest(
            "Accept header must include text/event-stream".to_string(),
        ));
    }

    let session_id = session_id_from_headers(&headers).ok_or(TransportError::MissingSession)?;
    if !state.sessions.contains(&session_id).await {
        return Err(TransportError::UnknownSession);
    }

    let backlog = if let Some(last_event_id) = header_str(&headers, HEADER_LAST_EVENT_ID) {
        let after: u64 = last_event_id.parse().unwrap_or(0);
        let slot = state
            .sessions
            .touch(&session_id)
            .await
            .ok_or(TransportError::UnknownSession)?;
        let guard = slot.lock().await;
        guard.session.events.replay_after(after)
    } else {
        Vec::new()
    };

    let live = state
        .sessions
        .attach_stream(&session_id)
        .await
        .ok_or(TransportError::UnknownSession)?;

    let backlog_events = stream::iter(backlog.into_iter().map(|event| {
        Ok::<_, Infallible>(
            Event::default()
                .id(event.counter.to_string())
                .data(event.data),
        )
    }));
    let live_events = tokio_stream::wrappers::ReceiverStream::new(live).map(|data| {
        Ok::<_, Infallible>(Event::default().data(data))
    });

    let combined: std::pin::Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>> =
        Box::pin(backlog_events.chain(live_events));

    let mut response = Sse::new(combined)
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
        .into_response();
    cors_headers(&headers, &mut response);
    Ok(response)
}

/// `DELETE /mcp` — terminate a session (spec.md §4.5).
pub async fn delete_mcp(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, TransportError> {
    check_inbound_auth(&state, &headers)?;
    let session_id = session_id_from_headers(&headers).ok_or(TransportError::MissingSession)?;
    if !state.sessions.remove(&session_id).await {
        return Err(TransportError::UnknownSession);
    }
    let mut response = StatusCode::NO_CONTENT.into_response();
    cors_headers(&headers, &mut response);
    Ok(response)
}
