//! MCP protocol core (spec.md §4.4): JSON-RPC 2.0 method dispatch over the
//! catalog and executor built by `gw-registry`/`gw-executor`. Transport
//! crates (`gw-transport-http`, `gw-transport-stdio`) own framing,
//! sessions, and I/O; this crate only knows how to turn one request into
//! one reply.

#![forbid(unsafe_code)]

mod dispatch;
mod error;
mod protocol;

pub use dispatch::Dispatcher;
pub use error::McpError;
pub use protocol::{
    is_accepted_protocol_version, DispatchReply, JsonRpcErrorObject, JsonRpcErrorResponse,
    JsonRpcRequest, JsonRpcResponse, ACCEPTED_PROTOCOL_VERSIONS, PROTOCOL_VERSION,
};
