//! Streamable-HTTP MCP transport (spec.md §4.5): a single `/mcp` endpoint
//! handling JSON-RPC requests, SSE event streams, and session lifecycle.
//! Protocol dispatch itself lives in `gw-mcp`; this crate owns sessions,
//! framing, and HTTP-specific failure semantics.

#![forbid(unsafe_code)]

mod error;
mod handlers;
mod state;
mod sweeper;

pub use error::TransportError;
pub use handlers::router;
pub use state::{AppState, SessionStore, DEFAULT_IDLE_CEILING_SECONDS};
pub use sweeper::run as run_sweeper;
