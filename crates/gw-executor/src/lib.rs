//! Runtime request executor (spec.md §4.3).
//!
//! Turns a catalog [`gw_core::model::Operation`] plus caller-supplied
//! arguments into one outgoing backend request, and the backend's raw
//! response back into the fixed `{status, content_type, body}` shape every
//! MCP tool call returns. Each concern lives in its own module so it can be
//! tested in isolation; [`Executor`] is the only thing that wires them
//! together in request order.

#![forbid(unsafe_code)]

mod auth;
mod body;
mod crumb;
mod error;
mod executor;
mod query;
mod ratelimit;
mod response;
mod retry;
mod url_resolve;
mod xml;

pub use auth::OAuthTokenCache;
pub use error::ExecutorError;
pub use executor::{Executor, ServiceContext};
pub use ratelimit::RateLimitConfig;
pub use response::ExecutorResponse;
