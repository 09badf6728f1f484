//! Configuration loading and `${VAR}` environment expansion (spec.md §4.7 /
//! §6, "Configuration file").
//!
//! The top-level entry point is [`load_file`], which auto-detects YAML vs
//! JSON by the first non-whitespace byte, expands every `${VAR}` reference
//! against the process environment, and deserializes into [`GatewayConfig`].
//! Any failure here — malformed document, unresolved env var, missing
//! required field — is fatal at startup, never deferred to request time.

#![forbid(unsafe_code)]

mod env_expand;
mod error;
mod loader;
mod model;

pub use env_expand::expand_env;
pub use error::ConfigError;
pub use loader::load_file;
pub use model::{
    ApiConfig, AuthConfig, GatewayConfig, JenkinsConfig, OptimizationConfig, RateLimits,
};
