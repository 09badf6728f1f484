//! Registry build-time errors (spec.md §4.2). Schema compilation failures
//! are deliberately not represented here — they demote a tool to
//! "unvalidated" rather than failing the build.

use thiserror::Error;

/// Fatal failures while assembling the tool/resource catalog.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Propagated from [`gw_core::CoreError`]: duplicate tool name, an
    /// unnameable operation, or a dangling parameter reference.
    #[error(transparent)]
    Core(#[from] gw_core::CoreError),
}
