//! Core data-model errors — duplicate names, malformed schema fragments.

use thiserror::Error;

/// Errors raised while building or validating the canonical model.
///
/// These are configuration-time errors: spec.md's invariant is that a
/// duplicate `tool_name` or an unnameable operation is a fatal startup
/// failure, never a request-time one.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Two operations (possibly from different services) resolved to the
    /// same `tool_name`.
    #[error("duplicate tool name `{0}`: tool names must be unique across the process")]
    DuplicateToolName(String),

    /// An operation could not be assigned an identifier (no `id` and no
    /// method/path to derive one from).
    #[error("operation in service `{service}` has no id and no method/path to derive one from")]
    UnnameableOperation {
        /// Name of the owning service.
        service: String,
    },

    /// A `dynamic_url_param` or `query_params_object` referenced a
    /// parameter name that isn't declared on the operation.
    #[error("operation `{operation}` references unknown parameter `{param}`")]
    UnknownParameterReference {
        /// Tool name of the operation.
        operation: String,
        /// The dangling parameter name.
        param: String,
    },
}
