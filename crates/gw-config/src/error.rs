//! Configuration errors — all fatal at startup (spec.md §7).

use thiserror::Error;

/// Errors raised while loading and expanding the gateway configuration
/// file. Every variant here corresponds to a startup-time failure; none
/// are ever surfaced at request time.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read from disk.
    #[error("failed to read config file `{path}`: {source}")]
    Io {
        /// Path that was attempted.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file's content could not be parsed as either YAML or JSON.
    #[error("failed to parse config file `{path}` as {format}: {message}")]
    Parse {
        /// Path that failed to parse.
        path: String,
        /// `"YAML"` or `"JSON"`.
        format: &'static str,
        /// Underlying parser message.
        message: String,
    },

    /// A `${VAR}` reference had no corresponding environment variable.
    #[error("unresolved environment variable reference `${{{0}}}`")]
    MissingEnvVar(String),

    /// Two API entries share the same `name`.
    #[error("duplicate API name `{0}` in configuration")]
    DuplicateApiName(String),

    /// An API entry needs a base URL (it's not derivable from its spec
    /// format, e.g. GraphQL by introspection/SDL) but none was given.
    #[error("API `{0}` requires `base_url_override`: its spec format does not supply a base URL")]
    MissingBaseUrl(String),

    /// An API entry gave neither `spec_url` nor `spec_file`, and its
    /// `spec_type` doesn't imply live discovery (e.g. gRPC reflection).
    #[error("API `{0}` must set `spec_url` or `spec_file` (or a `spec_type` implying live discovery)")]
    MissingSpecSource(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_env_var_message_includes_name() {
        let err = ConfigError::MissingEnvVar("API_TOKEN".into());
        assert!(err.to_string().contains("API_TOKEN"));
    }
}
