//! Spec-ingestion errors — all fatal at startup, reported with the owning
//! API's name (spec.md §7, "Spec-parse errors").

use thiserror::Error;

/// Everything that can go wrong turning one `apis[]` configuration entry
/// into a [`gw_core::Service`](gw_core::Service).
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Fetching the spec (HTTP or local file) failed.
    #[error("api `{api}`: failed to fetch spec from `{source_label}`: {message}")]
    Fetch {
        /// Owning API name.
        api: String,
        /// URL or path that was attempted.
        source_label: String,
        /// Underlying error message.
        message: String,
    },

    /// No adapter's `Detect` matched the fetched bytes.
    #[error("api `{api}`: could not auto-detect spec format (no adapter matched)")]
    UndetectableFormat {
        /// Owning API name.
        api: String,
    },

    /// The bytes matched a format but failed to parse as that format.
    #[error("api `{api}`: failed to parse as {format}: {message}")]
    Parse {
        /// Owning API name.
        api: String,
        /// The format that was attempted (e.g. `"OpenAPI 3"`).
        format: &'static str,
        /// Underlying parser message.
        message: String,
    },

    /// A required base URL could not be derived from the spec and no
    /// `base_url_override` was configured.
    #[error("api `{api}` requires `base_url_override`: its spec format does not supply a base URL")]
    MissingBaseUrl {
        /// Owning API name.
        api: String,
    },

    /// gRPC reflection against the live server failed.
    #[error("api `{api}`: gRPC reflection failed: {message}")]
    Reflection {
        /// Owning API name.
        api: String,
        /// Underlying error message.
        message: String,
    },

    /// Propagated from [`gw_core::CoreError`] while assembling the
    /// canonical model (e.g. a dangling parameter reference).
    #[error("api `{api}`: {source}")]
    Core {
        /// Owning API name.
        api: String,
        /// Underlying core error.
        #[source]
        source: gw_core::CoreError,
    },
}
