//! Deserialized shape of the configuration file (spec.md §6, "Configuration
//! file"; spec.md §4.7 in SPEC_FULL.md).
//!
//! These structs are the direct `serde` target of the YAML/JSON document;
//! `gw-adapters` and `gw-executor` consume them to build the canonical
//! [`gw_core::Service`] model and the executor's per-service auth/rate-limit
//! state respectively.

use serde::{Deserialize, Serialize};

fn default_timeout_seconds() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_max_response_bytes() -> usize {
    51_200
}

/// Top-level configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// One entry per backend API. An empty array is valid and results in an
    /// empty tool registry.
    pub apis: Vec<ApiConfig>,

    /// Default per-backend-call timeout, in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Default retry ceiling. `0` means one attempt total (no retries).
    #[serde(default)]
    pub retries: u32,

    /// Whether the (external, out-of-scope) script-submission endpoint is
    /// exposed. Carried here because it is a top-level config key even
    /// though its implementation lives outside this crate's scope.
    #[serde(default = "default_true")]
    pub enable_code_execution: bool,

    /// Response bodies larger than this are truncated with a
    /// `truncated: true` marker.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            apis: Vec::new(),
            timeout_seconds: default_timeout_seconds(),
            retries: 0,
            enable_code_execution: true,
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

/// One `apis[]` entry: everything needed to ingest and run one backend API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Unique name; becomes the `service_name` prefix of every tool.
    pub name: String,

    /// HTTP(S) URL or local path to fetch the spec from.
    #[serde(default)]
    pub spec_url: Option<String>,

    /// Local file path to the spec, as an alternative to `spec_url`.
    #[serde(default)]
    pub spec_file: Option<String>,

    /// Explicit format override, bypassing auto-detection. Also used to
    /// select hand-written adapters (`jenkins`, `slack`, `jira`) and
    /// live-discovery protocols (`grpc`) that have no fetchable spec file.
    #[serde(default)]
    pub spec_type: Option<String>,

    /// Overrides the base URL derived from the spec (mandatory for formats
    /// that don't carry one, e.g. GraphQL by introspection/SDL).
    #[serde(default)]
    pub base_url_override: Option<String>,

    /// Auth descriptor for this service.
    #[serde(default)]
    pub auth: Option<AuthConfig>,

    /// Per-API timeout override, in seconds.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    /// Per-API retry ceiling override.
    #[serde(default)]
    pub retries: Option<u32>,

    /// Jenkins-specific write-operation allowlist.
    #[serde(default)]
    pub jenkins: Option<JenkinsConfig>,

    /// OData/REST CRUD-grouping toggle.
    #[serde(default)]
    pub optimization: OptimizationConfig,

    /// Rate-limit ceilings (requests per minute/hour/day; `0` = unlimited).
    #[serde(default)]
    pub rate_limits: RateLimits,
}

/// How the executor authenticates outgoing calls for one service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AuthConfig {
    /// `Authorization: Bearer <token>`.
    Bearer {
        /// The bearer token.
        token: String,
    },
    /// HTTP Basic auth.
    Basic {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// An arbitrary header carrying an API key.
    ApiKey {
        /// Header name to send the key under.
        header: String,
        /// The key value.
        key: String,
    },
    /// OAuth2 client-credentials flow.
    Oauth2 {
        /// Token endpoint URL.
        token_url: String,
        /// Client id.
        client_id: String,
        /// Client secret.
        client_secret: String,
        /// Optional scope string.
        #[serde(default)]
        scope: Option<String>,
    },
}

impl AuthConfig {
    /// Convert into the canonical [`gw_core::AuthDescriptor`] carried on the
    /// built [`gw_core::Service`].
    #[must_use]
    pub fn into_descriptor(self) -> gw_core::AuthDescriptor {
        match self {
            Self::Bearer { token } => gw_core::AuthDescriptor::Bearer { token },
            Self::Basic { username, password } => {
                gw_core::AuthDescriptor::Basic { username, password }
            }
            Self::ApiKey { header, key } => gw_core::AuthDescriptor::ApiKey { header, key },
            Self::Oauth2 {
                token_url,
                client_id,
                client_secret,
                scope,
            } => gw_core::AuthDescriptor::OAuth2 {
                token_url,
                client_id,
                client_secret,
                scope,
            },
        }
    }

    /// Every secret substring this config carries, for registration with
    /// the process-wide [`gw_core::Redactor`] at load time.
    #[must_use]
    pub fn secrets(&self) -> Vec<String> {
        match self {
            Self::Bearer { token } => vec![token.clone()],
            Self::Basic { username, password } => vec![username.clone(), password.clone()],
            Self::ApiKey { key, .. } => vec![key.clone()],
            Self::Oauth2 {
                client_id,
                client_secret,
                ..
            } => vec![client_id.clone(), client_secret.clone()],
        }
    }
}

/// Jenkins-adapter-specific configuration (spec.md §4.1, "Jenkins").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JenkinsConfig {
    /// Names of write operations to enable; an empty list enables none of
    /// the 34 write operations (only the read-path graph is exposed).
    #[serde(default)]
    pub allow_writes: Vec<String>,
}

/// REST/OData CRUD-grouping toggle (spec.md §6, `optimization.enable_crud_grouping`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationConfig {
    /// When true (the default), OData EntitySets and similar CRUD-shaped
    /// resources are grouped into one bundle of list/get/create/update/
    /// delete operations rather than emitted as independent operations.
    #[serde(default = "default_true")]
    pub enable_crud_grouping: bool,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            enable_crud_grouping: true,
        }
    }
}

/// Rate-limit ceilings; `0` means unlimited (spec.md §6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateLimits {
    /// Requests per minute, 0 = unlimited.
    #[serde(default)]
    pub per_minute: u32,
    /// Requests per hour, 0 = unlimited.
    #[serde(default)]
    pub per_hour: u32,
    /// Requests per day, 0 = unlimited.
    #[serde(default)]
    pub per_day: u32,
}
