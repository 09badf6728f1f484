//! The canonical `Service`/`Operation` model every protocol adapter targets.
//!
//! Operations carry a small fixed set of optional structured fields rather
//! than a one-of-per-protocol variant (spec.md §9, "Heterogeneous Operation
//! shape"): the executor sees one `Operation` type and branches on presence
//! of fields to choose its assembly path.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::auth::AuthDescriptor;

/// Where a [`Parameter`] is carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// Substituted into the URL path template.
    Path,
    /// Appended to the query string.
    Query,
    /// Sent as an HTTP header.
    Header,
}

/// One named, typed input to an [`Operation`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    /// Wire name (and input-schema property name).
    pub name: String,
    /// Where the value is carried.
    pub location: ParameterLocation,
    /// Whether a value must be supplied.
    pub required: bool,
    /// JSON Schema fragment describing the value's shape.
    pub schema: serde_json::Value,
}

impl Parameter {
    /// Construct a required string parameter — the common case for path
    /// segments and simple query filters.
    #[must_use]
    pub fn required_string(name: impl Into<String>, location: ParameterLocation) -> Self {
        Self {
            name: name.into(),
            location,
            required: true,
            schema: serde_json::json!({ "type": "string" }),
        }
    }

    /// Construct an optional parameter with an arbitrary schema fragment.
    #[must_use]
    pub fn optional(
        name: impl Into<String>,
        location: ParameterLocation,
        schema: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            location,
            required: false,
            schema,
        }
    }
}

/// An optional JSON or raw request body on an [`Operation`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBody {
    /// MIME content type, e.g. `application/json` or `text/xml`.
    pub content_type: String,
    /// Whether the body must be supplied.
    pub required: bool,
    /// JSON Schema fragment for `application/json` bodies; for any other
    /// content type the `body` argument is accepted as a raw string and
    /// this schema is informational only (`{"type": "string"}`).
    pub schema: serde_json::Value,
}

/// GraphQL-specific operation metadata (spec.md §4.1, GraphQL normalization).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum GraphQlOperationType {
    /// A `Query` root field.
    Query,
    /// A `Mutation` root field.
    Mutation,
}

/// Everything the executor needs to assemble a GraphQL request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQlDescriptor {
    /// `Query` or `Mutation`.
    pub operation_type: GraphQlOperationType,
    /// The root field name, e.g. `listPets`.
    pub field_name: String,
    /// Argument name -> GraphQL type string (e.g. `"ID!"`), so variables
    /// can be typed at query-assembly time.
    pub arg_types: BTreeMap<String, String>,
    /// True when the return type is a composite (object/interface/union)
    /// and a selection set is mandatory.
    pub requires_selection: bool,
    /// Safe scalar projection used when the caller doesn't supply
    /// `selection`; `None` for scalar return types (which forbid
    /// `selection` entirely).
    pub default_selection: Option<String>,
}

/// SOAP-specific operation metadata (spec.md §4.1, WSDL/SOAP normalization).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoapDescriptor {
    /// Target namespace the envelope's operation element is qualified with.
    pub namespace: String,
}

/// The transport-level verb/semantics of an [`Operation`].
///
/// This is the one place the model branches per protocol; everything else
/// (parameters, request body, headers) is shared structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Transport {
    /// A plain HTTP call: method + path template (e.g. `/pets/{id}`).
    Http {
        /// HTTP method, upper-case (`GET`, `POST`, ...).
        method: String,
        /// Path template with `{name}` placeholders for path parameters.
        path_template: String,
    },
    /// A SOAP call: always `POST text/xml` to the service base URL, with
    /// an envelope built from the operation name and namespace.
    Soap(SoapDescriptor),
    /// A GraphQL root field invocation.
    GraphQl(GraphQlDescriptor),
    /// An OpenRPC/JSON-RPC method call against the service's single
    /// endpoint.
    JsonRpc {
        /// The `method` field of the JSON-RPC request.
        method: String,
    },
    /// A unary gRPC call resolved via reflection.
    Grpc {
        /// Fully-qualified gRPC service name.
        service: String,
        /// Method name within the service.
        method: String,
    },
}

/// The unit of invocation: one backend operation, normalized from whatever
/// protocol it was described in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    /// Name of the owning [`Service`].
    pub service_name: String,
    /// Spec-local identifier (e.g. OpenAPI `operationId`).
    pub id: String,
    /// Deterministic MCP-facing name: `{service_name}__{id}`.
    pub tool_name: String,
    /// Transport verb/semantics.
    pub transport: Transport,
    /// Ordered parameters (path/query/header).
    pub parameters: Vec<Parameter>,
    /// Optional request body.
    pub request_body: Option<RequestBody>,
    /// Best-effort description of the success response body.
    pub response_schema: Option<serde_json::Value>,
    /// Headers forced on every call for this operation (e.g. `SOAPAction`).
    pub static_headers: BTreeMap<String, String>,
    /// Name of a parameter whose value, if supplied, becomes the request
    /// URL outright (Jenkins `url`). Constrained at call time to the same
    /// host as the service base URL.
    pub dynamic_url_param: Option<String>,
    /// Name of a parameter whose object value flattens to query-string
    /// entries (Jenkins `buildWithParameters`).
    pub query_params_object: Option<String>,
    /// Whether the executor must attach a CSRF crumb header before
    /// sending this request.
    pub requires_crumb: bool,
    /// Composed JSON Schema for the tool's full argument object.
    pub input_schema: serde_json::Value,
    /// Human-readable one-line summary, used to build the Tool description.
    pub summary: Option<String>,
}

impl Operation {
    /// At most one of `dynamic_url_param` / `query_params_object` should be
    /// consulted per call (spec.md §3 invariant). This doesn't forbid both
    /// being configured — only that the executor picks `dynamic_url_param`
    /// first when a value for it is actually supplied.
    #[must_use]
    pub fn uses_dynamic_url(&self, args: &serde_json::Map<String, serde_json::Value>) -> bool {
        self.dynamic_url_param
            .as_ref()
            .is_some_and(|name| args.contains_key(name))
    }
}

/// A named container for one backend API: base URL, operations, auth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    /// Unique service name (from configuration).
    pub name: String,
    /// Resolved base URL (from the spec, or overridden by configuration).
    pub base_url: String,
    /// Ordered operations exposed by this service.
    pub operations: Vec<Operation>,
    /// Auth descriptor reference; secret values live only in the
    /// redactor's scrub set, never here.
    pub auth: Option<AuthDescriptor>,
}

impl Service {
    /// Construct an empty service ready to have operations pushed onto it.
    #[must_use]
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            operations: Vec::new(),
            auth: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_dynamic_url_only_when_arg_present() {
        let op = Operation {
            service_name: "jenkins".into(),
            id: "objectAtUrl".into(),
            tool_name: "jenkins__objectAtUrl".into(),
            transport: Transport::Http {
                method: "GET".into(),
                path_template: "/".into(),
            },
            parameters: vec![],
            request_body: None,
            response_schema: None,
            static_headers: BTreeMap::new(),
            dynamic_url_param: Some("url".into()),
            query_params_object: None,
            requires_crumb: false,
            input_schema: serde_json::json!({}),
            summary: None,
        };
        let mut args = serde_json::Map::new();
        assert!(!op.uses_dynamic_url(&args));
        args.insert("url".into(), serde_json::json!("https://x/y"));
        assert!(op.uses_dynamic_url(&args));
    }

    #[test]
    fn service_starts_with_no_operations() {
        let svc = Service::new("petstore", "https://petstore.example/v1");
        assert!(svc.operations.is_empty());
        assert_eq!(svc.base_url, "https://petstore.example/v1");
    }
}
