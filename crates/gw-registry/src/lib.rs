//! Tool/resource catalog (spec.md §4.2, "Registry & Schema Validation").
//!
//! Built once at startup from the [`Service`]s every adapter produced:
//! flattens every [`Operation`] into a [`Tool`] and its resource twin,
//! enforces global tool-name uniqueness, and compiles each input schema
//! into a [`jsonschema::Validator`]. A compilation failure demotes the tool
//! to "unvalidated" (still callable, best-effort) rather than failing the
//! whole build — only a name collision or a dangling parameter reference is
//! fatal.

#![forbid(unsafe_code)]

mod error;

use std::collections::BTreeMap;
use std::sync::Arc;

use gw_core::model::Service;
use gw_core::naming::NameLedger;
use gw_core::tool::{output_schema, Resource, Tool};
use gw_core::CoreError;

pub use error::RegistryError;

/// Result of validating `tools/call` arguments against a tool's compiled
/// schema (spec.md §4.2, §4.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Arguments satisfy the compiled schema.
    Valid,
    /// Arguments violate the compiled schema; messages are safe to surface
    /// to the caller verbatim (schemas never carry secrets).
    Invalid(Vec<String>),
    /// The tool's schema failed to compile at registration time; the call
    /// proceeds best-effort, per spec.md §4.2.
    Unvalidated,
}

/// The flat, immutable catalog built once at startup.
pub struct Catalog {
    tools: BTreeMap<String, Tool>,
    resources: BTreeMap<String, Resource>,
    validators: BTreeMap<String, jsonschema::Validator>,
}

impl Catalog {
    /// Build the catalog from every ingested [`Service`] (spec.md §4.2).
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if two operations resolve to the same
    /// `tool_name` (spec.md §3 invariant: tool names are unique
    /// process-wide) — this can only happen if an adapter built an
    /// operation without routing it through [`gw_core::naming::tool_name`].
    pub fn build(services: Vec<Service>) -> Result<Self, RegistryError> {
        let mut ledger = NameLedger::new();
        let mut tools = BTreeMap::new();
        let mut resources = BTreeMap::new();
        let mut validators = BTreeMap::new();

        for service in services {
            for operation in service.operations {
                if !ledger.claim(&operation.tool_name) {
                    return Err(CoreError::DuplicateToolName(operation.tool_name).into());
                }

                let operation = Arc::new(operation);

                match jsonschema::validator_for(&operation.input_schema) {
                    Ok(validator) => {
                        validators.insert(operation.tool_name.clone(), validator);
                    }
                    Err(e) => {
                        tracing::warn!(
                            tool = %operation.tool_name,
                            error = %e,
                            "input schema failed to compile; tool demoted to unvalidated"
                        );
                    }
                }

                let description = Tool::describe(&operation);
                let resource = Resource {
                    uri: Resource::uri_for(&operation),
                    name: operation.tool_name.clone(),
                    description: description.clone(),
                    operation: Arc::clone(&operation),
                };
                let tool = Tool {
                    name: operation.tool_name.clone(),
                    description,
                    input_schema: operation.input_schema.clone(),
                    output_schema: output_schema(),
                    validated: validators.contains_key(&operation.tool_name),
                    operation: Arc::clone(&operation),
                };

                resources.insert(resource.uri.clone(), resource);
                tools.insert(tool.name.clone(), tool);
            }
        }

        Ok(Self {
            tools,
            resources,
            validators,
        })
    }

    /// Look up a tool by its MCP name.
    #[must_use]
    pub fn tool(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// All tools, sorted by name (spec.md §4.2, "Tool listing... sorted by
    /// name"). `BTreeMap` iteration is already name-ordered.
    #[must_use]
    pub fn tools_sorted(&self) -> Vec<&Tool> {
        self.tools.values().collect()
    }

    /// Look up a resource by its `api://` URI.
    #[must_use]
    pub fn resource(&self, uri: &str) -> Option<&Resource> {
        self.resources.get(uri)
    }

    /// All resources, sorted by URI.
    #[must_use]
    pub fn resources_sorted(&self) -> Vec<&Resource> {
        self.resources.values().collect()
    }

    /// Validate `args` against `tool_name`'s compiled schema, if one
    /// exists (spec.md §4.4, `tools/call`: "validates arguments against
    /// compiled schema (unless validator compilation failed)").
    #[must_use]
    pub fn validate(&self, tool_name: &str, args: &serde_json::Value) -> ValidationOutcome {
        let Some(validator) = self.validators.get(tool_name) else {
            return ValidationOutcome::Unvalidated;
        };
        let errors: Vec<String> = validator.iter_errors(args).map(|e| e.to_string()).collect();
        if errors.is_empty() {
            ValidationOutcome::Valid
        } else {
            ValidationOutcome::Invalid(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gw_core::model::{Operation, Parameter, ParameterLocation, Transport};
    use std::collections::BTreeMap as Map;

    fn op(service: &str, id: &str, schema: serde_json::Value) -> Operation {
        Operation {
            service_name: service.to_string(),
            id: id.to_string(),
            tool_name: gw_core::naming::tool_name(service, id),
            transport: Transport::Http {
                method: "GET".to_string(),
                path_template: "/x".to_string(),
            },
            parameters: vec![Parameter::required_string("id", ParameterLocation::Path)],
            request_body: None,
            response_schema: None,
            static_headers: Map::new(),
            dynamic_url_param: None,
            query_params_object: None,
            requires_crumb: false,
            input_schema: schema,
            summary: Some("test op".to_string()),
        }
    }

    fn service_with(ops: Vec<Operation>) -> Service {
        let mut s = Service::new("svc", "https://svc.example");
        s.operations = ops;
        s
    }

    #[test]
    fn builds_sorted_catalog() {
        let schema = serde_json::json!({"type": "object", "properties": {"id": {"type": "string"}}, "required": ["id"]});
        let services = vec![service_with(vec![
            op("svc", "bravo", schema.clone()),
            op("svc", "alpha", schema),
        ])];
        let catalog = Catalog::build(services).unwrap();
        let names: Vec<&str> = catalog.tools_sorted().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["svc__alpha", "svc__bravo"]);
    }

    #[test]
    fn duplicate_tool_name_is_fatal() {
        let schema = serde_json::json!({"type": "object"});
        let services = vec![service_with(vec![
            op("svc", "dup", schema.clone()),
            op("svc", "dup", schema),
        ])];
        let err = Catalog::build(services).unwrap_err();
        assert!(matches!(err, RegistryError::Core(CoreError::DuplicateToolName(_))));
    }

    #[test]
    fn valid_args_pass_compiled_schema() {
        let schema = serde_json::json!({"type": "object", "properties": {"id": {"type": "string"}}, "required": ["id"]});
        let services = vec![service_with(vec![op("svc", "alpha", schema)])];
        let catalog = Catalog::build(services).unwrap();
        let outcome = catalog.validate("svc__alpha", &serde_json::json!({"id": "x"}));
        assert_eq!(outcome, ValidationOutcome::Valid);
    }

    #[test]
    fn missing_required_arg_is_invalid() {
        let schema = serde_json::json!({"type": "object", "properties": {"id": {"type": "string"}}, "required": ["id"]});
        let services = vec![service_with(vec![op("svc", "alpha", schema)])];
        let catalog = Catalog::build(services).unwrap();
        let outcome = catalog.validate("svc__alpha", &serde_json::json!({}));
        assert!(matches!(outcome, ValidationOutcome::Invalid(_)));
    }

    #[test]
    fn unknown_schema_compilation_failure_demotes_to_unvalidated() {
        // A schema referencing an unresolvable external $ref fails to compile.
        let schema = serde_json::json!({"$ref": "https://unreachable.example/schema.json#/never"});
        let services = vec![service_with(vec![op("svc", "weird", schema)])];
        let catalog = Catalog::build(services).unwrap();
        let tool = catalog.tool("svc__weird").unwrap();
        assert!(!tool.validated);
        assert_eq!(
            catalog.validate("svc__weird", &serde_json::json!({})),
            ValidationOutcome::Unvalidated
        );
    }

    #[test]
    fn resource_uri_mirrors_tool() {
        let schema = serde_json::json!({"type": "object"});
        let services = vec![service_with(vec![op("svc", "alpha", schema)])];
        let catalog = Catalog::build(services).unwrap();
        let resource = catalog.resource("api://svc/alpha").unwrap();
        assert_eq!(resource.name, "svc__alpha");
    }
}
