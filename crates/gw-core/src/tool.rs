//! MCP-visible façades over an [`Operation`](crate::model::Operation):
//! [`Tool`] (for `tools/*` methods) and [`Resource`] (its `resources/*` twin).

use std::sync::Arc;

use crate::model::Operation;

/// Fixed output shape every tool call returns, regardless of backend
/// protocol (spec.md §3, "Tool").
#[must_use]
pub fn output_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "status": { "type": "integer" },
            "content_type": { "type": "string" },
            "body": {}
        },
        "required": ["status", "content_type", "body"]
    })
}

/// One-to-one MCP shadow of an [`Operation`].
#[derive(Debug, Clone)]
pub struct Tool {
    /// Globally unique MCP tool name.
    pub name: String,
    /// Built from the operation's summary plus its parameter list.
    pub description: String,
    /// The operation's composed input schema.
    pub input_schema: serde_json::Value,
    /// Always the fixed `{status, content_type, body}` shape.
    pub output_schema: serde_json::Value,
    /// `true` when the input schema compiled to a usable validator; a
    /// `false` tool is still callable, best-effort (spec.md §4.2).
    pub validated: bool,
    /// Back-reference to the operation this tool shadows.
    pub operation: Arc<Operation>,
}

impl Tool {
    /// Build a tool description from the operation's summary and its
    /// parameter names, matching the "summary + parameter list" rule in
    /// spec.md §3.
    #[must_use]
    pub fn describe(operation: &Operation) -> String {
        let params: Vec<&str> = operation.parameters.iter().map(|p| p.name.as_str()).collect();
        match (&operation.summary, params.is_empty()) {
            (Some(summary), true) => summary.clone(),
            (Some(summary), false) => format!("{summary} (params: {})", params.join(", ")),
            (None, true) => format!("Invoke {}", operation.tool_name),
            (None, false) => format!(
                "Invoke {} (params: {})",
                operation.tool_name,
                params.join(", ")
            ),
        }
    }
}

/// Addressable twin of a [`Tool`] under `api://{service}/{operation_id}`.
#[derive(Debug, Clone)]
pub struct Resource {
    /// `api://{service}/{operation_id}`.
    pub uri: String,
    /// Mirrors the shadowed tool's name.
    pub name: String,
    /// Mirrors the shadowed tool's description.
    pub description: String,
    /// Back-reference to the same operation the sibling [`Tool`] shadows.
    pub operation: Arc<Operation>,
}

impl Resource {
    /// Build the canonical resource URI for an operation.
    #[must_use]
    pub fn uri_for(operation: &Operation) -> String {
        format!("api://{}/{}", operation.service_name, operation.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Parameter, ParameterLocation, Transport};
    use std::collections::BTreeMap;

    fn sample_operation() -> Operation {
        Operation {
            service_name: "petstore".into(),
            id: "listPets".into(),
            tool_name: "petstore__listPets".into(),
            transport: Transport::Http {
                method: "GET".into(),
                path_template: "/pets".into(),
            },
            parameters: vec![Parameter::optional(
                "limit",
                ParameterLocation::Query,
                serde_json::json!({"type": "integer"}),
            )],
            request_body: None,
            response_schema: None,
            static_headers: BTreeMap::new(),
            dynamic_url_param: None,
            query_params_object: None,
            requires_crumb: false,
            input_schema: serde_json::json!({"type": "object"}),
            summary: Some("List all pets".into()),
        }
    }

    #[test]
    fn describe_includes_summary_and_params() {
        let op = sample_operation();
        let desc = Tool::describe(&op);
        assert!(desc.contains("List all pets"));
        assert!(desc.contains("limit"));
    }

    #[test]
    fn resource_uri_matches_scheme() {
        let op = sample_operation();
        assert_eq!(Resource::uri_for(&op), "api://petstore/listPets");
    }

    #[test]
    fn output_schema_has_fixed_shape() {
        let schema = output_schema();
        assert_eq!(schema["required"], serde_json::json!(["status", "content_type", "body"]));
    }
}
