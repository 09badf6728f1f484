//! Request body assembly for every transport kind (spec.md §4.3 step 4).

use gw_core::model::{GraphQlDescriptor, GraphQlOperationType, Operation, SoapDescriptor};

use crate::error::ExecutorError;

/// What the executor sends as the HTTP body, already encoded.
pub enum AssembledBody {
    /// No body on the wire.
    None,
    /// `application/json`-encoded bytes.
    Json(serde_json::Value),
    /// A raw string body with its own content type (SOAP's `text/xml`, or
    /// any non-JSON `request_body` content type).
    Raw { content_type: String, text: String },
}

/// Assemble the outgoing body for `operation` given its validated `args`.
pub fn assemble_body(
    operation: &Operation,
    args: &serde_json::Map<String, serde_json::Value>,
) -> Result<AssembledBody, ExecutorError> {
    match &operation.transport {
        gw_core::model::Transport::GraphQl(descriptor) => {
            graphql_body(operation, descriptor, args).map(AssembledBody::Json)
        }
        gw_core::model::Transport::Soap(descriptor) => {
            soap_body(operation, descriptor, args).map(|text| AssembledBody::Raw {
                content_type: "text/xml".to_string(),
                text,
            })
        }
        gw_core::model::Transport::JsonRpc { method } => {
            Ok(AssembledBody::Json(jsonrpc_body(method, args)))
        }
        // `Grpc` is a known spec deviation (see DESIGN.md `gw-executor`):
        // the `body` argument is sent as plain JSON, not re-encoded to
        // protobuf via the descriptor pool `gw-adapters::grpc` captured.
        gw_core::model::Transport::Http { .. } | gw_core::model::Transport::Grpc { .. } => {
            http_body(operation, args)
        }
    }
}

fn http_body(
    operation: &Operation,
    args: &serde_json::Map<String, serde_json::Value>,
) -> Result<AssembledBody, ExecutorError> {
    let Some(request_body) = &operation.request_body else {
        return Ok(AssembledBody::None);
    };

    let Some(value) = args.get("body") else {
        if request_body.required {
            return Err(ExecutorError::InvalidBody {
                operation: operation.tool_name.clone(),
                message: "required `body` argument was not supplied".to_string(),
            });
        }
        return Ok(AssembledBody::None);
    };

    if request_body.content_type == "application/json" {
        Ok(AssembledBody::Json(value.clone()))
    } else {
        let text = value
            .as_str()
            .ok_or_else(|| ExecutorError::InvalidBody {
                operation: operation.tool_name.clone(),
                message: format!(
                    "`body` must be a string for content type `{}`",
                    request_body.content_type
                ),
            })?
            .to_string();
        Ok(AssembledBody::Raw {
            content_type: request_body.content_type.clone(),
            text,
        })
    }
}

fn jsonrpc_body(method: &str, args: &serde_json::Map<String, serde_json::Value>) -> serde_json::Value {
    let params = args.get("body").cloned().unwrap_or(serde_json::Value::Null);
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params,
    })
}

/// Build `Query_{field}($a: A!, ...) { {field}(a: $a, ...) {selection} }`
/// using only the arguments the caller actually supplied (spec.md §4.1
/// GraphQL normalization; §4.3 step 4).
fn graphql_body(
    operation: &Operation,
    descriptor: &GraphQlDescriptor,
    args: &serde_json::Map<String, serde_json::Value>,
) -> Result<serde_json::Value, ExecutorError> {
    let selection = match args.get("selection").and_then(|v| v.as_str()) {
        Some(s) if descriptor.requires_selection => s.to_string(),
        Some(_) if !descriptor.requires_selection => {
            return Err(ExecutorError::SelectionForbidden {
                operation: operation.tool_name.clone(),
            });
        }
        None if descriptor.requires_selection => descriptor
            .default_selection
            .clone()
            .ok_or_else(|| ExecutorError::SelectionRequired {
                operation: operation.tool_name.clone(),
            })?,
        _ => String::new(),
    };

    let mut variables = serde_json::Map::new();
    let mut var_decls = Vec::new();
    let mut field_args = Vec::new();
    for (name, gql_type) in &descriptor.arg_types {
        let Some(value) = args.get(name) else { continue };
        variables.insert(name.clone(), value.clone());
        var_decls.push(format!("${name}: {gql_type}"));
        field_args.push(format!("{name}: ${name}"));
    }

    let operation_name = format!(
        "{}_{}",
        match descriptor.operation_type {
            GraphQlOperationType::Query => "Query",
            GraphQlOperationType::Mutation => "Mutation",
        },
        descriptor.field_name
    );

    let keyword = match descriptor.operation_type {
        GraphQlOperationType::Query => "query",
        GraphQlOperationType::Mutation => "mutation",
    };
    let var_clause = if var_decls.is_empty() {
        String::new()
    } else {
        format!("({})", var_decls.join(", "))
    };
    let field_clause = if field_args.is_empty() {
        descriptor.field_name.clone()
    } else {
        format!("{}({})", descriptor.field_name, field_args.join(", "))
    };
    let selection_clause = if selection.is_empty() {
        String::new()
    } else {
        format!(" {{ {selection} }}")
    };

    let document = format!(
        "{keyword} {operation_name}{var_clause} {{ {field_clause}{selection_clause} }}"
    );

    Ok(serde_json::json!({
        "query": document,
        "variables": variables,
    }))
}

/// Build `<soap:Envelope><soap:Body><{op} xmlns="{ns}"><k>v</k>...</{op}></soap:Body></soap:Envelope>`
/// from a `parameters` object argument (spec.md §4.3 step 4).
fn soap_body(
    operation: &Operation,
    descriptor: &SoapDescriptor,
    args: &serde_json::Map<String, serde_json::Value>,
) -> Result<String, ExecutorError> {
    let params = match args.get("parameters") {
        Some(serde_json::Value::Object(map)) => map.clone(),
        Some(_) => {
            return Err(ExecutorError::InvalidBody {
                operation: operation.tool_name.clone(),
                message: "`parameters` must be an object".to_string(),
            })
        }
        None => serde_json::Map::new(),
    };

    let mut inner = String::new();
    for (key, value) in &params {
        let tag = xml_sanitize_name(key);
        let text = xml_escape(&scalar_or_json_to_string(value));
        inner.push_str(&format!("<{tag}>{text}</{tag}>"));
    }

    Ok(format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><soap:Envelope xmlns:soap=\"http://schemas.xmlsoap.org/soap/envelope/\"><soap:Body><{op} xmlns=\"{ns}\">{inner}</{op}></soap:Body></soap:Envelope>",
        op = operation.id,
        ns = descriptor.namespace,
    ))
}

/// Strip characters that are not valid in an XML element name, falling
/// back to `_` when the whole key sanitizes away.
fn xml_sanitize_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let sanitized = sanitized.trim_start_matches(|c: char| c.is_ascii_digit() || c == '-' || c == '.');
    if sanitized.is_empty() {
        "_".to_string()
    } else {
        sanitized.to_string()
    }
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn scalar_or_json_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gw_core::model::{ParameterLocation, Transport};
    use std::collections::BTreeMap;

    fn base_operation(transport: Transport) -> Operation {
        Operation {
            service_name: "svc".into(),
            id: "ListPlants".into(),
            tool_name: "svc__ListPlants".into(),
            transport,
            parameters: vec![],
            request_body: None,
            response_schema: None,
            static_headers: BTreeMap::new(),
            dynamic_url_param: None,
            query_params_object: None,
            requires_crumb: false,
            input_schema: serde_json::json!({}),
            summary: None,
        }
    }

    #[test]
    fn soap_body_escapes_and_sanitizes() {
        let op = base_operation(Transport::Soap(SoapDescriptor {
            namespace: "http://example.com/plants".into(),
        }));
        let mut args = serde_json::Map::new();
        let mut params = serde_json::Map::new();
        params.insert("name".into(), serde_json::json!("<Rose & Co>"));
        args.insert("parameters".into(), serde_json::Value::Object(params));
        let xml = soap_body(&op, &SoapDescriptor { namespace: "http://example.com/plants".into() }, &args).unwrap();
        assert!(xml.contains("<ListPlants xmlns=\"http://example.com/plants\">"));
        assert!(xml.contains("<name>&lt;Rose &amp; Co&gt;</name>"));
    }

    #[test]
    fn soap_body_empty_parameters_is_self_closed_content() {
        let op = base_operation(Transport::Soap(SoapDescriptor {
            namespace: "http://example.com/plants".into(),
        }));
        let args = serde_json::Map::new();
        let descriptor = SoapDescriptor {
            namespace: "http://example.com/plants".into(),
        };
        let xml = soap_body(&op, &descriptor, &args).unwrap();
        assert!(xml.contains("<ListPlants xmlns=\"http://example.com/plants\"></ListPlants>"));
    }

    #[test]
    fn xml_sanitize_replaces_invalid_characters() {
        assert_eq!(xml_sanitize_name("branch name!"), "branch_name_");
        assert_eq!(xml_sanitize_name("1leading"), "leading");
    }

    #[test]
    fn graphql_body_requires_selection_for_composite() {
        let op = base_operation(Transport::GraphQl(GraphQlDescriptor {
            operation_type: GraphQlOperationType::Query,
            field_name: "listPets".into(),
            arg_types: BTreeMap::new(),
            requires_selection: true,
            default_selection: None,
        }));
        let descriptor = GraphQlDescriptor {
            operation_type: GraphQlOperationType::Query,
            field_name: "listPets".into(),
            arg_types: BTreeMap::new(),
            requires_selection: true,
            default_selection: None,
        };
        let args = serde_json::Map::new();
        let err = graphql_body(&op, &descriptor, &args).unwrap_err();
        assert!(matches!(err, ExecutorError::SelectionRequired { .. }));
    }

    #[test]
    fn graphql_body_forbids_selection_for_scalar() {
        let op = base_operation(Transport::GraphQl(GraphQlDescriptor {
            operation_type: GraphQlOperationType::Query,
            field_name: "petCount".into(),
            arg_types: BTreeMap::new(),
            requires_selection: false,
            default_selection: None,
        }));
        let descriptor = GraphQlDescriptor {
            operation_type: GraphQlOperationType::Query,
            field_name: "petCount".into(),
            arg_types: BTreeMap::new(),
            requires_selection: false,
            default_selection: None,
        };
        let mut args = serde_json::Map::new();
        args.insert("selection".into(), serde_json::json!("id"));
        let err = graphql_body(&op, &descriptor, &args).unwrap_err();
        assert!(matches!(err, ExecutorError::SelectionForbidden { .. }));
    }

    #[test]
    fn graphql_body_uses_default_selection_when_omitted() {
        let op = base_operation(Transport::GraphQl(GraphQlDescriptor {
            operation_type: GraphQlOperationType::Query,
            field_name: "listPets".into(),
            arg_types: BTreeMap::new(),
            requires_selection: true,
            default_selection: Some("id".into()),
        }));
        let descriptor = GraphQlDescriptor {
            operation_type: GraphQlOperationType::Query,
            field_name: "listPets".into(),
            arg_types: BTreeMap::new(),
            requires_selection: true,
            default_selection: Some("id".into()),
        };
        let args = serde_json::Map::new();
        let body = graphql_body(&op, &descriptor, &args).unwrap();
        assert!(body["query"].as_str().unwrap().contains("{ id }"));
    }

    #[test]
    fn graphql_body_includes_only_supplied_args() {
        let mut arg_types = BTreeMap::new();
        arg_types.insert("limit".to_string(), "Int".to_string());
        arg_types.insert("after".to_string(), "String".to_string());
        let op = base_operation(Transport::GraphQl(GraphQlDescriptor {
            operation_type: GraphQlOperationType::Query,
            field_name: "listPets".into(),
            arg_types: arg_types.clone(),
            requires_selection: true,
            default_selection: Some("id".into()),
        }));
        let descriptor = GraphQlDescriptor {
            operation_type: GraphQlOperationType::Query,
            field_name: "listPets".into(),
            arg_types,
            requires_selection: true,
            default_selection: Some("id".into()),
        };
        let mut args = serde_json::Map::new();
        args.insert("limit".into(), serde_json::json!(2));
        let body = graphql_body(&op, &descriptor, &args).unwrap();
        let query = body["query"].as_str().unwrap();
        assert!(query.contains("$limit: Int"));
        assert!(!query.contains("$after"));
        assert_eq!(body["variables"]["limit"], serde_json::json!(2));
    }

    #[test]
    fn jsonrpc_body_has_fixed_shape() {
        let mut args = serde_json::Map::new();
        args.insert("body".into(), serde_json::json!({"x": 1}));
        let body = jsonrpc_body("getThing", &args);
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["method"], "getThing");
        assert_eq!(body["params"], serde_json::json!({"x": 1}));
    }
}
