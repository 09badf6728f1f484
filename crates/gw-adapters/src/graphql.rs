//! GraphQL adapter (spec.md §4.1, detection order item 3): accepts either
//! an introspection JSON result (top-level `__schema`) or a raw SDL document
//! (a `schema` block, or a bare `type Query`/`type Mutation`).
//!
//! Each `Query`/`Mutation` root field becomes one [`Operation`] carrying a
//! [`GraphQlDescriptor`]; the base URL must always come from
//! `base_url_override` since neither introspection JSON nor SDL carries one.

use std::collections::BTreeMap;

use gw_core::model::{
    GraphQlDescriptor, GraphQlOperationType, Operation, Parameter, ParameterLocation, Service,
    Transport,
};
use gw_core::naming;

use crate::common::compose_input_schema;
use crate::error::AdapterError;

const SCALAR_TYPES: &[&str] = &["Int", "Float", "String", "Boolean", "ID"];

/// `true` for introspection JSON (`__schema` at top level) or SDL containing
/// a `schema` block or `type Query`/`type Mutation`.
#[must_use]
pub fn detect(raw: &[u8]) -> bool {
    let Ok(text) = std::str::from_utf8(raw) else {
        return false;
    };
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(text) {
        let schema = json.get("__schema").or_else(|| json.get("data").and_then(|d| d.get("__schema")));
        return schema.is_some();
    }
    text.contains("schema {") || text.contains("type Query") || text.contains("type Mutation")
}

/// Parse either introspection JSON or SDL into a [`Service`].
pub fn parse(
    api_name: &str,
    raw: &[u8],
    base_url_override: Option<&str>,
) -> Result<Service, AdapterError> {
    let base_url = base_url_override
        .map(str::to_string)
        .ok_or_else(|| AdapterError::MissingBaseUrl {
            api: api_name.to_string(),
        })?;

    let text = std::str::from_utf8(raw).map_err(|e| AdapterError::Parse {
        api: api_name.to_string(),
        format: "GraphQL",
        message: e.to_string(),
    })?;

    let mut service = Service::new(api_name, base_url);

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(text) {
        parse_introspection(api_name, &json, &mut service)?;
    } else {
        parse_sdl(api_name, text, &mut service);
    }

    Ok(service)
}

fn parse_introspection(
    api_name: &str,
    json: &serde_json::Value,
    service: &mut Service,
) -> Result<(), AdapterError> {
    let schema = json
        .get("__schema")
        .or_else(|| json.get("data").and_then(|d| d.get("__schema")))
        .ok_or_else(|| AdapterError::Parse {
            api: api_name.to_string(),
            format: "GraphQL",
            message: "missing __schema".to_string(),
        })?;

    let types = schema.get("types").and_then(|t| t.as_array()).cloned().unwrap_or_default();
    let find_type = |name: &str| types.iter().find(|t| t.get("name").and_then(|n| n.as_str()) == Some(name));

    for (op_type, field_path) in [
        (GraphQlOperationType::Query, "queryType"),
        (GraphQlOperationType::Mutation, "mutationType"),
    ] {
        let Some(type_name) = schema.get(field_path).and_then(|t| t.get("name")).and_then(|n| n.as_str())
        else {
            continue;
        };
        let Some(root_type) = find_type(type_name) else {
            continue;
        };
        let fields = root_type.get("fields").and_then(|f| f.as_array()).cloned().unwrap_or_default();
        for field in &fields {
            let Some(field_name) = field.get("name").and_then(|n| n.as_str()) else {
                continue;
            };
            let args = field.get("args").and_then(|a| a.as_array()).cloned().unwrap_or_default();
            let mut arg_types = BTreeMap::new();
            let mut parameters = Vec::new();
            for arg in &args {
                let Some(arg_name) = arg.get("name").and_then(|n| n.as_str()) else {
                    continue;
                };
                let type_ref = arg.get("type").cloned().unwrap_or(serde_json::Value::Null);
                let type_string = gql_type_string(&type_ref);
                let required = type_string.ends_with('!');
                arg_types.insert(arg_name.to_string(), type_string);
                parameters.push(Parameter {
                    name: arg_name.to_string(),
                    location: ParameterLocation::Query,
                    required,
                    schema: serde_json::json!({}),
                });
            }

            let return_type = field.get("type").cloned().unwrap_or(serde_json::Value::Null);
            let is_composite = gql_type_is_composite(&return_type, &types);
            let descriptor = GraphQlDescriptor {
                operation_type: op_type,
                field_name: field_name.to_string(),
                arg_types,
                requires_selection: is_composite,
                default_selection: is_composite.then(|| "__typename".to_string()),
            };
            push_operation(api_name, service, descriptor, parameters);
        }
    }
    Ok(())
}

/// Resolve an introspection `__Type` reference (possibly wrapped in
/// `NON_NULL`/`LIST`) into a GraphQL type string, e.g. `"[ID!]!"`.
fn gql_type_string(type_ref: &serde_json::Value) -> String {
    match type_ref.get("kind").and_then(|k| k.as_str()) {
        Some("NON_NULL") => {
            let inner = type_ref.get("ofType").cloned().unwrap_or(serde_json::Value::Null);
            format!("{}!", gql_type_string(&inner))
        }
        Some("LIST") => {
            let inner = type_ref.get("ofType").cloned().unwrap_or(serde_json::Value::Null);
            format!("[{}]", gql_type_string(&inner))
        }
        _ => type_ref
            .get("name")
            .and_then(|n| n.as_str())
            .unwrap_or("String")
            .to_string(),
    }
}

/// Unwrap `NON_NULL`/`LIST` wrappers and check whether the underlying named
/// type is a composite (`OBJECT`/`INTERFACE`/`UNION`) kind.
fn gql_type_is_composite(type_ref: &serde_json::Value, types: &[serde_json::Value]) -> bool {
    match type_ref.get("kind").and_then(|k| k.as_str()) {
        Some("NON_NULL" | "LIST") => {
            let inner = type_ref.get("ofType").cloned().unwrap_or(serde_json::Value::Null);
            gql_type_is_composite(&inner, types)
        }
        Some("OBJECT" | "INTERFACE" | "UNION") => true,
        Some(_) => false,
        None => {
            let Some(name) = type_ref.get("name").and_then(|n| n.as_str()) else {
                return false;
            };
            types
                .iter()
                .find(|t| t.get("name").and_then(|n| n.as_str()) == Some(name))
                .and_then(|t| t.get("kind").and_then(|k| k.as_str()))
                .is_some_and(|kind| matches!(kind, "OBJECT" | "INTERFACE" | "UNION"))
        }
    }
}

/// Parse a minimal subset of SDL: the bodies of `type Query { ... }` and
/// `type Mutation { ... }` blocks, one field per line of the form
/// `name(arg: Type!, ...): ReturnType`.
fn parse_sdl(api_name: &str, text: &str, service: &mut Service) {
    for (op_type, keyword) in [
        (GraphQlOperationType::Query, "type Query"),
        (GraphQlOperationType::Mutation, "type Mutation"),
    ] {
        let Some(start) = text.find(keyword) else {
            continue;
        };
        let Some(brace_open) = text[start..].find('{') else {
            continue;
        };
        let body_start = start + brace_open + 1;
        let Some(brace_close) = text[body_start..].find('}') else {
            continue;
        };
        let body = &text[body_start..body_start + brace_close];

        for line in body.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((field_name, rest)) = parse_field_line(line) else {
                continue;
            };
            let (arg_types, parameters) = parse_field_args(&rest.0);
            let return_type = rest.1.trim().trim_end_matches(',').to_string();
            let is_composite = !SCALAR_TYPES.contains(&strip_type_wrappers(&return_type).as_str());
            let descriptor = GraphQlDescriptor {
                operation_type: op_type,
                field_name: field_name.clone(),
                arg_types,
                requires_selection: is_composite,
                default_selection: is_composite.then(|| "__typename".to_string()),
            };
            push_operation(api_name, service, descriptor, parameters);
        }
    }
}

/// Split `name(args): ReturnType` or `name: ReturnType` into the field name
/// and `(args_str, return_type_str)`.
fn parse_field_line(line: &str) -> Option<(String, (String, String))> {
    let colon = line.find(':')?;
    let (head, return_type) = line.split_at(colon);
    let return_type = return_type[1..].to_string();
    if let Some(paren_open) = head.find('(') {
        let name = head[..paren_open].trim().to_string();
        let paren_close = head.rfind(')')?;
        let args = head[paren_open + 1..paren_close].to_string();
        Some((name, (args, return_type)))
    } else {
        Some((head.trim().to_string(), (String::new(), return_type)))
    }
}

fn parse_field_args(args: &str) -> (BTreeMap<String, String>, Vec<Parameter>) {
    let mut arg_types = BTreeMap::new();
    let mut parameters = Vec::new();
    for part in args.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let Some(colon) = part.find(':') else {
            continue;
        };
        let name = part[..colon].trim().to_string();
        let type_string = part[colon + 1..].trim().to_string();
        let required = type_string.ends_with('!');
        arg_types.insert(name.clone(), type_string);
        parameters.push(Parameter {
            name,
            location: ParameterLocation::Query,
            required,
            schema: serde_json::json!({}),
        });
    }
    (arg_types, parameters)
}

fn strip_type_wrappers(type_string: &str) -> String {
    type_string
        .trim()
        .trim_end_matches('!')
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim_end_matches('!')
        .to_string()
}

fn push_operation(
    api_name: &str,
    service: &mut Service,
    descriptor: GraphQlDescriptor,
    parameters: Vec<Parameter>,
) {
    let id = descriptor.field_name.clone();
    let tool_name = naming::tool_name(api_name, &id);
    let mut extra = vec![];
    if descriptor.requires_selection {
        extra.push(("selection", serde_json::json!({"type": "string"}), false));
    }
    let input_schema = compose_input_schema(&parameters, None, &extra);
    service.operations.push(Operation {
        service_name: api_name.to_string(),
        id,
        tool_name,
        transport: Transport::GraphQl(descriptor),
        parameters,
        request_body: None,
        response_schema: None,
        static_headers: BTreeMap::new(),
        dynamic_url_param: None,
        query_params_object: None,
        requires_crumb: false,
        input_schema,
        summary: None,
    });
}
