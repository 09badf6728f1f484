//! Query string assembly (spec.md §4.3 step 2).

use gw_core::model::{Operation, ParameterLocation};

/// Build the ordered list of `(name, value)` query pairs for `operation`
/// given `args`.
///
/// Walks the operation's declared `in:query` parameters in order; array
/// values add one entry per element. If `query_params_object` is set and
/// the caller supplied an object for it, its entries are merged in with
/// deterministic (sorted-by-key) ordering, after the declared parameters.
#[must_use]
pub fn build_query_pairs(
    operation: &Operation,
    args: &serde_json::Map<String, serde_json::Value>,
) -> Vec<(String, String)> {
    let mut pairs = Vec::new();

    for param in &operation.parameters {
        if param.location != ParameterLocation::Query {
            continue;
        }
        let Some(value) = args.get(&param.name) else {
            continue;
        };
        push_value(&mut pairs, &param.name, value);
    }

    if let Some(obj_param) = &operation.query_params_object {
        if let Some(serde_json::Value::Object(map)) = args.get(obj_param) {
            let mut entries: Vec<(&String, &serde_json::Value)> = map.iter().collect();
            entries.sort_by_key(|(k, _)| (*k).clone());
            for (k, v) in entries {
                push_value(&mut pairs, k, v);
            }
        }
    }

    pairs
}

fn push_value(pairs: &mut Vec<(String, String)>, name: &str, value: &serde_json::Value) {
    match value {
        serde_json::Value::Array(items) => {
            for item in items {
                if let Some(s) = scalar_to_string(item) {
                    pairs.push((name.to_string(), s));
                }
            }
        }
        other => {
            if let Some(s) = scalar_to_string(other) {
                pairs.push((name.to_string(), s));
            }
        }
    }
}

fn scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gw_core::model::{Parameter, Transport};
    use std::collections::BTreeMap;

    fn op(query_params_object: Option<&str>) -> Operation {
        Operation {
            service_name: "svc".into(),
            id: "op".into(),
            tool_name: "svc__op".into(),
            transport: Transport::Http {
                method: "GET".into(),
                path_template: "/x".into(),
            },
            parameters: vec![Parameter::optional(
                "tag",
                ParameterLocation::Query,
                serde_json::json!({"type": "array"}),
            )],
            request_body: None,
            response_schema: None,
            static_headers: BTreeMap::new(),
            dynamic_url_param: None,
            query_params_object: query_params_object.map(str::to_string),
            requires_crumb: false,
            input_schema: serde_json::json!({}),
            summary: None,
        }
    }

    #[test]
    fn array_query_param_adds_one_entry_per_element() {
        let operation = op(None);
        let mut args = serde_json::Map::new();
        args.insert("tag".into(), serde_json::json!(["a", "b"]));
        let pairs = build_query_pairs(&operation, &args);
        assert_eq!(
            pairs,
            vec![("tag".to_string(), "a".to_string()), ("tag".to_string(), "b".to_string())]
        );
    }

    #[test]
    fn query_params_object_merges_sorted() {
        let operation = op(Some("parameters"));
        let mut args = serde_json::Map::new();
        let mut obj = serde_json::Map::new();
        obj.insert("env".into(), serde_json::json!("staging"));
        obj.insert("branch".into(), serde_json::json!("main"));
        args.insert("parameters".into(), serde_json::Value::Object(obj));
        let pairs = build_query_pairs(&operation, &args);
        assert_eq!(
            pairs,
            vec![
                ("branch".to_string(), "main".to_string()),
                ("env".to_string(), "staging".to_string()),
            ]
        );
    }

    #[test]
    fn missing_query_param_is_omitted() {
        let operation = op(None);
        let args = serde_json::Map::new();
        assert!(build_query_pairs(&operation, &args).is_empty());
    }
}
