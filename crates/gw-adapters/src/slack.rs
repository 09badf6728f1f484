//! Slack adapter (spec.md §4.1, hand-written adapters): a fixed
//! hand-authored Operation set mirroring the documented public Slack Web
//! API, rather than one derived from a fetched spec.

use std::collections::BTreeMap;

use gw_core::model::{Operation, Parameter, ParameterLocation, RequestBody, Service, Transport};
use gw_core::naming;

use crate::common::compose_input_schema;

const BASE_URL: &str = "https://slack.com/api";

/// `true` when the configuration explicitly names the Slack adapter.
#[must_use]
pub fn detect_by_hint(spec_type: Option<&str>) -> bool {
    spec_type == Some("slack")
}

/// Build the fixed Slack [`Service`].
#[must_use]
pub fn build(api_name: &str, base_url_override: Option<&str>) -> Service {
    let base_url = base_url_override.unwrap_or(BASE_URL).to_string();
    let mut service = Service::new(api_name, base_url);
    service.operations = operations(api_name);
    service
}

struct Spec {
    id: &'static str,
    method: &'static str,
    path: &'static str,
    query_params: &'static [(&'static str, bool)],
    has_body: bool,
}

fn operations(api_name: &str) -> Vec<Operation> {
    let specs: &[Spec] = &[
        Spec { id: "chatPostMessage", method: "POST", path: "/chat.postMessage", query_params: &[], has_body: true },
        Spec { id: "chatUpdate", method: "POST", path: "/chat.update", query_params: &[], has_body: true },
        Spec { id: "chatDelete", method: "POST", path: "/chat.delete", query_params: &[], has_body: true },
        Spec { id: "conversationsList", method: "GET", path: "/conversations.list", query_params: &[("cursor", false), ("limit", false), ("types", false)], has_body: false },
        Spec { id: "conversationsHistory", method: "GET", path: "/conversations.history", query_params: &[("channel", true), ("cursor", false), ("limit", false)], has_body: false },
        Spec { id: "conversationsInfo", method: "GET", path: "/conversations.info", query_params: &[("channel", true)], has_body: false },
        Spec { id: "conversationsJoin", method: "POST", path: "/conversations.join", query_params: &[], has_body: true },
        Spec { id: "conversationsCreate", method: "POST", path: "/conversations.create", query_params: &[], has_body: true },
        Spec { id: "usersList", method: "GET", path: "/users.list", query_params: &[("cursor", false), ("limit", false)], has_body: false },
        Spec { id: "usersInfo", method: "GET", path: "/users.info", query_params: &[("user", true)], has_body: false },
        Spec { id: "usersLookupByEmail", method: "GET", path: "/users.lookupByEmail", query_params: &[("email", true)], has_body: false },
        Spec { id: "filesUpload", method: "POST", path: "/files.upload", query_params: &[], has_body: true },
        Spec { id: "reactionsAdd", method: "POST", path: "/reactions.add", query_params: &[], has_body: true },
        Spec { id: "reactionsRemove", method: "POST", path: "/reactions.remove", query_params: &[], has_body: true },
        Spec { id: "searchMessages", method: "GET", path: "/search.messages", query_params: &[("query", true), ("count", false)], has_body: false },
        Spec { id: "teamInfo", method: "GET", path: "/team.info", query_params: &[], has_body: false },
    ];

    specs
        .iter()
        .map(|spec| {
            let parameters: Vec<Parameter> = spec
                .query_params
                .iter()
                .map(|(name, required)| Parameter {
                    name: (*name).to_string(),
                    location: ParameterLocation::Query,
                    required: *required,
                    schema: serde_json::json!({"type": "string"}),
                })
                .collect();

            let request_body = spec.has_body.then(|| RequestBody {
                content_type: "application/json".to_string(),
                required: true,
                schema: serde_json::json!({"type": "object"}),
            });

            let input_schema = compose_input_schema(&parameters, request_body.as_ref(), &[]);

            Operation {
                service_name: api_name.to_string(),
                id: spec.id.to_string(),
                tool_name: naming::tool_name(api_name, spec.id),
                transport: Transport::Http {
                    method: spec.method.to_string(),
                    path_template: spec.path.to_string(),
                },
                parameters,
                request_body,
                response_schema: None,
                static_headers: BTreeMap::new(),
                dynamic_url_param: None,
                query_params_object: None,
                requires_crumb: false,
                input_schema,
                summary: Some(format!("Slack Web API: {}", spec.id)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_fixed_operation_set() {
        let svc = build("slack", None);
        assert_eq!(svc.base_url, BASE_URL);
        assert!(svc.operations.iter().any(|o| o.id == "chatPostMessage"));
        assert!(svc.operations.iter().any(|o| o.id == "conversationsHistory"));
    }

    #[test]
    fn post_message_requires_body() {
        let svc = build("slack", None);
        let op = svc.operations.iter().find(|o| o.id == "chatPostMessage").unwrap();
        assert_eq!(op.input_schema["required"], serde_json::json!(["body"]));
    }

    #[test]
    fn history_requires_channel_query_param() {
        let svc = build("slack", None);
        let op = svc.operations.iter().find(|o| o.id == "conversationsHistory").unwrap();
        let channel = op.parameters.iter().find(|p| p.name == "channel").unwrap();
        assert!(channel.required);
        assert_eq!(channel.location, ParameterLocation::Query);
    }

    #[test]
    fn base_url_override_replaces_default() {
        let svc = build("slack", Some("https://slack.internal.example/api"));
        assert_eq!(svc.base_url, "https://slack.internal.example/api");
    }
}
