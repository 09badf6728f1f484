//! Jira Cloud adapter (SPEC_FULL.md §4.1 supplement): spec.md names Jira
//! Cloud among the hand-written adapters but gives it no normalization
//! rules of its own. Follows the same fixed-Operation-set pattern as
//! [`crate::jenkins`] and [`crate::slack`], covering issue CRUD,
//! search/JQL, comments, and transitions.

use std::collections::BTreeMap;

use gw_core::model::{Operation, Parameter, ParameterLocation, RequestBody, Service, Transport};
use gw_core::naming;

use crate::common::{compose_input_schema, path_param};

/// `true` when the configuration explicitly names the Jira adapter.
#[must_use]
pub fn detect_by_hint(spec_type: Option<&str>) -> bool {
    spec_type == Some("jira")
}

/// Build the fixed Jira Cloud [`Service`]; `base_url` must be the site's
/// `https://{tenant}.atlassian.net` root (Jira Cloud has no fetchable spec).
#[must_use]
pub fn build(api_name: &str, base_url: &str) -> Service {
    let mut service = Service::new(api_name, format!("{}/rest/api/3", base_url.trim_end_matches('/')));
    service.operations = operations(api_name);
    service
}

struct Spec {
    id: &'static str,
    method: &'static str,
    path: &'static str,
    has_body: bool,
    query_params: &'static [(&'static str, bool)],
}

fn operations(api_name: &str) -> Vec<Operation> {
    let specs: &[Spec] = &[
        Spec { id: "getIssue", method: "GET", path: "/issue/{issueIdOrKey}", has_body: false, query_params: &[("fields", false), ("expand", false)] },
        Spec { id: "createIssue", method: "POST", path: "/issue", has_body: true, query_params: &[] },
        Spec { id: "updateIssue", method: "PUT", path: "/issue/{issueIdOrKey}", has_body: true, query_params: &[] },
        Spec { id: "deleteIssue", method: "DELETE", path: "/issue/{issueIdOrKey}", has_body: false, query_params: &[("deleteSubtasks", false)] },
        Spec { id: "searchIssues", method: "GET", path: "/search", has_body: false, query_params: &[("jql", true), ("startAt", false), ("maxResults", false)] },
        Spec { id: "getComments", method: "GET", path: "/issue/{issueIdOrKey}/comment", has_body: false, query_params: &[("startAt", false), ("maxResults", false)] },
        Spec { id: "addComment", method: "POST", path: "/issue/{issueIdOrKey}/comment", has_body: true, query_params: &[] },
        Spec { id: "updateComment", method: "PUT", path: "/issue/{issueIdOrKey}/comment/{commentId}", has_body: true, query_params: &[] },
        Spec { id: "deleteComment", method: "DELETE", path: "/issue/{issueIdOrKey}/comment/{commentId}", has_body: false, query_params: &[] },
        Spec { id: "getTransitions", method: "GET", path: "/issue/{issueIdOrKey}/transitions", has_body: false, query_params: &[] },
        Spec { id: "doTransition", method: "POST", path: "/issue/{issueIdOrKey}/transitions", has_body: true, query_params: &[] },
        Spec { id: "getProject", method: "GET", path: "/project/{projectIdOrKey}", has_body: false, query_params: &[] },
        Spec { id: "listProjects", method: "GET", path: "/project/search", has_body: false, query_params: &[("startAt", false), ("maxResults", false)] },
        Spec { id: "createIssueLink", method: "POST", path: "/issueLink", has_body: true, query_params: &[] },
    ];

    specs
        .iter()
        .map(|spec| {
            let mut parameters: Vec<Parameter> = crate::common::path_template_params(spec.path)
                .into_iter()
                .map(|p| path_param(&p))
                .collect();
            parameters.extend(spec.query_params.iter().map(|(name, required)| Parameter {
                name: (*name).to_string(),
                location: ParameterLocation::Query,
                required: *required,
                schema: serde_json::json!({"type": "string"}),
            }));

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
                summary: Some(format!("Jira Cloud: {}", spec.id)),
            }
        })
        .collect()
}
