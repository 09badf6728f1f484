//! Jenkins adapter (spec.md §4.1, hand-written adapters): an object-graph
//! traversal model rather than a fetched spec. The read path emits a small,
//! fixed set of Operations; `tree`/`depth` are universal query parameters on
//! every read. Writes are enumerated (34 operations, gated by
//! `jenkins.allow_writes[]`) with `requires_crumb = true`; the
//! parameterised-build pattern sets `query_params_object = "parameters"`.

use std::collections::BTreeMap;

use gw_core::model::{
    Operation, Parameter, ParameterLocation, RequestBody, Service, Transport,
};
use gw_core::naming;

use crate::common::{compose_input_schema, path_param, path_template_params, query_param};

/// `true` when the configuration explicitly names the Jenkins adapter.
#[must_use]
pub fn detect_by_hint(spec_type: Option<&str>) -> bool {
    spec_type == Some("jenkins")
}

/// Build the fixed Jenkins [`Service`]: the read-path object graph plus
/// whichever write operations are named in `allow_writes`.
#[must_use]
pub fn build(api_name: &str, base_url: &str, allow_writes: &[String]) -> Service {
    let mut service = Service::new(api_name, base_url);
    service.operations.extend(read_operations(api_name));
    service.operations.extend(
        write_operations(api_name)
            .into_iter()
            .filter(|op| allow_writes.iter().any(|w| w == &op.id)),
    );
    service
}

fn tree_depth_params() -> Vec<Parameter> {
    vec![
        query_param("tree", serde_json::json!({"type": "string"})),
        query_param("depth", serde_json::json!({"type": "integer"})),
    ]
}

fn read_operations(api_name: &str) -> Vec<Operation> {
    let specs: &[(&str, &str)] = &[
        ("root", "/api/json"),
        ("version", "/"),
        ("jobs", "/api/json"),
        ("builds", "/job/{name}/api/json"),
        ("queue", "/queue/api/json"),
        ("nodes", "/computer/api/json"),
        ("credentials", "/credentials/store/system/domain/_/api/json"),
        ("plugins", "/pluginManager/api/json"),
        ("users", "/asynchPeople/api/json"),
        ("blueOceanViews", "/blue/rest/organizations/jenkins/pipelines/"),
    ];

    let mut ops: Vec<Operation> = specs
        .iter()
        .map(|(id, path)| {
            let mut parameters: Vec<Parameter> = path_template_params(path)
                .into_iter()
                .map(|p| path_param(&p))
                .collect();
            parameters.extend(tree_depth_params());
            let input_schema = compose_input_schema(&parameters, None, &[]);
            Operation {
                service_name: api_name.to_string(),
                id: (*id).to_string(),
                tool_name: naming::tool_name(api_name, id),
                transport: Transport::Http {
                    method: "GET".to_string(),
                    path_template: (*path).to_string(),
                },
                parameters,
                request_body: None,
                response_schema: None,
                static_headers: BTreeMap::new(),
                dynamic_url_param: None,
                query_params_object: None,
                requires_crumb: false,
                input_schema,
                summary: Some(format!("Jenkins read: {id}")),
            }
        })
        .collect();

    // objectAtUrl: arbitrary read via a caller-supplied URL, constrained at
    // call time to the service's own host (spec.md §4.3 step 1).
    let mut url_param = Parameter::required_string("url", ParameterLocation::Path);
    url_param.required = false;
    let mut parameters = vec![url_param];
    parameters.extend(tree_depth_params());
    let input_schema = compose_input_schema(&parameters, None, &[]);
    ops.push(Operation {
        service_name: api_name.to_string(),
        id: "objectAtUrl".to_string(),
        tool_name: naming::tool_name(api_name, "objectAtUrl"),
        transport: Transport::Http {
            method: "GET".to_string(),
            path_template: "/".to_string(),
        },
        parameters,
        request_body: None,
        response_schema: None,
        static_headers: BTreeMap::new(),
        dynamic_url_param: Some("url".to_string()),
        query_params_object: None,
        requires_crumb: false,
        input_schema,
        summary: Some("Fetch an arbitrary Jenkins object by URL".to_string()),
    });

    ops
}

/// The 34 write operations spec.md names; each requires a CSRF crumb. Only
/// those listed in `jenkins.allow_writes[]` are actually registered.
fn write_operations(api_name: &str) -> Vec<Operation> {
    let specs: &[(&str, &str, &str, bool)] = &[
        ("triggerBuild", "POST", "/job/{name}/build", false),
        ("triggerBuildWithParameters", "POST", "/job/{name}/buildWithParameters", true),
        ("stopBuild", "POST", "/job/{name}/{number}/stop", false),
        ("deleteBuild", "POST", "/job/{name}/{number}/doDelete", false),
        ("toggleLogKeep", "POST", "/job/{name}/{number}/toggleLogKeep", false),
        ("disableJob", "POST", "/job/{name}/disable", false),
        ("enableJob", "POST", "/job/{name}/enable", false),
        ("deleteJob", "POST", "/job/{name}/doDelete", false),
        ("wipeOutWorkspace", "POST", "/job/{name}/doWipeOutWorkspace", false),
        ("createJob", "POST", "/createItem", false),
        ("copyJob", "POST", "/createItem", false),
        ("renameJob", "POST", "/job/{name}/doRename", false),
        ("updateJobConfig", "POST", "/job/{name}/config.xml", false),
        ("deleteView", "POST", "/view/{name}/doDelete", false),
        ("createView", "POST", "/createView", false),
        ("addJobToView", "POST", "/view/{name}/addJobToView", false),
        ("removeJobFromView", "POST", "/view/{name}/removeJobFromView", false),
        ("toggleOffline", "POST", "/computer/{name}/toggleOffline", false),
        ("deleteNode", "POST", "/computer/{name}/doDelete", false),
        ("createNode", "POST", "/computer/doCreateItem", false),
        ("launchNode", "POST", "/computer/{name}/launchSlaveAgent", false),
        ("cancelQueueItem", "POST", "/queue/cancelItem", false),
        ("restart", "POST", "/restart", false),
        ("safeRestart", "POST", "/safeRestart", false),
        ("exit", "POST", "/exit", false),
        ("quietDown", "POST", "/quietDown", false),
        ("cancelQuietDown", "POST", "/cancelQuietDown", false),
        ("reload", "POST", "/reload", false),
        ("createCredential", "POST", "/credentials/store/system/domain/_/createCredentials", false),
        ("updateCredential", "POST", "/credentials/store/system/domain/_/credential/{id}/config.xml", false),
        ("deleteCredential", "POST", "/credentials/store/system/domain/_/credential/{id}/doDelete", false),
        ("installPlugin", "POST", "/pluginManager/installNecessaryPlugins", false),
        ("uninstallPlugin", "POST", "/pluginManager/plugin/{id}/doUninstall", false),
        ("createUser", "POST", "/securityRealm/createAccountByAdmin", false),
        ("deleteUser", "POST", "/user/{id}/doDelete", false),
    ];

    specs
        .iter()
        .map(|(id, method, path, parameterised)| {
            let mut parameters: Vec<Parameter> = path_template_params(path)
                .into_iter()
                .map(|p| path_param(&p))
                .collect();

            let query_params_object = if *parameterised {
                parameters.push(Parameter::optional(
                    "parameters",
                    ParameterLocation::Query,
                    serde_json::json!({"type": "object"}),
                ));
                Some("parameters".to_string())
            } else {
                None
            };

            let request_body = if path.ends_with("config.xml") || *id == "createJob" || *id == "copyJob" {
                Some(RequestBody {
                    content_type: "text/xml".to_string(),
                    required: false,
                    schema: serde_json::json!({"type": "string"}),
                })
            } else {
                None
            };

            let input_schema = compose_input_schema(&parameters, request_body.as_ref(), &[]);

            Operation {
                service_name: api_name.to_string(),
                id: (*id).to_string(),
                tool_name: naming::tool_name(api_name, id),
                transport: Transport::Http {
                    method: (*method).to_string(),
                    path_template: (*path).to_string(),
                },
                parameters,
                request_body,
                response_schema: None,
                static_headers: BTreeMap::new(),
                dynamic_url_param: None,
                query_params_object,
                requires_crumb: true,
                input_schema,
                summary: Some(format!("Jenkins write: {id}")),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_graph_has_ten_fixed_plus_object_at_url() {
        let svc = build("ci", "https://ci.example", &[]);
        assert_eq!(svc.operations.len(), 11);
        assert!(svc.operations.iter().all(|o| !o.requires_crumb));
    }

    #[test]
    fn object_at_url_has_optional_dynamic_url_param() {
        let svc = build("ci", "https://ci.example", &[]);
        let op = svc.operations.iter().find(|o| o.id == "objectAtUrl").unwrap();
        assert_eq!(op.dynamic_url_param.as_deref(), Some("url"));
    }

    #[test]
    fn allow_writes_gates_write_operations() {
        let svc = build("ci", "https://ci.example", &["triggerBuild".to_string()]);
        assert_eq!(svc.operations.len(), 12);
        let trigger = svc.operations.iter().find(|o| o.id == "triggerBuild").unwrap();
        assert!(trigger.requires_crumb);
    }

    #[test]
    fn parameterised_build_sets_query_params_object() {
        let svc = build("ci", "https://ci.example", &["triggerBuildWithParameters".to_string()]);
        let op = svc
            .operations
            .iter()
            .find(|o| o.id == "triggerBuildWithParameters")
            .unwrap();
        assert_eq!(op.query_params_object.as_deref(), Some("parameters"));
    }

    #[test]
    fn thirty_four_write_operations_are_defined() {
        assert_eq!(write_operations("ci").len(), 34);
    }

    #[test]
    fn no_write_is_enabled_by_default() {
        let svc = build("ci", "https://ci.example", &[]);
        assert!(svc.operations.iter().all(|o| !o.requires_crumb));
    }
}
