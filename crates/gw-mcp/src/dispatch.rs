//! Method dispatch (spec.md §4.4): turns one [`JsonRpcRequest`] into a
//! [`DispatchReply`] against the wired catalog, executor, and
//! collaborators.

use std::sync::Arc;
use std::time::Instant;

use gw_core::collaborators::{AuditRecord, AuditSink, MetricUpdate, MetricsSink};
use gw_core::Redactor;
use gw_executor::Executor;
use gw_registry::{Catalog, ValidationOutcome};

use crate::error::McpError;
use crate::protocol::{
    is_accepted_protocol_version, DispatchReply, JsonRpcErrorResponse, JsonRpcRequest,
    JsonRpcResponse, PROTOCOL_VERSION,
};

/// Server name/version advertised in `initialize` (spec.md §4.4).
const SERVER_NAME: &str = "mcp-gateway";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything method dispatch needs: the immutable catalog, the executor,
/// the shared redactor, and the (optional, defaulted to no-op) external
/// collaborators.
pub struct Dispatcher {
    catalog: Arc<Catalog>,
    executor: Arc<Executor>,
    redactor: Arc<Redactor>,
    audit: Arc<dyn AuditSink>,
    metrics: Arc<dyn MetricsSink>,
}

impl Dispatcher {
    /// Build a dispatcher over the given catalog and executor.
    #[must_use]
    pub fn new(
        catalog: Arc<Catalog>,
        executor: Arc<Executor>,
        redactor: Arc<Redactor>,
        audit: Arc<dyn AuditSink>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            catalog,
            executor,
            redactor,
            audit,
            metrics,
        }
    }

    /// Dispatch one request, identified as belonging to `session` for
    /// audit purposes (STDIO callers may pass a fixed process-scoped id).
    pub async fn dispatch(&self, session: &str, request: JsonRpcRequest) -> DispatchReply {
        let id = request.id.clone();
        let is_notification = request.is_notification();

        let result = self.handle(session, &request).await;

        if is_notification {
            return DispatchReply::None;
        }

        let id = id.unwrap_or(serde_json::Value::Null);
        match result {
            Ok(value) => DispatchReply::Result(JsonRpcResponse::new(id, value)),
            Err(error) => {
                DispatchReply::Error(JsonRpcErrorResponse::from_error(id, &error, &self.redactor))
            }
        }
    }

    async fn handle(
        &self,
        session: &str,
        request: &JsonRpcRequest,
    ) -> Result<serde_json::Value, McpError> {
        match request.method.as_str() {
            "initialize" => self.initialize(&request.params),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => Ok(self.tools_list()),
            "tools/call" => self.tools_call(session, &request.params).await,
            "resources/list" => Ok(self.resources_list()),
            "resources/read" => self.resources_read(&request.params),
            "resources/templates" => Ok(self.resources_templates()),
            other => Err(McpError::MethodNotFound(other.to_string())),
        }
    }

    fn initialize(&self, params: &serde_json::Value) -> Result<serde_json::Value, McpError> {
        if let Some(version) = params.get("protocolVersion").and_then(|v| v.as_str()) {
            if !is_accepted_protocol_version(version) {
                return Err(McpError::InvalidParams(format!(
                    "unsupported protocolVersion `{version}`"
                )));
            }
        }

        Ok(serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": SERVER_NAME,
                "version": SERVER_VERSION,
            },
            "capabilities": {
                "tools": {},
                "resources": {},
            },
        }))
    }

    fn tools_list(&self) -> serde_json::Value {
        let tools: Vec<serde_json::Value> = self
            .catalog
            .tools_sorted()
            .into_iter()
            .map(|tool| {
                serde_json::json!({
                    "name": tool.name,
                    "description": tool.description,
                    "inputSchema": tool.input_schema,
                    "outputSchema": tool.output_schema,
                })
            })
            .collect();
        serde_json::json!({ "tools": tools })
    }

    async fn tools_call(
        &self,
        session: &str,
        params: &serde_json::Value,
    ) -> Result<serde_json::Value, McpError> {
        let start = Instant::now();
        let name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| McpError::InvalidParams("`name` is required".to_string()))?;
        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));

        let result = self.call_tool(name, &arguments).await;

        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.metrics.record(MetricUpdate::Counter { name: "tools_call" });
        self.metrics.record(MetricUpdate::HistogramMs {
            name: "tools_call_duration_ms",
            value_ms: duration_ms,
        });
        self.audit
            .record(AuditRecord {
                session: session.to_string(),
                tool: name.to_string(),
                args: self.redactor.scrub(&arguments.to_string()).into(),
                status: if result.is_ok() { "ok" } else { "error" }.to_string(),
                duration_ms,
                error: result.as_ref().err().map(|e| e.redacted_message(&self.redactor)),
            })
            .await;

        result
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: &serde_json::Value,
    ) -> Result<serde_json::Value, McpError> {
        let tool = self
            .catalog
            .tool(name)
            .ok_or_else(|| McpError::InvalidParams(format!("unknown tool `{name}`")))?;

        if let ValidationOutcome::Invalid(errors) = self.catalog.validate(name, arguments) {
            return Err(McpError::InvalidParams(errors.join("; ")));
        }

        let args = arguments
            .as_object()
            .cloned()
            .unwrap_or_default();

        let response = self.executor.call(&tool.operation, &args).await?;

        let body = serde_json::json!({
            "status": response.status,
            "content_type": response.content_type,
            "body": response.body,
        });
        Ok(serde_json::json!({
            "content": [{ "type": "text", "text": body.to_string() }],
            "isError": false,
        }))
    }

    fn resources_list(&self) -> serde_json::Value {
        let resources: Vec<serde_json::Value> = self
            .catalog
            .resources_sorted()
            .into_iter()
            .map(|resource| {
                serde_json::json!({
                    "uri": resource.uri,
                    "name": resource.name,
                    "description": resource.description,
                })
            })
            .collect();
        serde_json::json!({ "resources": resources })
    }

    fn resources_read(&self, params: &serde_json::Value) -> Result<serde_json::Value, McpError> {
        let uri = params
            .get("uri")
            .and_then(|v| v.as_str())
            .ok_or_else(|| McpError::InvalidParams("`uri` is required".to_string()))?;
        let resource = self
            .catalog
            .resource(uri)
            .ok_or_else(|| McpError::InvalidParams(format!("unknown resource `{uri}`")))?;
        Ok(serde_json::json!({
            "contents": [{
                "uri": resource.uri,
                "mimeType": "application/json",
                "text": resource.operation.input_schema.to_string(),
            }]
        }))
    }

    fn resources_templates(&self) -> serde_json::Value {
        serde_json::json!({ "resourceTemplates": [] })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gw_core::collaborators::{NullAuditSink, NullMetricsSink};
    use gw_core::model::{Operation, Service, Transport};
    use std::collections::BTreeMap;
    use std::collections::HashMap;

    fn petstore_operation() -> Operation {
        Operation {
            service_name: "petstore".into(),
            id: "listPets".into(),
            tool_name: "petstore__listPets".into(),
            transport: Transport::Http {
                method: "GET".into(),
                path_template: "/pets".into(),
            },
            parameters: vec![],
            request_body: None,
            response_schema: None,
            static_headers: BTreeMap::new(),
            dynamic_url_param: None,
            query_params_object: None,
            requires_crumb: false,
            input_schema: serde_json::json!({"type": "object"}),
            summary: Some("List pets".into()),
        }
    }

    fn dispatcher() -> Dispatcher {
        let mut service = Service::new("petstore", "https://petstore.example");
        service.operations = vec![petstore_operation()];
        let catalog = Arc::new(Catalog::build(vec![service]).unwrap());
        let executor = Arc::new(Executor::new(HashMap::new(), Arc::new(Redactor::new(Vec::<String>::new()))));
        Dispatcher::new(
            catalog,
            executor,
            Arc::new(Redactor::new(Vec::<String>::new())),
            Arc::new(NullAuditSink),
            Arc::new(NullMetricsSink),
        )
    }

    fn request(method: &str, params: serde_json::Value, id: Option<i64>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: Some("2.0".to_string()),
            method: method.to_string(),
            params,
            id: id.map(|i| serde_json::json!(i)),
        }
    }

    #[tokio::test]
    async fn ping_returns_empty_result() {
        let dispatcher = dispatcher();
        let reply = dispatcher
            .dispatch("s1", request("ping", serde_json::json!({}), Some(1)))
            .await;
        match reply {
            DispatchReply::Result(r) => assert_eq!(r.result, serde_json::json!({})),
            _ => panic!("expected a result"),
        }
    }

    #[tokio::test]
    async fn initialize_rejects_unknown_protocol_version() {
        let dispatcher = dispatcher();
        let reply = dispatcher
            .dispatch(
                "s1",
                request(
                    "initialize",
                    serde_json::json!({"protocolVersion": "1999-01-01"}),
                    Some(1),
                ),
            )
            .await;
        match reply {
            DispatchReply::Error(e) => assert_eq!(e.error.code, -32602),
            _ => panic!("expected an error"),
        }
    }

    #[tokio::test]
    async fn unknown_method_returns_32601() {
        let dispatcher = dispatcher();
        let reply = dispatcher
            .dispatch("s1", request("nonexistent/method", serde_json::json!({}), Some(1)))
            .await;
        match reply {
            DispatchReply::Error(e) => assert_eq!(e.error.code, -32601),
            _ => panic!("expected an error"),
        }
    }

    #[tokio::test]
    async fn notification_produces_no_reply() {
        let dispatcher = dispatcher();
        let reply = dispatcher
            .dispatch("s1", request("ping", serde_json::json!({}), None))
            .await;
        assert!(matches!(reply, DispatchReply::None));
    }

    #[tokio::test]
    async fn tools_list_includes_registered_tool() {
        let dispatcher = dispatcher();
        let reply = dispatcher
            .dispatch("s1", request("tools/list", serde_json::json!({}), Some(1)))
            .await;
        match reply {
            DispatchReply::Result(r) => {
                let tools = r.result["tools"].as_array().unwrap();
                assert_eq!(tools.len(), 1);
                assert_eq!(tools[0]["name"], "petstore__listPets");
            }
            _ => panic!("expected a result"),
        }
    }

    #[tokio::test]
    async fn tools_call_unknown_tool_is_invalid_params() {
        let dispatcher = dispatcher();
        let reply = dispatcher
            .dispatch(
                "s1",
                request(
                    "tools/call",
                    serde_json::json!({"name": "does__not_exist", "arguments": {}}),
                    Some(1),
                ),
            )
            .await;
        match reply {
            DispatchReply::Error(e) => assert_eq!(e.error.code, -32602),
            _ => panic!("expected an error"),
        }
    }

    #[tokio::test]
    async fn tools_call_unknown_service_surfaces_as_internal_error() {
        let dispatcher = dispatcher();
        let reply = dispatcher
            .dispatch(
                "s1",
                request(
                    "tools/call",
                    serde_json::json!({"name": "petstore__listPets", "arguments": {}}),
                    Some(1),
                ),
            )
            .await;
        match reply {
            DispatchReply::Error(e) => assert_eq!(e.error.code, -32000),
            _ => panic!("expected an error"),
        }
    }

    #[tokio::test]
    async fn resources_list_mirrors_tools() {
        let dispatcher = dispatcher();
        let reply = dispatcher
            .dispatch("s1", request("resources/list", serde_json::json!({}), Some(1)))
            .await;
        match reply {
            DispatchReply::Result(r) => {
                let resources = r.result["resources"].as_array().unwrap();
                assert_eq!(resources.len(), 1);
                assert_eq!(resources[0]["uri"], "api://petstore/listPets");
            }
            _ => panic!("expected a result"),
        }
    }
}
