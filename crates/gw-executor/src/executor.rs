//! The top-level [`Executor`]: ties URL resolution, query assembly, auth,
//! CSRF crumbs, body marshalling, retry/backoff, and response normalization
//! into the single `call()` entry point (spec.md §4.3).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use gw_core::model::{Operation, Transport};
use gw_core::{AuthDescriptor, Redactor};

use crate::auth::{self, OAuthTokenCache};
use crate::body::{self, AssembledBody};
use crate::crumb::CrumbCache;
use crate::error::ExecutorError;
use crate::query;
use crate::ratelimit::{RateLimitConfig, ServiceRateLimiter};
use crate::response::{self, ExecutorResponse};
use crate::retry;
use crate::url_resolve;

/// Everything about a backend service the executor needs at call time, as
/// opposed to at catalog-build time — [`gw_registry::Catalog`] only keeps
/// the [`Operation`]s, so the caller must capture this separately from the
/// same [`gw_core::Service`] values before handing them to the registry.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    /// Resolved base URL.
    pub base_url: String,
    /// Auth descriptor, if any.
    pub auth: Option<AuthDescriptor>,
    /// Per-backend-call timeout.
    pub timeout: Duration,
    /// Retry ceiling (`0` means one attempt total).
    pub retries: u32,
    /// Response truncation ceiling, in bytes.
    pub max_response_bytes: usize,
    /// Rate-limit ceilings for this service (`0` fields mean unlimited).
    pub rate_limits: RateLimitConfig,
}

/// Executes [`Operation`]s against their backend services end to end.
pub struct Executor {
    client: reqwest::Client,
    contexts: HashMap<String, ServiceContext>,
    crumbs: CrumbCache,
    oauth: Arc<OAuthTokenCache>,
    redactor: Arc<Redactor>,
    limiters: HashMap<String, ServiceRateLimiter>,
}

impl Executor {
    /// Build an executor over the given per-service contexts.
    #[must_use]
    pub fn new(contexts: HashMap<String, ServiceContext>, redactor: Arc<Redactor>) -> Self {
        let limiters = contexts
            .iter()
            .filter(|(_, ctx)| !ctx.rate_limits.is_unlimited())
            .map(|(name, ctx)| (name.clone(), ServiceRateLimiter::new(ctx.rate_limits)))
            .collect();
        Self {
            client: reqwest::Client::new(),
            contexts,
            crumbs: CrumbCache::new(),
            oauth: Arc::new(OAuthTokenCache::new()),
            redactor,
            limiters,
        }
    }

    /// Execute `operation` with validated `args`, returning the normalized
    /// `{status, content_type, body}` response (spec.md §4.3, all steps).
    pub async fn call(
        &self,
        operation: &Operation,
        args: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<ExecutorResponse, ExecutorError> {
        let context = self
            .contexts
            .get(&operation.service_name)
            .ok_or_else(|| ExecutorError::UnknownService(operation.service_name.clone()))?;

        if let Some(limiter) = self.limiters.get(&operation.service_name) {
            if !limiter.try_acquire() {
                return Err(ExecutorError::RateLimitExceeded(operation.service_name.clone()));
            }
        }

        // `Grpc` has no `tonic::transport::Channel` dispatch path (known
        // spec deviation, see DESIGN.md `gw-executor`): it is routed
        // through the same JSON-over-HTTP path as everything else below,
        // to `/{service}/{method}` so distinct methods at least land on
        // distinct URLs.
        let grpc_path;
        let path_template = match &operation.transport {
            Transport::Http { path_template, .. } => path_template.as_str(),
            Transport::Grpc { service, method } => {
                grpc_path = format!("/{service}/{method}");
                grpc_path.as_str()
            }
            _ => "",
        };
        let url = url_resolve::resolve_url(operation, &context.base_url, args, path_template)?;

        let method = request_method(operation);
        let query_pairs = query::build_query_pairs(operation, args);
        let assembled_body = body::assemble_body(operation, args)?;

        let mut headers = reqwest::header::HeaderMap::new();
        for (name, value) in &operation.static_headers {
            insert_header(&mut headers, name, value);
        }
        for parameter in &operation.parameters {
            if parameter.location == gw_core::model::ParameterLocation::Header {
                if let Some(value) = args.get(&parameter.name).and_then(|v| v.as_str()) {
                    insert_header(&mut headers, &parameter.name, value);
                }
            }
        }
        if let Some(auth) = &context.auth {
            let (name, value) =
                auth::auth_header(auth, &operation.service_name, &self.client, &self.oauth, &self.redactor)
                    .await?;
            insert_header(&mut headers, &name, &value);
        }
        if operation.requires_crumb {
            if let Some((field, token)) = self
                .crumbs
                .header_for(&operation.service_name, &context.base_url, &self.client)
                .await?
            {
                insert_header(&mut headers, &field, &token);
            }
        }

        let (status, content_type, raw) = self
            .send_with_retry(operation, context, &method, &url, &query_pairs, &headers, &assembled_body)
            .await?;

        Ok(response::normalize(operation, status, &content_type, &raw, context.max_response_bytes))
    }

    #[allow(clippy::too_many_arguments)]
    async fn send_with_retry(
        &self,
        operation: &Operation,
        context: &ServiceContext,
        method: &str,
        url: &str,
        query_pairs: &[(String, String)],
        headers: &reqwest::header::HeaderMap,
        body: &AssembledBody,
    ) -> Result<(u16, String, Vec<u8>), ExecutorError> {
        let max_attempts = retry::max_attempts(method, context.retries);
        let mut attempt = 0u32;

        loop {
            let request = self.build_request(method, url, query_pairs, headers, body, context.timeout)?;
            let outcome = request.send().await;

            match outcome {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if attempt + 1 < max_attempts && retry::retry_on_status(method, status) {
                        let delay = response
                            .headers()
                            .get(reqwest::header::RETRY_AFTER)
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| retry::parse_retry_after(v, chrono::Utc::now()))
                            .unwrap_or_else(|| retry::backoff(attempt));
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    let content_type = response
                        .headers()
                        .get(reqwest::header::CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let raw = response.bytes().await.map_err(|e| ExecutorError::BackendTransport {
                        service: operation.service_name.clone(),
                        message: self.redactor.scrub(&e.to_string()),
                    })?;

                    if retry::retry_on_status(method, status) {
                        // Retries exhausted on a status that was otherwise retryable.
                        let decoded = response::normalize(operation, status, &content_type, &raw, raw.len());
                        return Err(ExecutorError::BackendHttp {
                            service: operation.service_name.clone(),
                            status,
                            body: decoded.body,
                        });
                    }

                    return Ok((status, content_type, raw.to_vec()));
                }
                Err(e) => {
                    let retryable = retry::retry_on_network_error(method);
                    if retryable && attempt + 1 < max_attempts {
                        tokio::time::sleep(retry::backoff(attempt)).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(ExecutorError::BackendTransport {
                        service: operation.service_name.clone(),
                        message: self.redactor.scrub(&e.to_string()),
                    });
                }
            }
        }
    }

    fn build_request(
        &self,
        method: &str,
        url: &str,
        query_pairs: &[(String, String)],
        headers: &reqwest::header::HeaderMap,
        body: &AssembledBody,
        timeout: Duration,
    ) -> Result<reqwest::RequestBuilder, ExecutorError> {
        let verb = reqwest::Method::from_bytes(method.as_bytes())
            .unwrap_or(reqwest::Method::GET);
        let mut request = self
            .client
            .request(verb, url)
            .timeout(timeout)
            .headers(headers.clone())
            .query(query_pairs);

        request = match body {
            AssembledBody::None => request,
            AssembledBody::Json(value) => request.json(value),
            AssembledBody::Raw { content_type, text } => request
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(text.clone()),
        };

        Ok(request)
    }
}

fn request_method(operation: &Operation) -> String {
    match &operation.transport {
        Transport::Http { method, .. } => method.clone(),
        Transport::Grpc { .. } => "POST".to_string(),
        Transport::Soap(_) | Transport::GraphQl(_) | Transport::JsonRpc { .. } => "POST".to_string(),
    }
}

fn insert_header(headers: &mut reqwest::header::HeaderMap, name: &str, value: &str) {
    if let (Ok(name), Ok(value)) = (
        reqwest::header::HeaderName::from_bytes(name.as_bytes()),
        reqwest::header::HeaderValue::from_str(value),
    ) {
        headers.insert(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn http_get_operation() -> Operation {
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
            input_schema: serde_json::json!({}),
            summary: None,
        }
    }

    #[test]
    fn unknown_service_is_rejected_before_any_network_call() {
        let executor = Executor::new(HashMap::new(), Arc::new(Redactor::new(Vec::<String>::new())));
        let operation = http_get_operation();
        let args = serde_json::Map::new();
        let result = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(executor.call(&operation, &args));
        assert!(matches!(result.unwrap_err(), ExecutorError::UnknownService(s) if s == "petstore"));
    }

    #[test]
    fn exhausted_rate_limit_is_rejected_before_any_network_call() {
        let mut contexts = HashMap::new();
        contexts.insert(
            "petstore".to_string(),
            ServiceContext {
                // Port 1 on loopback: nothing listens there, so the
                // connection is refused immediately without any DNS
                // lookup or real network access.
                base_url: "http://127.0.0.1:1".into(),
                auth: None,
                timeout: Duration::from_secs(10),
                retries: 0,
                max_response_bytes: 1024,
                rate_limits: crate::RateLimitConfig {
                    per_minute: 1,
                    per_hour: 0,
                    per_day: 0,
                },
            },
        );
        let executor = Executor::new(contexts, Arc::new(Redactor::new(Vec::<String>::new())));
        let operation = http_get_operation();
        let args = serde_json::Map::new();
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();

        // First call consumes the single per-minute slot; it still fails
        // (no real backend to reach) but not with RateLimitExceeded.
        let first = rt.block_on(executor.call(&operation, &args));
        assert!(!matches!(first.unwrap_err(), ExecutorError::RateLimitExceeded(_)));

        let second = rt.block_on(executor.call(&operation, &args));
        assert!(matches!(second.unwrap_err(), ExecutorError::RateLimitExceeded(s) if s == "petstore"));
    }

    #[test]
    fn request_method_defaults_soap_and_graphql_to_post() {
        let mut op = http_get_operation();
        op.transport = Transport::Soap(gw_core::model::SoapDescriptor {
            namespace: "ns".into(),
        });
        assert_eq!(request_method(&op), "POST");
    }

    /// `Grpc` is sent as JSON-over-HTTP, not a real unary call (known
    /// deviation, see DESIGN.md); this only pins down that the fallback
    /// path at least routes distinct methods to distinct URLs instead of
    /// collapsing every gRPC operation onto the bare service base URL.
    #[test]
    fn grpc_json_over_http_fallback_routes_by_service_and_method() {
        let mut op = http_get_operation();
        op.transport = Transport::Grpc {
            service: "drive.v1.FileService".into(),
            method: "GetFile".into(),
        };
        let grpc_path;
        let path_template = match &op.transport {
            Transport::Http { path_template, .. } => path_template.as_str(),
            Transport::Grpc { service, method } => {
                grpc_path = format!("/{service}/{method}");
                grpc_path.as_str()
            }
            _ => "",
        };
        let url = url_resolve::resolve_url(&op, "https://grpc.example.com", &serde_json::Map::new(), path_template)
            .unwrap();
        assert_eq!(url, "https://grpc.example.com/drive.v1.FileService/GetFile");
    }
}
