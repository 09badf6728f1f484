//! Turns a loaded [`GatewayConfig`] into the built catalog, executor, and
//! redactor every subcommand needs (spec.md §4: config → adapters →
//! registry → executor).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use gw_config::GatewayConfig;
use gw_core::Redactor;
use gw_executor::{Executor, ServiceContext};
use gw_registry::Catalog;

/// Everything built from one configuration document.
pub struct Wired {
    pub catalog: Arc<Catalog>,
    pub executor: Arc<Executor>,
    pub redactor: Arc<Redactor>,
}

/// Ingest every configured API, build the service-context map the executor
/// runs against, and compile the tool/resource catalog.
pub async fn build(config: &GatewayConfig) -> anyhow::Result<Wired> {
    let mut secrets = Vec::new();
    let mut services = Vec::new();
    let mut contexts = HashMap::new();

    for api in &config.apis {
        if let Some(auth) = &api.auth {
            secrets.extend(auth.secrets());
        }

        let timeout = Duration::from_secs(api.timeout_seconds.unwrap_or(config.timeout_seconds));
        let mut service = gw_adapters::ingest(api, timeout)
            .await
            .with_context(|| format!("ingesting API `{}`", api.name))?;

        if let Some(base_url) = &api.base_url_override {
            service.base_url = base_url.clone();
        }
        let auth_descriptor = api.auth.clone().map(gw_config::AuthConfig::into_descriptor);
        service.auth = auth_descriptor.clone();

        contexts.insert(
            service.name.clone(),
            ServiceContext {
                base_url: service.base_url.clone(),
                auth: auth_descriptor,
                timeout,
                retries: api.retries.unwrap_or(config.retries),
                max_response_bytes: config.max_response_bytes,
                rate_limits: gw_executor::RateLimitConfig {
                    per_minute: api.rate_limits.per_minute,
                    per_hour: api.rate_limits.per_hour,
                    per_day: api.rate_limits.per_day,
                },
            },
        );
        services.push(service);
    }

    let redactor = Arc::new(Redactor::new(secrets));
    let catalog = Arc::new(Catalog::build(services).context("building tool/resource catalog")?);
    let executor = Arc::new(Executor::new(contexts, redactor.clone()));

    Ok(Wired {
        catalog,
        executor,
        redactor,
    })
}
