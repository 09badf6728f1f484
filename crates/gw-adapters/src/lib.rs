//! Spec ingestion (spec.md §4, "Adapters"): turns one `apis[]` configuration
//! entry into a canonical [`gw_core::model::Service`], dispatching to the
//! right format adapter by explicit `spec_type` hint or, failing that,
//! content auto-detection (spec.md §9, "Dynamic-dispatch adapters").

#![forbid(unsafe_code)]

pub mod common;
pub mod error;
pub mod fetch;
pub mod google_discovery;
pub mod graphql;
pub mod grpc;
pub mod jenkins;
pub mod jira;
pub mod odata;
pub mod openapi;
pub mod openrpc;
pub mod postman;
pub mod slack;
pub mod swagger2;
pub mod wsdl;

use std::time::Duration;

use gw_config::ApiConfig;
use gw_core::model::Service;

pub use error::AdapterError;

/// Detection order for content-sniffed formats (spec.md §4.1). Hand-written
/// adapters (Jenkins/Slack/Jira) and live-discovery `grpc` are matched by
/// explicit `spec_type` before any of these run.
const DETECTORS: &[(&str, fn(&[u8]) -> bool, ParseFn)] = &[
    ("OpenAPI 3", openapi::detect, openapi::parse),
    ("Swagger 2", swagger2::detect, swagger2::parse),
    ("GraphQL", graphql::detect, graphql::parse),
    ("WSDL/SOAP", wsdl::detect, wsdl::parse),
    ("OData v4", odata::detect, odata::parse),
    ("OpenRPC", openrpc::detect, openrpc::parse),
    ("Postman", postman::detect, postman::parse),
    ("Google API Discovery", google_discovery::detect, google_discovery::parse),
];

type ParseFn = fn(&str, &[u8], Option<&str>) -> Result<Service, AdapterError>;

/// Ingest one `apis[]` entry into a canonical [`Service`] (spec.md §4.1,
/// §4.3). Hand-written adapters and gRPC never fetch a spec body; every
/// other format is fetched from `spec_file` or `spec_url` and either routed
/// by explicit `spec_type` or auto-detected in [`DETECTORS`] order.
pub async fn ingest(api: &ApiConfig, timeout: Duration) -> Result<Service, AdapterError> {
    let base_url_override = api.base_url_override.as_deref();

    match api.spec_type.as_deref() {
        Some("jenkins") => {
            let base_url = base_url_override.ok_or_else(|| AdapterError::MissingBaseUrl {
                api: api.name.clone(),
            })?;
            let allow_writes = api
                .jenkins
                .as_ref()
                .map(|j| j.allow_writes.clone())
                .unwrap_or_default();
            return Ok(jenkins::build(&api.name, base_url, &allow_writes));
        }
        Some("slack") => {
            return Ok(slack::build(&api.name, base_url_override));
        }
        Some("jira") => {
            let base_url = base_url_override.ok_or_else(|| AdapterError::MissingBaseUrl {
                api: api.name.clone(),
            })?;
            return Ok(jira::build(&api.name, base_url));
        }
        Some("grpc") => {
            let base_url = base_url_override.ok_or_else(|| AdapterError::MissingBaseUrl {
                api: api.name.clone(),
            })?;
            return grpc::discover(&api.name, base_url).await;
        }
        _ => {}
    }

    let source = api
        .spec_file
        .as_deref()
        .or(api.spec_url.as_deref())
        .ok_or_else(|| AdapterError::MissingBaseUrl {
            api: api.name.clone(),
        })?;
    let raw = fetch::fetch(&api.name, source, timeout).await?;

    if let Some(hint) = api.spec_type.as_deref() {
        let parse: Option<ParseFn> = match hint {
            "openapi" | "openapi3" => Some(openapi::parse),
            "swagger2" | "swagger" => Some(swagger2::parse),
            "graphql" => Some(graphql::parse),
            "wsdl" | "soap" => Some(wsdl::parse),
            "odata" => Some(odata::parse),
            "openrpc" | "json-rpc" => Some(openrpc::parse),
            "postman" => Some(postman::parse),
            "google-discovery" => Some(google_discovery::parse),
            _ => None,
        };
        if let Some(parse) = parse {
            return parse(&api.name, &raw, base_url_override);
        }
    }

    for (_, detect, parse) in DETECTORS {
        if detect(&raw) {
            return parse(&api.name, &raw, base_url_override);
        }
    }

    Err(AdapterError::UndetectableFormat {
        api: api.name.clone(),
    })
}
