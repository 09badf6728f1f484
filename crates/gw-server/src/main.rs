//! CLI entrypoint for the MCP gateway (spec.md §4.7, §6).
//!
//! # Subcommands
//!
//! ```text
//! gw-server run --config gateway.yaml --transport stdio
//! gw-server run --config gateway.yaml --transport http --bind 0.0.0.0:8080
//! gw-server validate --config gateway.yaml
//! gw-server inspect --config gateway.yaml
//! ```

#![forbid(unsafe_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use gw_core::collaborators::{NullAuditSink, NullMetricsSink};

/// Protocol-adapting MCP gateway.
#[derive(Parser)]
#[command(name = "gw-server", version, about)]
enum Cli {
    /// Load the configuration, wire every backend, and serve MCP over the
    /// chosen transport until shutdown.
    Run(RunArgs),

    /// Load and ingest the configuration without serving; exits non-zero
    /// on any adapter or registry error.
    Validate(ConfigArgs),

    /// Load the configuration and print the resulting tool catalog as JSON.
    Inspect(ConfigArgs),
}

#[derive(Parser)]
struct ConfigArgs {
    /// Path to the gateway configuration file (YAML or JSON).
    #[arg(short, long)]
    config: PathBuf,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum TransportKind {
    Stdio,
    Http,
}

#[derive(Parser)]
struct RunArgs {
    /// Path to the gateway configuration file (YAML or JSON).
    #[arg(short, long)]
    config: PathBuf,

    /// Which transport to serve MCP over.
    #[arg(long, value_enum, default_value = "stdio")]
    transport: TransportKind,

    /// Address to bind the Streamable-HTTP transport to. Ignored for `stdio`.
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// Require this bearer token on every `/mcp` request. Ignored for `stdio`.
    #[arg(long)]
    bearer_token: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse() {
        Cli::Run(args) => run(args).await,
        Cli::Validate(args) => validate(args).await,
        Cli::Inspect(args) => inspect(args).await,
    }
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = gw_config::load_file(&args.config)
        .with_context(|| format!("loading config {}", args.config.display()))?;
    let wired = gw_server::wiring::build(&config).await?;

    let dispatcher = Arc::new(gw_mcp::Dispatcher::new(
        wired.catalog,
        wired.executor,
        wired.redactor,
        Arc::new(NullAuditSink),
        Arc::new(NullMetricsSink),
    ));

    match args.transport {
        TransportKind::Stdio => {
            tracing::info!("serving MCP over STDIO");
            gw_transport_stdio::run(dispatcher).await;
        }
        TransportKind::Http => {
            let state = gw_transport_http::AppState::new(dispatcher, args.bearer_token);
            let sweeper_state = state.clone();
            tokio::spawn(gw_transport_http::run_sweeper(sweeper_state));

            let router = gw_transport_http::router(state);
            let listener = tokio::net::TcpListener::bind(args.bind)
                .await
                .with_context(|| format!("binding {}", args.bind))?;
            tracing::info!(addr = %args.bind, "serving MCP over Streamable-HTTP");
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("HTTP server failed")?;
        }
    }

    Ok(())
}

async fn validate(args: ConfigArgs) -> anyhow::Result<()> {
    let config = gw_config::load_file(&args.config)
        .with_context(|| format!("loading config {}", args.config.display()))?;
    let wired = gw_server::wiring::build(&config).await?;
    eprintln!(
        "ok: {} API(s), {} tool(s), {} resource(s)",
        config.apis.len(),
        wired.catalog.tools_sorted().len(),
        wired.catalog.resources_sorted().len(),
    );
    Ok(())
}

async fn inspect(args: ConfigArgs) -> anyhow::Result<()> {
    let config = gw_config::load_file(&args.config)
        .with_context(|| format!("loading config {}", args.config.display()))?;
    let wired = gw_server::wiring::build(&config).await?;

    let tools: Vec<serde_json::Value> = wired
        .catalog
        .tools_sorted()
        .into_iter()
        .map(|tool| {
            serde_json::json!({
                "name": tool.name,
                "description": tool.description,
                "inputSchema": tool.input_schema,
            })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "tools": tools }))?);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
