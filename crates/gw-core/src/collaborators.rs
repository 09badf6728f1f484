//! Interface-only traits for components explicitly out of scope (spec.md
//! §1, §6): the encrypted profile store, the audit sink, and the metrics
//! sink. `gw-server` wires in the no-op defaults defined here; a real
//! deployment would supply its own implementation out of process.

use async_trait::async_trait;
use serde::Serialize;

/// One structured record of a completed tool call, handed to the audit
/// sink by value (spec.md §6).
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    /// Owning session id, as a string (transport-agnostic).
    pub session: String,
    /// Tool name invoked.
    pub tool: String,
    /// Arguments passed, already redacted.
    pub args: serde_json::Value,
    /// `"ok"` or `"error"`.
    pub status: String,
    /// Wall-clock duration of the call.
    pub duration_ms: u64,
    /// Redacted error message, if the call failed.
    pub error: Option<String>,
}

/// Receives completed-call audit records. Never called synchronously on
/// the request path (spec.md §5): implementations should buffer and flush
/// on a background task.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record one completed tool call.
    async fn record(&self, record: AuditRecord);
}

/// A counter or histogram update, handed to the metrics sink by value.
#[derive(Debug, Clone)]
pub enum MetricUpdate {
    /// Increment a named counter by one.
    Counter {
        /// Metric name.
        name: &'static str,
    },
    /// Record an observation into a named histogram (milliseconds).
    HistogramMs {
        /// Metric name.
        name: &'static str,
        /// Observed value, in milliseconds.
        value_ms: u64,
    },
}

/// Receives metric updates. Non-blocking.
pub trait MetricsSink: Send + Sync {
    /// Record one metric update.
    fn record(&self, update: MetricUpdate);
}

/// No-op [`AuditSink`] wired in when no real sink is configured, so the
/// core never blocks on an unconfigured collaborator.
#[derive(Debug, Default)]
pub struct NullAuditSink;

#[async_trait]
impl AuditSink for NullAuditSink {
    async fn record(&self, _record: AuditRecord) {}
}

/// No-op [`MetricsSink`].
#[derive(Debug, Default)]
pub struct NullMetricsSink;

impl MetricsSink for NullMetricsSink {
    fn record(&self, _update: MetricUpdate) {}
}
