//! Background idle-session sweeper (spec.md §4.5, "background sweeper").

use std::time::Duration;

use crate::state::AppState;

/// How often the sweeper checks for idle sessions. Independent of the
/// idle ceiling itself, which is configured per deployment.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Run forever, periodically removing sessions idle beyond
/// `state.idle_ceiling_seconds`. Intended to be spawned once via
/// `tokio::spawn` alongside the HTTP server.
pub async fn run(state: AppState) {
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        let swept = state.sessions.sweep_idle(state.idle_ceiling_seconds).await;
        if swept > 0 {
            tracing::info!(count = swept, "swept idle sessions");
        }
    }
}
