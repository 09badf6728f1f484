//! Shared session store and application state (spec.md §4.5, §5).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use gw_core::session::{Session, SessionId};
use tokio::sync::{mpsc, Mutex, RwLock};

/// Capacity of each session's outbound event channel (spec.md §5,
/// "Back-pressure").
const EVENT_CHANNEL_CAPACITY: usize = 128;

/// Default inactivity ceiling before the sweeper terminates a session
/// (spec.md §3: "default ceiling one hour").
pub const DEFAULT_IDLE_CEILING_SECONDS: i64 = 3600;

/// One tracked session plus the live SSE sender, if a GET stream is
/// currently attached (spec.md §9: "each event is delivered to exactly one
/// stream (first-ready)").
pub struct SessionSlot {
    pub session: Session,
    pub live_tx: Option<mpsc::Sender<String>>,
}

/// Read-write-locked session map; the store itself, not any one session's
/// fields (spec.md §5, "Session store").
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Arc<Mutex<SessionSlot>>>>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create and register a new session, returning its id.
    pub async fn create(&self, client_info: Option<serde_json::Value>) -> SessionId {
        let session = Session::new(Utc::now(), client_info);
        let id = session.id.clone();
        let slot = Arc::new(Mutex::new(SessionSlot {
            session,
            live_tx: None,
        }));
        self.sessions.write().await.insert(id.clone(), slot);
        id
    }

    /// Look up a session's slot by id, touching its `last_used` timestamp.
    pub async fn touch(&self, id: &SessionId) -> Option<Arc<Mutex<SessionSlot>>> {
        let sessions = self.sessions.read().await;
        let slot = sessions.get(id)?.clone();
        {
            let mut guard = slot.lock().await;
            guard.session.touch(Utc::now());
        }
        Some(slot)
    }

    /// Whether `id` is currently a registered session (no touch side effect).
    pub async fn contains(&self, id: &SessionId) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    /// Remove a session entirely (spec.md §4.5: `DELETE` transitions to
    /// `Terminated` and closes the event channel).
    pub async fn remove(&self, id: &SessionId) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Attach a fresh outbound channel to `id`'s slot, returning the
    /// receiver half for the new SSE stream. Replaces any previously
    /// attached sender (a reconnect supersedes the old stream).
    pub async fn attach_stream(&self, id: &SessionId) -> Option<mpsc::Receiver<String>> {
        let slot = self.touch(id).await?;
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        slot.lock().await.live_tx = Some(tx);
        Some(rx)
    }

    /// Push `data` onto `id`'s ring buffer and, if a live stream is
    /// attached, attempt to deliver it immediately. A full channel is
    /// dropped and logged at warn (spec.md §5, "Back-pressure") — the ring
    /// buffer still retains the event for resumption.
    pub async fn emit(&self, id: &SessionId, data: String) -> Option<u64> {
        let slot = self.touch(id).await?;
        let mut guard = slot.lock().await;
        let event = guard.session.events.push(data.clone());
        if let Some(tx) = &guard.live_tx {
            if tx.try_send(data).is_err() {
                tracing::warn!(session = %id, counter = event.counter, "dropping SSE event: channel full or closed");
            }
        }
        Some(event.counter)
    }

    /// Sweep every session idle beyond `ceiling_seconds`, removing it from
    /// the store (spec.md §4.5, "background sweeper").
    pub async fn sweep_idle(&self, ceiling_seconds: i64) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let stale: Vec<SessionId> = {
            let mut ids = Vec::new();
            for (id, slot) in sessions.iter() {
                if slot.lock().await.session.is_idle_beyond(ceiling_seconds, now) {
                    ids.push(id.clone());
                }
            }
            ids
        };
        for id in &stale {
            sessions.remove(id);
        }
        stale.len()
    }
}

/// Application state shared across every `/mcp` handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<gw_mcp::Dispatcher>,
    pub sessions: SessionStore,
    /// Idle ceiling in seconds before the sweeper terminates a session.
    pub idle_ceiling_seconds: i64,
    /// Required inbound bearer token, if the deployment configured one.
    /// `None` means incoming requests are not authenticated at this layer
    /// (upstream auth, e.g. a reverse proxy, is assumed).
    pub inbound_bearer_token: Option<String>,
}

impl AppState {
    #[must_use]
    pub fn new(dispatcher: Arc<gw_mcp::Dispatcher>, inbound_bearer_token: Option<String>) -> Self {
        Self {
            dispatcher,
            sessions: SessionStore::new(),
            idle_ceiling_seconds: DEFAULT_IDLE_CEILING_SECONDS,
            inbound_bearer_token,
        }
    }
}
