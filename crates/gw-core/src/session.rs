//! MCP session state (spec.md §3, "Session") and its event ring buffer.
//!
//! The transport layer (`gw-transport-http`) owns the session *store* (a
//! `RwLock<HashMap<SessionId, Session>>`) and the outbound event channel;
//! this module owns the session's own fields and its fixed-capacity event
//! buffer, which is protocol-agnostic.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque session identifier: 128 bits of entropy, hex-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a new id from 128 bits of randomness.
    #[must_use]
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One buffered SSE event: a monotonic per-session counter and its
/// serialized JSON-RPC payload.
#[derive(Debug, Clone)]
pub struct BufferedEvent {
    /// Monotonically increasing (by one) per session.
    pub counter: u64,
    /// The event's JSON-RPC payload, already serialized.
    pub data: String,
}

/// Fixed-capacity ring buffer of recently emitted events, used to replay
/// events after a `Last-Event-ID` reconnect (spec.md §4.5, "Resumability").
///
/// New pushes evict the oldest entry once at capacity; resumption is a
/// linear scan, "acceptable at the default capacity of 100" (spec.md §9).
#[derive(Debug)]
pub struct EventRing {
    capacity: usize,
    events: VecDeque<BufferedEvent>,
    next_counter: u64,
}

impl EventRing {
    /// Default capacity per spec.md §3.
    pub const DEFAULT_CAPACITY: usize = 100;

    /// Build a ring of the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            events: VecDeque::with_capacity(capacity),
            next_counter: 1,
        }
    }

    /// Push a new event, assigning it the next monotonic counter, and
    /// return the event so the caller can send it live.
    pub fn push(&mut self, data: String) -> BufferedEvent {
        let event = BufferedEvent {
            counter: self.next_counter,
            data,
        };
        self.next_counter += 1;
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event.clone());
        event
    }

    /// Every buffered event whose counter is strictly greater than `after`,
    /// in counter order. Events evicted from the ring are simply absent —
    /// replay is best-effort, per spec.md §4.5.
    #[must_use]
    pub fn replay_after(&self, after: u64) -> Vec<BufferedEvent> {
        self.events
            .iter()
            .filter(|e| e.counter > after)
            .cloned()
            .collect()
    }

    /// The most recently assigned counter, or 0 if nothing has been pushed.
    #[must_use]
    pub fn last_counter(&self) -> u64 {
        self.next_counter - 1
    }
}

impl Clone for BufferedEvent {
    fn clone(&self) -> Self {
        Self {
            counter: self.counter,
            data: self.data.clone(),
        }
    }
}

/// A client-supplied info snapshot captured at `initialize` time.
pub type ClientInfo = serde_json::Value;

/// An MCP interaction scope over Streamable-HTTP (spec.md §3, "Session").
#[derive(Debug)]
pub struct Session {
    /// Opaque identifier sent back as `Mcp-Session-Id`.
    pub id: SessionId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last time any request touched this session.
    pub last_used: DateTime<Utc>,
    /// Bounded ring buffer of recently emitted SSE events.
    pub events: EventRing,
    /// Client info captured from the `initialize` call, if any.
    pub client_info: Option<ClientInfo>,
}

impl Session {
    /// Create a new session with the default ring-buffer capacity.
    #[must_use]
    pub fn new(now: DateTime<Utc>, client_info: Option<ClientInfo>) -> Self {
        Self {
            id: SessionId::generate(),
            created_at: now,
            last_used: now,
            events: EventRing::new(EventRing::DEFAULT_CAPACITY),
            client_info,
        }
    }

    /// Whether this session has been idle longer than `ceiling_seconds`
    /// as of `now` (spec.md §3: default ceiling one hour).
    #[must_use]
    pub fn is_idle_beyond(&self, ceiling_seconds: i64, now: DateTime<Utc>) -> bool {
        (now - self.last_used).num_seconds() > ceiling_seconds
    }

    /// Mark the session as touched at `now`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_used = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn ring_buffer_assigns_monotonic_counters() {
        let mut ring = EventRing::new(3);
        let e1 = ring.push("one".into());
        let e2 = ring.push("two".into());
        assert_eq!(e1.counter, 1);
        assert_eq!(e2.counter, 2);
    }

    #[test]
    fn ring_buffer_evicts_oldest_at_capacity() {
        let mut ring = EventRing::new(2);
        ring.push("a".into());
        ring.push("b".into());
        ring.push("c".into());
        let all = ring.replay_after(0);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].data, "b");
        assert_eq!(all[1].data, "c");
    }

    #[test]
    fn replay_after_excludes_the_given_counter() {
        let mut ring = EventRing::new(10);
        ring.push("a".into());
        let e2 = ring.push("b".into());
        ring.push("c".into());
        let replayed = ring.replay_after(e2.counter);
        assert_eq!(replayed.len(), 1);
        assert_eq!(replayed[0].data, "c");
    }

    #[test]
    fn replay_beyond_ring_contents_is_empty() {
        let mut ring = EventRing::new(2);
        ring.push("a".into());
        ring.push("b".into());
        ring.push("c".into());
        // counter 1 ("a") was evicted; asking to replay after it anyway
        // should just return whatever survives, not error.
        assert!(ring.replay_after(100).is_empty());
    }

    #[test]
    fn idle_detection_respects_ceiling() {
        let now = Utc::now();
        let mut session = Session::new(now, None);
        assert!(!session.is_idle_beyond(3600, now));
        session.last_used = now - chrono::Duration::hours(2);
        assert!(session.is_idle_beyond(3600, now));
    }
}
