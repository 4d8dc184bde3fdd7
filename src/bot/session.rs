//! Per-conversation session state.
//!
//! A [`Session`] holds the progress of one encode or decode flow. Buffered
//! secret text and uploaded files live inside the state itself, so a state
//! that needs a buffer always has one, and every buffer is zeroized when the
//! state is replaced or the session is dropped.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use zeroize::Zeroizing;

use super::event::SessionId;

/// Input buffered while waiting for the password.
pub enum Pending {
    /// Secret text to hide.
    Secret(Zeroizing<String>),
    /// Uploaded stego PNG to open.
    Stego(Zeroizing<Vec<u8>>),
}

/// Position in the encode or decode flow.
#[derive(Default)]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingSecretText,
    AwaitingFile,
    AwaitingPassword(Pending),
}

/// Buffer-free view of [`SessionState`], for matching and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    AwaitingSecretText,
    AwaitingFile,
    AwaitingEncodePassword,
    AwaitingDecodePassword,
}

/// RAM-only state of one conversation.
pub struct Session {
    id: SessionId,
    state: SessionState,
    last_activity: Instant,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            state: SessionState::Idle,
            last_activity: Instant::now(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn stage(&self) -> Stage {
        match &self.state {
            SessionState::Idle => Stage::Idle,
            SessionState::AwaitingSecretText => Stage::AwaitingSecretText,
            SessionState::AwaitingFile => Stage::AwaitingFile,
            SessionState::AwaitingPassword(Pending::Secret(_)) => Stage::AwaitingEncodePassword,
            SessionState::AwaitingPassword(Pending::Stego(_)) => Stage::AwaitingDecodePassword,
        }
    }

    /// Start the encode flow, discarding anything buffered.
    pub fn begin_encode(&mut self) {
        self.state = SessionState::AwaitingSecretText;
    }

    /// Start the decode flow, discarding anything buffered.
    pub fn begin_decode(&mut self) {
        self.state = SessionState::AwaitingFile;
    }

    /// Buffer the secret text and wait for the password.
    pub fn store_secret(&mut self, text: Zeroizing<String>) {
        self.state = SessionState::AwaitingPassword(Pending::Secret(text));
    }

    /// Buffer the uploaded file and wait for the password.
    pub fn store_stego(&mut self, bytes: Zeroizing<Vec<u8>>) {
        self.state = SessionState::AwaitingPassword(Pending::Stego(bytes));
    }

    /// Take the buffered input, leaving the session idle.
    ///
    /// Returns `None` (and still resets) when no password was awaited.
    pub fn take_pending(&mut self) -> Option<Pending> {
        match std::mem::take(&mut self.state) {
            SessionState::AwaitingPassword(pending) => Some(pending),
            _ => None,
        }
    }

    /// Drop every buffer and return to idle.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
    }

    /// Record activity now.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Time since the last recorded activity.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }
}

/// Shared handle to one session. Holding the lock serializes its events.
pub type SessionSlot = Arc<Mutex<Session>>;

/// Table of live sessions keyed by conversation identity.
#[derive(Default)]
pub struct SessionTable {
    sessions: Mutex<HashMap<SessionId, SessionSlot>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the session for `id`, creating an idle one on first contact.
    pub async fn get_or_create(&self, id: SessionId) -> SessionSlot {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(id))))
            .clone()
    }

    /// Get the session for `id` if it exists.
    pub async fn get(&self, id: SessionId) -> Option<SessionSlot> {
        self.sessions.lock().await.get(&id).cloned()
    }

    /// Number of sessions currently held.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Evict sessions idle for longer than `max_idle`.
    ///
    /// Sessions that are locked, or whose slot has been handed out and not yet
    /// released, are skipped. Returns the number evicted.
    pub async fn sweep_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();

        sessions.retain(|_, slot| {
            // The table owns one reference; any other is an event in flight.
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(session) => session.idle_for(now) <= max_idle,
                Err(_) => true,
            }
        });

        before - sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_flow_stages() {
        let mut session = Session::new(SessionId(1));
        assert_eq!(session.stage(), Stage::Idle);

        session.begin_encode();
        assert_eq!(session.stage(), Stage::AwaitingSecretText);

        session.store_secret(Zeroizing::new("hi".to_string()));
        assert_eq!(session.stage(), Stage::AwaitingEncodePassword);

        match session.take_pending() {
            Some(Pending::Secret(text)) => assert_eq!(text.as_str(), "hi"),
            _ => panic!("expected buffered secret"),
        }
        assert_eq!(session.stage(), Stage::Idle);
    }

    #[test]
    fn test_decode_flow_stages() {
        let mut session = Session::new(SessionId(2));
        session.begin_decode();
        assert_eq!(session.stage(), Stage::AwaitingFile);

        session.store_stego(Zeroizing::new(vec![1, 2, 3]));
        assert_eq!(session.stage(), Stage::AwaitingDecodePassword);

        match session.take_pending() {
            Some(Pending::Stego(bytes)) => assert_eq!(bytes.as_slice(), &[1, 2, 3]),
            _ => panic!("expected buffered file"),
        }
    }

    #[test]
    fn test_take_pending_without_password_state() {
        let mut session = Session::new(SessionId(3));
        session.begin_encode();

        assert!(session.take_pending().is_none());
        assert_eq!(session.stage(), Stage::Idle);
    }

    #[test]
    fn test_restart_discards_buffer() {
        let mut session = Session::new(SessionId(4));
        session.store_secret(Zeroizing::new("old".to_string()));
        session.begin_decode();

        assert_eq!(session.stage(), Stage::AwaitingFile);
        assert!(session.take_pending().is_none());
    }

    #[tokio::test]
    async fn test_table_returns_same_slot() {
        let table = SessionTable::new();
        let a = table.get_or_create(SessionId(7)).await;
        let b = table.get_or_create(SessionId(7)).await;

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(table.len().await, 1);
        assert!(table.get(SessionId(8)).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_evicts_only_stale_sessions() {
        let table = SessionTable::new();
        table.get_or_create(SessionId(1)).await;

        tokio::time::advance(Duration::from_secs(600)).await;
        let fresh = table.get_or_create(SessionId(2)).await;
        fresh.lock().await.touch();

        tokio::time::advance(Duration::from_secs(400)).await;
        let evicted = table.sweep_idle(Duration::from_secs(900)).await;

        assert_eq!(evicted, 1);
        assert!(table.get(SessionId(1)).await.is_none());
        assert!(table.get(SessionId(2)).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_skips_busy_sessions() {
        let table = SessionTable::new();
        let slot = table.get_or_create(SessionId(1)).await;
        let _guard = slot.lock().await;

        tokio::time::advance(Duration::from_secs(3600)).await;
        assert_eq!(table.sweep_idle(Duration::from_secs(60)).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_keeps_slot_handed_out_but_not_locked() {
        let table = SessionTable::new();
        table.get_or_create(SessionId(1)).await;
        tokio::time::advance(Duration::from_secs(3600)).await;

        // An event has fetched the slot but not yet taken its lock.
        let slot = table.get_or_create(SessionId(1)).await;
        assert_eq!(table.sweep_idle(Duration::from_secs(60)).await, 0);

        {
            let mut session = slot.lock().await;
            session.begin_encode();
            session.touch();
        }
        drop(slot);

        let again = table.get_or_create(SessionId(1)).await;
        assert_eq!(again.lock().await.stage(), Stage::AwaitingSecretText);
        assert_eq!(table.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_evicts_released_stale_slot() {
        let table = SessionTable::new();
        let slot = table.get_or_create(SessionId(1)).await;
        drop(slot);

        tokio::time::advance(Duration::from_secs(3600)).await;
        assert_eq!(table.sweep_idle(Duration::from_secs(60)).await, 1);
        assert!(table.is_empty().await);
    }
}
