use std::sync::RwLock;

use tokio::sync::broadcast;

use super::{Identity, SessionEvent, SessionStore, SessionTokens};

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone, Default)]
pub(crate) struct SessionState {
    pub identity: Option<Identity>,
    pub tokens: Option<SessionTokens>,
}

/// In-process session store. Cheap to share behind an `Arc`.
pub struct MemorySessionStore {
    state: RwLock<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: RwLock::new(SessionState::default()),
            events,
        }
    }

    pub fn with_tokens(identity: Option<Identity>, tokens: SessionTokens) -> Self {
        let store = Self::new();
        store.replace(SessionState {
            identity,
            tokens: Some(tokens),
        });
        store
    }

    pub(crate) fn snapshot(&self) -> SessionState {
        match self.state.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Swaps the state without emitting an event. Used when loading from disk.
    pub(crate) fn replace(&self, next: SessionState) {
        match self.state.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemorySessionStore {
    fn tokens(&self) -> Option<SessionTokens> {
        self.snapshot().tokens
    }

    fn identity(&self) -> Option<Identity> {
        self.snapshot().identity
    }

    fn set_auth(&self, identity: Option<Identity>, tokens: SessionTokens) {
        self.replace(SessionState {
            identity,
            tokens: Some(tokens),
        });
        self.emit(SessionEvent::Authenticated);
    }

    fn logout(&self) {
        self.replace(SessionState::default());
        self.emit(SessionEvent::LoggedOut);
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
