//! Session Store: holds the credential pair and the signed-in identity.
//!
//! The client reads and writes credentials only through [`SessionStore`]; it
//! never persists them itself. `logout()` clears state and broadcasts
//! [`SessionEvent::LoggedOut`]. Anything that must react to a forced logout
//! (prompting for sign-in, resetting views) subscribes to the event instead of
//! being called from inside the renewal path.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

pub mod file;
pub mod memory;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl SessionTokens {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
        }
    }

    pub fn access(&self) -> Option<&str> {
        non_blank(&self.access_token)
    }

    pub fn refresh(&self) -> Option<&str> {
        self.refresh_token.as_deref().and_then(non_blank)
    }
}

// Tokens must never reach the logs.
impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Opaque user record, passed through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(pub Value);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Authenticated,
    LoggedOut,
}

pub trait SessionStore: Send + Sync {
    fn tokens(&self) -> Option<SessionTokens>;

    fn identity(&self) -> Option<Identity>;

    fn set_auth(&self, identity: Option<Identity>, tokens: SessionTokens);

    /// Clears credentials and identity, then emits [`SessionEvent::LoggedOut`].
    fn logout(&self);

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;

    fn access_token(&self) -> Option<String> {
        self.tokens()
            .and_then(|t| t.access().map(str::to_string))
    }

    fn refresh_token(&self) -> Option<String> {
        self.tokens()
            .and_then(|t| t.refresh().map(str::to_string))
    }
}

fn non_blank(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
