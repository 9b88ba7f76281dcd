use std::fs::OpenOptions;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::memory::{MemorySessionStore, SessionState};
use super::{Identity, SessionEvent, SessionStore, SessionTokens};

#[derive(Serialize, Deserialize)]
struct PersistedSession {
    #[serde(default)]
    identity: Option<Identity>,
    tokens: SessionTokens,
}

/// Session store that survives restarts of the console by mirroring the
/// in-memory state to a JSON file.
///
/// Disk failures are logged and never fail the in-memory operation.
pub struct FileSessionStore {
    path: PathBuf,
    inner: MemorySessionStore,
}

impl FileSessionStore {
    /// Opens the store at `path`. A missing file is an empty session.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let inner = MemorySessionStore::new();

        match std::fs::read_to_string(&path) {
            Ok(raw) => {
                let persisted: PersistedSession = serde_json::from_str(&raw)
                    .with_context(|| format!("Session file '{}' is corrupt", path.display()))?;
                inner.replace(SessionState {
                    identity: persisted.identity,
                    tokens: Some(persisted.tokens),
                });
                debug!("Loaded session from {}", path.display());
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read session file '{}'", path.display()))
            }
        }

        Ok(Self { path, inner })
    }

    fn persist(&self) {
        let state = self.inner.snapshot();
        let Some(tokens) = state.tokens else {
            return;
        };
        let persisted = PersistedSession {
            identity: state.identity,
            tokens,
        };

        if let Err(e) = write_session_file(&self.path, &persisted) {
            warn!("Failed to persist session to {}: {e}", self.path.display());
        }
    }

    fn remove(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove session file {}: {e}", self.path.display()),
        }
    }
}

/// Writes the session file readable by its owner only.
fn write_session_file(path: &Path, persisted: &PersistedSession) -> Result<()> {
    let json_data = serde_json::to_string_pretty(persisted)?;
    let mut options = OpenOptions::new();
    options.truncate(true).write(true).create(true);
    #[cfg(unix)]
    {
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // `mode` only applies on creation; tighten a file left by an older run.
    #[cfg(unix)]
    {
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(json_data.as_bytes())?;
    file.flush()?;
    Ok(())
}

impl SessionStore for FileSessionStore {
    fn tokens(&self) -> Option<SessionTokens> {
        self.inner.tokens()
    }

    fn identity(&self) -> Option<Identity> {
        self.inner.identity()
    }

    fn set_auth(&self, identity: Option<Identity>, tokens: SessionTokens) {
        self.inner.set_auth(identity, tokens);
        self.persist();
    }

    fn logout(&self) {
        self.remove();
        self.inner.logout();
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.subscribe()
    }
}
