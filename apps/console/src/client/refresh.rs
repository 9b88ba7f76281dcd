//! Refresh Coordinator: single-flight renewal of an expired access token.
//!
//! On a 401 from a non-exempt path the coordinator either renews the session
//! once or gives up. It is fail-closed: an expiry failure that arrives while
//! another renewal is in flight is not queued. The session is cleared and the
//! call is rejected with its original failure, while the renewal already in
//! flight runs to its own conclusion.
//!
//! ```text
//! IDLE --expiry, not retried--> REFRESHING --renewed--> IDLE (+ replay)
//!                               REFRESHING --failed / no refresh token--> IDLE (+ logout)
//!                               REFRESHING --another expiry--> REFRESHING (+ logout, reject)
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::context::RequestContext;
use crate::client::transport::Transport;
use crate::errors::{ApiError, ErrorClass};
use crate::session::{Identity, SessionStore, SessionTokens};

pub const DEFAULT_LOGIN_PATH: &str = "/auth/login";
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";

/// Paths exempt from the renewal protocol.
#[derive(Debug, Clone)]
pub struct AuthPaths {
    pub login: String,
    pub refresh: String,
}

impl Default for AuthPaths {
    fn default() -> Self {
        Self {
            login: DEFAULT_LOGIN_PATH.to_string(),
            refresh: DEFAULT_REFRESH_PATH.to_string(),
        }
    }
}

impl AuthPaths {
    pub fn is_exempt(&self, path: &str) -> bool {
        path.contains(&self.login) || path.contains(&self.refresh)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    Refreshing,
}

#[derive(Serialize)]
struct RenewalRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RenewalResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    user: Option<Value>,
}

pub(crate) struct RefreshCoordinator {
    state: Mutex<CoordinatorState>,
    paths: AuthPaths,
    transport: Arc<dyn Transport>,
    store: Arc<dyn SessionStore>,
}

/// Holds the coordinator in `Refreshing`; dropping it returns to `Idle`, on
/// every exit path including cancellation of the enclosing future.
struct RefreshGuard<'a> {
    state: &'a Mutex<CoordinatorState>,
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        *lock(self.state) = CoordinatorState::Idle;
    }
}

fn lock(state: &Mutex<CoordinatorState>) -> MutexGuard<'_, CoordinatorState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl RefreshCoordinator {
    pub fn new(paths: AuthPaths, transport: Arc<dyn Transport>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            state: Mutex::new(CoordinatorState::Idle),
            paths,
            transport,
            store,
        }
    }

    pub fn state(&self) -> CoordinatorState {
        *lock(&self.state)
    }

    /// Whether `failure` on `ctx` belongs to the renewal protocol at all.
    pub fn intercepts(&self, ctx: &RequestContext, failure: &ApiError) -> bool {
        failure.is_auth_failure() && !self.paths.is_exempt(&ctx.path)
    }

    /// Attempts to recover from an expiry failure.
    ///
    /// Returns the renewed tokens, or the original `failure` when the session
    /// cannot be renewed. A context that has already been replayed is never
    /// renewed again.
    pub async fn recover(
        &self,
        ctx: &RequestContext,
        failure: ApiError,
    ) -> Result<SessionTokens, ApiError> {
        if ctx.is_retried() {
            debug!(
                "{} {} failed again after replay, not renewing",
                ctx.method, ctx.path
            );
            return Err(failure);
        }

        let Some(_guard) = self.try_begin() else {
            self.force_logout(ErrorClass::ConcurrentRefreshConflict, ctx);
            return Err(failure);
        };

        let Some(refresh_token) = self.store.refresh_token() else {
            warn!("No refresh token held; skipping renewal");
            self.force_logout(ErrorClass::RefreshFailed, ctx);
            return Err(failure);
        };
        // Captured before the await: a concurrent forced logout must not
        // erase the identity written back with the renewed tokens.
        let identity = self.store.identity();

        match self.renew(&refresh_token, identity).await {
            Ok(tokens) => Ok(tokens),
            Err(e) => {
                warn!("Session renewal failed: {e}");
                self.force_logout(ErrorClass::RefreshFailed, ctx);
                Err(failure)
            }
        }
    }

    fn try_begin(&self) -> Option<RefreshGuard<'_>> {
        let mut state = lock(&self.state);
        if *state == CoordinatorState::Refreshing {
            return None;
        }
        *state = CoordinatorState::Refreshing;
        Some(RefreshGuard { state: &self.state })
    }

    async fn renew(
        &self,
        refresh_token: &str,
        identity: Option<Identity>,
    ) -> Result<SessionTokens, ApiError> {
        let request = RequestContext::post(self.paths.refresh.clone())
            .json(&RenewalRequest { refresh_token })?;
        let response = self.transport.execute(&request).await?;
        let renewed: RenewalResponse = response.json()?;

        if renewed.access_token.trim().is_empty() {
            return Err(ApiError::InvalidRequest(
                "renewal response carried an empty access token".to_string(),
            ));
        }

        let tokens = SessionTokens::new(
            renewed.access_token,
            renewed
                .refresh_token
                .filter(|t| !t.trim().is_empty())
                .or_else(|| Some(refresh_token.to_string())),
        );
        let identity = renewed.user.map(Identity).or(identity);
        self.store.set_auth(identity, tokens.clone());

        info!("Session renewed");
        Ok(tokens)
    }

    fn force_logout(&self, reason: ErrorClass, ctx: &RequestContext) {
        warn!(
            "Forcing logout ({reason:?}) after 401 on {} {}",
            ctx.method, ctx.path
        );
        self.store.logout();
    }
}
