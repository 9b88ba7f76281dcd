//! API client: the single point of entry for every backend call in the console.
//!
//! Feature modules build a [`RequestContext`] and hand it to [`ApiClient::send`].
//! They never see credentials or the renewal machinery. An expired access token
//! is renewed and the call replayed once, transparently.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::errors::ApiError;
use crate::session::SessionStore;

pub mod context;
pub mod dispatcher;
pub mod refresh;
pub mod retry;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use context::{ApiResponse, RequestContext};
pub use refresh::{AuthPaths, CoordinatorState};
pub use transport::{ReqwestTransport, Transport};

use dispatcher::Dispatcher;
use refresh::RefreshCoordinator;

struct ClientInner {
    dispatcher: Dispatcher,
    coordinator: RefreshCoordinator,
    store: Arc<dyn SessionStore>,
}

/// Cloning shares one coordinator, so every clone takes part in the same
/// single-flight renewal. Separately constructed clients are independent.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn SessionStore>,
        paths: AuthPaths,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                dispatcher: Dispatcher::new(transport.clone(), store.clone()),
                coordinator: RefreshCoordinator::new(paths, transport, store.clone()),
                store,
            }),
        }
    }

    pub fn from_config(config: &Config, store: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(
            &config.api_base_url,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Ok(Self::new(
            Arc::new(transport),
            store,
            AuthPaths {
                login: config.login_path.clone(),
                refresh: config.refresh_path.clone(),
            },
        ))
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.inner.store
    }

    pub fn coordinator_state(&self) -> CoordinatorState {
        self.inner.coordinator.state()
    }

    /// Sends one call, renewing the session and replaying the call at most
    /// once if the access token has expired.
    pub async fn send(&self, mut ctx: RequestContext) -> Result<ApiResponse, ApiError> {
        let inner = &self.inner;
        let mut result = inner.dispatcher.send(&ctx).await;

        loop {
            let failure = match result {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };

            if !inner.coordinator.intercepts(&ctx, &failure) {
                debug!(
                    "{} {} failed ({:?}): {failure}",
                    ctx.method,
                    ctx.path,
                    failure.class()
                );
                return Err(failure);
            }

            // Err here is the original failure; a retried context always ends here.
            let tokens = inner.coordinator.recover(&ctx, failure).await?;
            result = retry::replay(&inner.dispatcher, &mut ctx, &tokens).await;
        }
    }

    /// Sends the call and deserializes the JSON response body.
    pub async fn send_json<T: DeserializeOwned>(&self, ctx: RequestContext) -> Result<T, ApiError> {
        self.send(ctx).await?.json()
    }

    /// Sends the call and discards the response body.
    pub async fn send_empty(&self, ctx: RequestContext) -> Result<(), ApiError> {
        self.send(ctx).await.map(|_| ())
    }
}
