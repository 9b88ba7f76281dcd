use std::sync::Arc;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use tracing::debug;

use crate::client::context::{ApiResponse, RequestContext};
use crate::client::transport::Transport;
use crate::errors::ApiError;
use crate::session::SessionStore;

/// Sends one call, attaching the current access token as a bearer credential.
/// Knows nothing about renewal.
pub(crate) struct Dispatcher {
    transport: Arc<dyn Transport>,
    store: Arc<dyn SessionStore>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn SessionStore>) -> Self {
        Self { transport, store }
    }

    pub async fn send(&self, ctx: &RequestContext) -> Result<ApiResponse, ApiError> {
        let token = self.store.access_token();
        self.send_with(ctx, token.as_deref()).await
    }

    /// Sends `ctx` with an explicit credential. The caller's context is left
    /// untouched; the header goes on a derived copy.
    pub async fn send_with(
        &self,
        ctx: &RequestContext,
        access_token: Option<&str>,
    ) -> Result<ApiResponse, ApiError> {
        let mut outgoing = ctx.clone();
        if let Some(token) = access_token {
            outgoing.headers.insert(AUTHORIZATION, bearer(token)?);
        }

        debug!(
            "Dispatching {} {} (authenticated={}, retried={})",
            ctx.method,
            ctx.path,
            access_token.is_some(),
            ctx.is_retried()
        );

        self.transport.execute(&outgoing).await
    }
}

fn bearer(token: &str) -> Result<HeaderValue, ApiError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
        ApiError::InvalidRequest("access token is not a valid header value".to_string())
    })?;
    value.set_sensitive(true);
    Ok(value)
}
