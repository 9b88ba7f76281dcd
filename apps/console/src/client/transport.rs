use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::client::context::{ApiResponse, RequestContext};
use crate::errors::ApiError;

/// Sends one fully-prepared request. Non-2xx responses come back as
/// [`ApiError::Status`]; the transport knows nothing about credentials.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &RequestContext) -> Result<ApiResponse, ApiError>;
}

/// HTTP transport over `reqwest`, rooted at the backend's base URL.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &RequestContext) -> Result<ApiResponse, ApiError> {
        let url = self.url_for(&request.path);

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .headers(request.headers.clone());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        debug!("{} {} -> {}", request.method, request.path, status);

        if !status.is_success() {
            let parsed = serde_json::from_slice::<Value>(&body).ok();
            return Err(ApiError::from_status(status, parsed));
        }

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}
