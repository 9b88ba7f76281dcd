//! Scripted transport for exercising the client without a network.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tokio::sync::{oneshot, Notify};

use crate::client::context::{ApiResponse, RequestContext};
use crate::client::transport::Transport;
use crate::errors::ApiError;

pub(crate) enum Reply {
    Json(Value),
    Status(u16, Option<Value>),
    Network(String),
    /// Signals `reached`, then waits for `release` before producing the reply.
    Gated {
        reached: Arc<Notify>,
        release: oneshot::Receiver<()>,
        reply: Box<Reply>,
    },
}

impl Reply {
    pub fn json(body: Value) -> Self {
        Reply::Json(body)
    }

    pub fn status(code: u16) -> Self {
        Reply::Status(code, None)
    }

    pub fn unauthorized() -> Self {
        Reply::Status(401, Some(serde_json::json!({"detail": "Token expired"})))
    }

    fn into_result(self) -> Result<ApiResponse, ApiError> {
        match self {
            Reply::Json(body) => Ok(ApiResponse {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                body: Bytes::from(body.to_string()),
            }),
            Reply::Status(code, body) => {
                let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                if status.is_success() {
                    Ok(ApiResponse {
                        status,
                        headers: HeaderMap::new(),
                        body: Bytes::new(),
                    })
                } else {
                    Err(ApiError::from_status(status, body))
                }
            }
            Reply::Network(message) => Err(ApiError::Transport { message }),
            Reply::Gated { reply, .. } => reply.into_result(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

/// Answers each path from its own queue of replies, in order. An unscripted
/// call gets a 404.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, path: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Scripts a reply that is held until the returned sender fires. The
    /// returned `Notify` is signalled as soon as the call reaches the gate.
    pub fn script_gated(&self, path: &str, reply: Reply) -> (Arc<Notify>, oneshot::Sender<()>) {
        let reached = Arc::new(Notify::new());
        let (tx, rx) = oneshot::channel();
        self.script(
            path,
            Reply::Gated {
                reached: reached.clone(),
                release: rx,
                reply: Box::new(reply),
            },
        );
        (reached, tx)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.path == path)
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: &RequestContext) -> Result<ApiResponse, ApiError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method: request.method.clone(),
            path: request.path.clone(),
            authorization: request
                .headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body: request.body.clone(),
        });

        let next = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&request.path)
            .and_then(VecDeque::pop_front);

        match next {
            Some(Reply::Gated {
                reached,
                release,
                reply,
            }) => {
                reached.notify_one();
                let _ = release.await;
                reply.into_result()
            }
            Some(reply) => reply.into_result(),
            None => Reply::status(404).into_result(),
        }
    }
}
