//! Client library for the toolbus command router.
//!
//! Every caller - the interactive assistant, batch scripts, test harnesses -
//! talks to the router through this wrapper instead of hand-rolling HTTP.
//! The contract mirrors the router's own: every call returns a
//! [`ResultEnvelope`], with transport failures converted locally into
//! `status = error` envelopes. Callers branch on `status`, never on
//! exception types.

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request, StatusCode, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::time::timeout;
use toolbus_common::{CommandEnvelope, ResultEnvelope};
use tracing::debug;

/// Thin HTTP wrapper around one router instance.
pub struct HubClient {
    base_url: String,
    http: Client<HttpConnector, Full<Bytes>>,
    status_timeout: Duration,
    command_timeout: Duration,
}

impl HubClient {
    /// Point a client at a router, e.g. `http://127.0.0.1:8080`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: Client::builder(TokioExecutor::new()).build_http(),
            status_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeouts(mut self, status_timeout: Duration, command_timeout: Duration) -> Self {
        self.status_timeout = status_timeout;
        self.command_timeout = command_timeout;
        self
    }

    /// Query the router's status endpoint.
    pub async fn check_status(&self) -> ResultEnvelope {
        let url = format!("{}/api/status", self.base_url);
        let response = match self.request(Method::GET, &url, None, self.status_timeout).await {
            Ok(response) => response,
            Err(message) => return ResultEnvelope::error(message),
        };

        let (status, body) = response;
        if status != StatusCode::OK {
            return ResultEnvelope::error(format!("router answered HTTP {}", status));
        }

        match serde_json::from_slice::<Value>(&body) {
            Ok(Value::Object(fields)) => {
                if fields.get("status").and_then(Value::as_str) == Some("running") {
                    ResultEnvelope::success("router is running", fields)
                } else {
                    ResultEnvelope::error("router is not ready")
                }
            }
            _ => ResultEnvelope::error("router returned a malformed status body"),
        }
    }

    /// Dispatch one command envelope to the router.
    pub async fn send_command(
        &self,
        command: impl Into<String>,
        params: Map<String, Value>,
    ) -> ResultEnvelope {
        let envelope = CommandEnvelope::new(command, params);
        debug!("sending command '{}'", envelope.command);

        let payload = match serde_json::to_vec(&envelope) {
            Ok(payload) => payload,
            Err(e) => return ResultEnvelope::error(format!("failed to encode command: {}", e)),
        };

        let url = format!("{}/command", self.base_url);
        let response = match self
            .request(Method::POST, &url, Some(payload), self.command_timeout)
            .await
        {
            Ok(response) => response,
            Err(message) => return ResultEnvelope::error(message),
        };

        let (status, body) = response;
        if status != StatusCode::OK {
            return ResultEnvelope::error(format!("router answered HTTP {}", status));
        }

        serde_json::from_slice::<ResultEnvelope>(&body).unwrap_or_else(|e| {
            ResultEnvelope::error(format!("router returned a malformed envelope: {}", e))
        })
    }

    /// Ask the generative proxy for content. Sugar over [`send_command`].
    ///
    /// [`send_command`]: Self::send_command
    pub async fn generate_content(&self, prompt: impl Into<String>) -> ResultEnvelope {
        let mut params = Map::new();
        params.insert("prompt".to_string(), Value::String(prompt.into()));
        self.send_command("generate_content", params).await
    }

    /// Run a command on the asset-authoring backend. Sugar over
    /// [`send_command`].
    ///
    /// [`send_command`]: Self::send_command
    pub async fn execute_asset_command(
        &self,
        command: impl Into<String>,
        params: Map<String, Value>,
    ) -> ResultEnvelope {
        self.send_command(command, params).await
    }

    /// Run a command on the engine backend. Sugar over [`send_command`].
    ///
    /// [`send_command`]: Self::send_command
    pub async fn execute_engine_command(
        &self,
        command: impl Into<String>,
        params: Map<String, Value>,
    ) -> ResultEnvelope {
        self.send_command(command, params).await
    }

    /// One bounded HTTP exchange. Errors come back as ready-to-use envelope
    /// messages so every caller above stays exception-free.
    async fn request(
        &self,
        method: Method,
        url: &str,
        payload: Option<Vec<u8>>,
        request_timeout: Duration,
    ) -> Result<(StatusCode, Bytes), String> {
        let uri: Uri = url
            .parse()
            .map_err(|e| format!("invalid router URL {}: {}", url, e))?;

        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("User-Agent", "toolbus-client/0.1");
        if payload.is_some() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        let request = builder
            .body(Full::new(Bytes::from(payload.unwrap_or_default())))
            .map_err(|e| format!("failed to build request: {}", e))?;

        let response = match timeout(request_timeout, self.http.request(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(format!("connection failed: {}", e)),
            Err(_) => {
                return Err(format!(
                    "request timed out after {:?}",
                    request_timeout
                ))
            }
        };

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| format!("failed to read response body: {}", e))?
            .to_bytes();

        Ok((status, body))
    }
}
