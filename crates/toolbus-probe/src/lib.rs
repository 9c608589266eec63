//! Readiness probing for supervised backends.
//!
//! Answers "is backend X ready to accept commands?" without blocking forever.
//! The probe polls a status endpoint on a fixed interval with a bounded
//! number of attempts; a backend is ready only when it answers HTTP 200 with
//! a JSON body whose `status` field is the literal string `"running"`.
//!
//! Exhausting the budget is not an error - the probe returns `false` and the
//! caller decides whether that is fatal.

use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::{Method, Request, StatusCode, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Retry budget for one readiness wait.
///
/// Not persisted; construct a fresh one per wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RetryBudget {
    /// Create a budget. `max_attempts` is clamped to at least 1.
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
        }
    }
}

impl Default for RetryBudget {
    fn default() -> Self {
        // Matches the launch scripts this replaces: 15 attempts, 2s apart.
        Self::new(15, Duration::from_secs(2))
    }
}

/// Status-endpoint prober.
///
/// Some backends serve their status at `/status`, others at `/api/status`,
/// so each tick walks a list of candidate paths in order; the first 200 with
/// `status == "running"` wins.
pub struct ReadinessProbe {
    paths: Vec<String>,
    request_timeout: Duration,
    client: Client<HttpConnector, Empty<Bytes>>,
}

impl Default for ReadinessProbe {
    fn default() -> Self {
        Self::new(&["/status", "/api/status"])
    }
}

impl ReadinessProbe {
    pub fn new(paths: &[&str]) -> Self {
        Self {
            paths: paths.iter().map(|p| p.to_string()).collect(),
            request_timeout: Duration::from_secs(2),
            client: Client::builder(TokioExecutor::new()).build_http(),
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Poll `base_url` until it reports ready or the budget is exhausted.
    ///
    /// Returns `true` as soon as one attempt succeeds, `false` once the
    /// budget runs out or `cancel` fires. Never returns an error: connection
    /// refusals, timeouts, non-200 responses, and malformed bodies all just
    /// consume an attempt.
    pub async fn wait_until_ready(
        &self,
        base_url: &str,
        budget: &RetryBudget,
        cancel: &CancellationToken,
    ) -> bool {
        for attempt in 1..=budget.max_attempts {
            if cancel.is_cancelled() {
                debug!("readiness wait cancelled for {}", base_url);
                return false;
            }

            for path in &self.paths {
                if self.probe_once(base_url, path).await {
                    info!("{} is ready (via {})", base_url, path);
                    return true;
                }
            }

            debug!(
                "{} not ready yet (attempt {}/{})",
                base_url, attempt, budget.max_attempts
            );

            if attempt < budget.max_attempts {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("readiness wait cancelled for {}", base_url);
                        return false;
                    }
                    _ = sleep(budget.interval) => {}
                }
            }
        }

        false
    }

    /// One GET against one candidate path. Any failure is "not yet".
    async fn probe_once(&self, base_url: &str, path: &str) -> bool {
        let uri: Uri = match format!("{}{}", base_url, path).parse() {
            Ok(uri) => uri,
            Err(e) => {
                debug!("invalid probe URI {}{}: {}", base_url, path, e);
                return false;
            }
        };

        let request = match Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header("User-Agent", "toolbus-probe/0.1")
            .body(Empty::<Bytes>::new())
        {
            Ok(request) => request,
            Err(_) => return false,
        };

        let response = match timeout(self.request_timeout, self.client.request(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                debug!("probe connection failed: {}{} - {}", base_url, path, e);
                return false;
            }
            Err(_) => {
                debug!("probe timed out: {}{}", base_url, path);
                return false;
            }
        };

        if response.status() != StatusCode::OK {
            return false;
        }

        let body = match response.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(_) => return false,
        };

        match serde_json::from_slice::<serde_json::Value>(&body) {
            Ok(value) => value.get("status").and_then(|s| s.as_str()) == Some("running"),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::time::Instant;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn status_app(path: &str, body: Value) -> Router {
        Router::new().route(
            path,
            get(move || {
                let body = body.clone();
                async move { Json(body) }
            }),
        )
    }

    #[tokio::test]
    async fn test_ready_on_first_attempt() {
        let base = serve(status_app("/status", json!({"status": "running"}))).await;
        let probe = ReadinessProbe::default();
        let budget = RetryBudget::new(3, Duration::from_millis(10));

        assert!(
            probe
                .wait_until_ready(&base, &budget, &CancellationToken::new())
                .await
        );
    }

    #[tokio::test]
    async fn test_alias_path_is_tried() {
        // Only /api/status exists; /status answers 404.
        let base = serve(status_app("/api/status", json!({"status": "running"}))).await;
        let probe = ReadinessProbe::default();
        let budget = RetryBudget::new(2, Duration::from_millis(10));

        assert!(
            probe
                .wait_until_ready(&base, &budget, &CancellationToken::new())
                .await
        );
    }

    #[tokio::test]
    async fn test_wrong_status_value_is_not_ready() {
        let base = serve(status_app("/status", json!({"status": "starting"}))).await;
        let probe = ReadinessProbe::default();
        let budget = RetryBudget::new(2, Duration::from_millis(10));

        assert!(
            !probe
                .wait_until_ready(&base, &budget, &CancellationToken::new())
                .await
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_not_ready() {
        let app = Router::new().route("/status", get(|| async { "not json" }));
        let base = serve(app).await;
        let probe = ReadinessProbe::default();
        let budget = RetryBudget::new(2, Duration::from_millis(10));

        assert!(
            !probe
                .wait_until_ready(&base, &budget, &CancellationToken::new())
                .await
        );
    }

    #[tokio::test]
    async fn test_budget_exhaustion_timing() {
        // Bind then drop so the port refuses connections.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe = ReadinessProbe::default();
        let budget = RetryBudget::new(3, Duration::from_millis(10));

        let start = Instant::now();
        let ready = probe
            .wait_until_ready(
                &format!("http://{}", addr),
                &budget,
                &CancellationToken::new(),
            )
            .await;
        let elapsed = start.elapsed();

        assert!(!ready);
        // Two inter-attempt sleeps of 10ms; refused connections are fast.
        assert!(elapsed >= Duration::from_millis(20));
        assert!(elapsed < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_cancelled_wait_returns_false() {
        let base = serve(status_app("/status", json!({"status": "running"}))).await;
        let probe = ReadinessProbe::default();
        let budget = RetryBudget::new(5, Duration::from_secs(10));

        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(!probe.wait_until_ready(&base, &budget, &cancel).await);
    }

    #[test]
    fn test_budget_clamps_to_one_attempt() {
        let budget = RetryBudget::new(0, Duration::from_millis(1));
        assert_eq!(budget.max_attempts, 1);
    }
}
