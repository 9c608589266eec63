//! Command dispatch: namespace classification and backend forwarding.

use crate::config::RouterConfig;
use crate::generative::GenerativeProxy;
use crate::proxy::{self, HttpClient};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde_json::{json, Map, Value};
use toolbus_common::{CommandEnvelope, Namespace, ResultEnvelope};
use tracing::{info, warn};

/// Shared router state: configuration plus the outbound HTTP plumbing.
///
/// Stateless with respect to requests; safe to share across handlers.
pub struct RouterState {
    config: RouterConfig,
    http: HttpClient,
    generative: GenerativeProxy,
}

impl RouterState {
    pub fn new(config: RouterConfig) -> Self {
        let generative = GenerativeProxy::new(config.ai.clone());
        Self {
            config,
            http: Client::builder(TokioExecutor::new()).build_http(),
            generative,
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Classify and route one command envelope.
    ///
    /// Every branch terminates in a result envelope; nothing here returns an
    /// error to the HTTP layer.
    pub async fn dispatch(&self, envelope: CommandEnvelope) -> ResultEnvelope {
        if let Err(e) = envelope.validate() {
            return ResultEnvelope::error(e.to_string());
        }

        let namespace = envelope.namespace();
        info!("dispatching '{}' to {} namespace", envelope.command, namespace);

        match namespace {
            Namespace::Unknown => {
                ResultEnvelope::error(format!("unknown command: {}", envelope.command))
            }
            Namespace::AssetAuthoring => {
                self.forward(namespace, &self.config.asset_backend_url, &envelope)
                    .await
            }
            Namespace::Engine => {
                self.forward(namespace, &self.config.engine_backend_url, &envelope)
                    .await
            }
            Namespace::Generative => self.generative.generate(&envelope).await,
        }
    }

    /// Proxy the envelope to a backend's command endpoint and relay its
    /// result envelope verbatim. An unreachable or misbehaving backend is
    /// reported as a shaped error envelope, never as a raw failure.
    async fn forward(
        &self,
        namespace: Namespace,
        base_url: &str,
        envelope: &CommandEnvelope,
    ) -> ResultEnvelope {
        if self.config.mock_backends {
            return mock_backend_response(namespace, envelope);
        }

        let url = format!("{}/command", base_url);
        match proxy::post_json(&self.http, &url, envelope, self.config.backend_timeout).await {
            Ok((status, bytes)) if status.is_success() => {
                match serde_json::from_slice::<ResultEnvelope>(&bytes) {
                    Ok(result) => result,
                    Err(e) => {
                        warn!("{} backend returned a malformed envelope: {}", namespace, e);
                        ResultEnvelope::error(format!(
                            "{} backend returned a malformed response: {}",
                            namespace, e
                        ))
                    }
                }
            }
            Ok((status, _)) => {
                warn!("{} backend answered HTTP {}", namespace, status);
                ResultEnvelope::error(format!(
                    "{} backend answered HTTP {}",
                    namespace, status
                ))
            }
            Err(e) => {
                warn!("{} backend unreachable at {}: {}", namespace, url, e);
                ResultEnvelope::error(format!("{} backend unreachable: {}", namespace, e))
            }
        }
    }
}

/// Local stand-in response for backend namespaces when mock mode is on.
fn mock_backend_response(namespace: Namespace, envelope: &CommandEnvelope) -> ResultEnvelope {
    let mut data = Map::new();
    data.insert("command".to_string(), json!(envelope.command));
    data.insert(
        "params".to_string(),
        Value::Object(envelope.params.clone()),
    );
    data.insert("backend".to_string(), json!(namespace.to_string()));
    data.insert("mock".to_string(), json!(true));
    ResultEnvelope::success(
        format!("command '{}' executed", envelope.command),
        data,
    )
}
