//! Outbound JSON POSTs to backend command endpoints.

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request, StatusCode, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use serde::Serialize;
use std::time::Duration;
use tokio::time::timeout;
use toolbus_common::Error;

pub(crate) type HttpClient = Client<HttpConnector, Full<Bytes>>;

/// POST `body` as JSON to `url`, bounded by `request_timeout`.
///
/// Returns the status code and raw body; the caller decides how to interpret
/// them. Every failure mode maps to a transport error so callers can fold it
/// into a result envelope.
pub(crate) async fn post_json<T: Serialize>(
    client: &HttpClient,
    url: &str,
    body: &T,
    request_timeout: Duration,
) -> Result<(StatusCode, Bytes), Error> {
    let uri: Uri = url
        .parse()
        .map_err(|e| Error::transport(format!("invalid URL {}: {}", url, e)))?;

    let payload =
        serde_json::to_vec(body).map_err(|e| Error::Internal(e.to_string()))?;

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .header("User-Agent", "toolbus-router/0.1")
        .body(Full::new(Bytes::from(payload)))
        .map_err(|e| Error::Internal(e.to_string()))?;

    let response = match timeout(request_timeout, client.request(request)).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            return Err(Error::transport(format!("connection failed: {}", e)));
        }
        Err(_) => {
            return Err(Error::transport(format!(
                "HTTP request timed out after {:?}",
                request_timeout
            )));
        }
    };

    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .map_err(|e| Error::transport(format!("failed to read response body: {}", e)))?
        .to_bytes();

    Ok((status, bytes))
}
