//! HTTP form-post notifier.

use super::{Notifier, NotifyError};
use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::Url;
use std::time::{Duration, Instant};

/// Endpoint the web emitter server listens on.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/send_message";
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Posts `body=<text>` as `application/x-www-form-urlencoded`.
///
/// The response is logged and otherwise ignored.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    client: Client,
    endpoint: Url,
}

impl HttpNotifier {
    /// Builds a notifier for `endpoint` with a per-request timeout.
    ///
    /// # Errors
    /// - `InvalidEndpoint` when `endpoint` is not an absolute http(s) URL.
    /// - `Transport` when the HTTP client cannot be constructed.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, NotifyError> {
        let endpoint = parse_endpoint(endpoint)?;
        // Proxy env vars are ignored; the endpoint is normally on the LAN.
        let client = Client::builder().timeout(timeout).no_proxy().build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Notifier for HttpNotifier {
    fn notify(&self, body: &str) -> Result<(), NotifyError> {
        let started_at = Instant::now();
        debug!(
            "event=notify module=notify status=start endpoint={} body_len={}",
            self.endpoint,
            body.len()
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .form(&[("body", body)])
            .send()?;

        info!(
            "event=notify module=notify status=ok endpoint={} http_status={} duration_ms={}",
            self.endpoint,
            response.status().as_u16(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url, NotifyError> {
    let invalid = |reason: String| NotifyError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };

    let url = Url::parse(endpoint.trim()).map_err(|err| invalid(err.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme `{other}`"))),
    }
}
