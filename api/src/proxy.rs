//! Forward one GET to an upstream service and reshape the answer.
//!
//! The three proxy routes only differ in their upstream URL, the envelope keys
//! they probe and the label used when the upstream answers with an error, so
//! they share [`ProxyClient::forward`] and are described by a [`ProxyRoute`].
use log::{debug, error, info, warn};
use reqwest::Client;
use reqwest::header::CACHE_CONTROL;
use serde_json::{Value, json};
use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_GAMES_UPSTREAM: &str = "http://backend:5000/webhook";
pub const DEFAULT_ASSIGNMENTS_UPSTREAM: &str = "http://localhost:5000/assignments";
pub const DEFAULT_USERS_UPSTREAM: &str = "http://backend:5000/users";

const GAMES_CACHE_CONTROL: &str = "public, max-age=60, s-maxage=60, stale-while-revalidate=300";

#[derive(Debug, Clone, PartialEq)]
pub struct ProxyRoute {
    pub name: &'static str,
    pub upstream: String,
    /// Object fields probed in order for the record array.
    pub envelope_keys: &'static [&'static str],
    pub error_label: &'static str,
    /// Sent back on success only.
    pub cache_control: Option<&'static str>,
}

impl ProxyRoute {
    pub fn games(upstream: impl Into<String>) -> Self {
        Self {
            name: "games",
            upstream: upstream.into(),
            envelope_keys: &["data", "games"],
            error_label: "Failed to fetch from n8n",
            cache_control: Some(GAMES_CACHE_CONTROL),
        }
    }

    pub fn assignments(upstream: impl Into<String>) -> Self {
        Self {
            name: "assignments-list",
            upstream: upstream.into(),
            envelope_keys: &["assignments"],
            error_label: "Failed to fetch assignments",
            cache_control: None,
        }
    }

    pub fn users(upstream: impl Into<String>) -> Self {
        Self {
            name: "users",
            upstream: upstream.into(),
            envelope_keys: &["users"],
            error_label: "Failed to fetch users",
            cache_control: None,
        }
    }
}

/// What a proxy route answers: always JSON, status 200 or 500.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyReply {
    pub status: u16,
    pub body: Value,
    pub cache_control: Option<&'static str>,
}

impl ProxyReply {
    fn success(body: Value, cache_control: Option<&'static str>) -> Self {
        Self { status: 200, body, cache_control }
    }

    fn failure(err: &ProxyError) -> Self {
        Self { status: 500, body: err.envelope(), cache_control: None }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

#[derive(Debug)]
pub enum ProxyError {
    /// Connection, timeout or body-read failure.
    Network(reqwest::Error, String),
    /// Upstream reachable but answered with a non-success status.
    Upstream {
        label: &'static str,
        status: u16,
        status_text: String,
        body: String,
    },
    /// Upstream body is not JSON.
    Parse(serde_json::Error, String),
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ProxyError::Upstream { label, status, status_text, .. } => {
                write!(f, "{label}: {status} {status_text}")
            }
            ProxyError::Parse(e, url) => write!(f, "Parse error for {url}: {e}"),
        }
    }
}

impl StdError for ProxyError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ProxyError::Network(e, _) => Some(e),
            ProxyError::Parse(e, _) => Some(e),
            ProxyError::Upstream { .. } => None,
        }
    }
}

impl ProxyError {
    /// Short failure kind reported in the `name` field of the envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::Network(e, _) if e.is_timeout() => "TimeoutError",
            ProxyError::Network(e, _) if e.is_connect() => "ConnectError",
            ProxyError::Network(..) => "NetworkError",
            ProxyError::Upstream { .. } => "UpstreamError",
            ProxyError::Parse(..) => "ParseError",
        }
    }

    /// JSON body returned to the caller alongside a 500.
    pub fn envelope(&self) -> Value {
        match self {
            ProxyError::Upstream { label, status, status_text, body } => json!({
                "error": label,
                "status": status,
                "statusText": status_text,
                "details": body,
            }),
            ProxyError::Network(e, _) => json!({
                "error": e.to_string(),
                "name": self.kind(),
                "stack": source_chain(e),
            }),
            ProxyError::Parse(e, _) => json!({
                "error": e.to_string(),
                "name": self.kind(),
                "stack": source_chain(e),
            }),
        }
    }
}

fn source_chain(err: &dyn StdError) -> String {
    let mut lines = vec![format!("{err:?}")];
    let mut current = err.source();
    while let Some(cause) = current {
        lines.push(format!("caused by: {cause}"));
        current = cause.source();
    }
    lines.join("\n")
}

/// Pull the record array out of an upstream payload.
///
/// A bare array passes through. For an object, the first key in `keys` holding
/// an array wins. Anything else degrades to `[]`.
pub fn unwrap_envelope(value: Value, keys: &[&str]) -> Value {
    match value {
        array @ Value::Array(_) => array,
        Value::Object(mut fields) => keys
            .iter()
            .find_map(|key| match fields.remove(*key) {
                Some(array @ Value::Array(_)) => Some(array),
                _ => None,
            })
            .unwrap_or_else(|| {
                warn!("no array under any of {keys:?}, answering with an empty list");
                Value::Array(Vec::new())
            }),
        other => {
            warn!("upstream payload is neither array nor object: {other}");
            Value::Array(Vec::new())
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: Client,
    timeout: Duration,
}

impl Default for ProxyClient {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .user_agent("seatduty-proxy/0.1")
                .build()
                .unwrap_or_default(),
            timeout: UPSTREAM_TIMEOUT,
        }
    }
}

impl ProxyClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout, ..Self::default() }
    }

    /// Issue the route's upstream GET and build the reply. Never fails: every
    /// error ends up as a 500 with a JSON envelope.
    pub async fn forward(&self, route: &ProxyRoute) -> ProxyReply {
        match self.fetch(route).await {
            Ok(records) => ProxyReply::success(records, route.cache_control),
            Err(e) => {
                error!("{} proxy failed: {e}", route.name);
                ProxyReply::failure(&e)
            }
        }
    }

    async fn fetch(&self, route: &ProxyRoute) -> Result<Value, ProxyError> {
        let url = route.upstream.as_str();
        info!("{}: fetching {url}", route.name);

        let response = self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-store")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ProxyError::Network(e, url.to_owned()))?;

        let status = response.status();
        info!("{}: upstream answered {status}", route.name);

        let text = response
            .text()
            .await
            .map_err(|e| ProxyError::Network(e, url.to_owned()))?;

        if !status.is_success() {
            return Err(ProxyError::Upstream {
                label: route.error_label,
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body: text,
            });
        }

        debug!("{}: {} bytes from upstream", route.name, text.len());
        let value: Value =
            serde_json::from_str(&text).map_err(|e| ProxyError::Parse(e, url.to_owned()))?;
        Ok(unwrap_envelope(value, route.envelope_keys))
    }
}
