use crate::{AssignmentRecord, GameRecord, UserRecord};
use reqwest::Client;
use reqwest::header::CACHE_CONTROL;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

const GAMES_PATH: &str = "/api/assignments";
const ASSIGNMENTS_PATH: &str = "/api/assignments-list";
const USERS_PATH: &str = "/api/users";

/// Client for the SeatDuty proxy routes.
#[derive(Debug, Clone)]
pub struct SeatDutyApi {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl Default for SeatDutyApi {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Parsing(serde_json::Error, String),
    /// The proxy answered with a failure status; `body` is its JSON envelope.
    Proxy { status: u16, body: Value },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::Proxy { status, body } => write!(f, "Proxy error {status}: {body}"),
        }
    }
}

impl ApiError {
    /// The JSON shown on a failed screen: the proxy envelope when there is one,
    /// otherwise `{"error": <message>}`.
    pub fn report(&self) -> Value {
        match self {
            ApiError::Proxy { body, .. } => body.clone(),
            other => json!({ "error": other.to_string() }),
        }
    }
}

impl SeatDutyApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .user_agent("seatduty/0.1 (terminal assignments viewer)")
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch_games(&self) -> ApiResult<Vec<GameRecord>> {
        self.get(GAMES_PATH).await
    }

    pub async fn fetch_assignments(&self) -> ApiResult<Vec<AssignmentRecord>> {
        self.get(ASSIGNMENTS_PATH).await
    }

    pub async fn fetch_users(&self) -> ApiResult<Vec<UserRecord>> {
        self.get(USERS_PATH).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = format!("{}{path}", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .header(CACHE_CONTROL, "no-store")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.clone()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e, url.clone()))?;

        if !status.is_success() {
            let body = serde_json::from_str(&text).unwrap_or_else(|_| json!({ "error": text }));
            return Err(ApiError::Proxy { status: status.as_u16(), body });
        }

        serde_json::from_str(&text).map_err(|e| ApiError::Parsing(e, url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_users_decodes_records() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/users")
            .with_status(200)
            .with_body(
                r#"[{"id":1,"email":"dana@example.com","name":"Dana","is_active":true,
                     "last_assigned_at":"2025-08-01T10:00:00Z",
                     "total_games_assigned":4,"total_games_completed":3}]"#,
            )
            .create_async()
            .await;

        let users = SeatDutyApi::new(server.url()).fetch_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name, "Dana");
        assert_eq!(users[0].completion_percent(), 75);
    }

    #[tokio::test]
    async fn proxy_failure_keeps_envelope_verbatim() {
        let mut server = mockito::Server::new_async().await;
        let envelope = json!({
            "error": "Failed to fetch from n8n",
            "status": 503,
            "statusText": "Service Unavailable",
            "details": "overloaded",
        });
        server
            .mock("GET", "/api/assignments")
            .with_status(500)
            .with_body(envelope.to_string())
            .create_async()
            .await;

        let err = SeatDutyApi::new(server.url()).fetch_games().await.unwrap_err();
        match &err {
            ApiError::Proxy { status, body } => {
                assert_eq!(*status, 500);
                assert_eq!(body, &envelope);
            }
            other => panic!("expected proxy error, got {other}"),
        }
        assert_eq!(err.report(), envelope);
    }

    #[tokio::test]
    async fn non_json_failure_body_is_wrapped() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/assignments-list")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let err = SeatDutyApi::new(server.url())
            .fetch_assignments()
            .await
            .unwrap_err();
        assert_eq!(err.report(), json!({ "error": "bad gateway" }));
    }

    #[tokio::test]
    async fn transport_failure_reports_message() {
        let err = SeatDutyApi::new("http://127.0.0.1:1")
            .fetch_users()
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Network(..)));
        assert!(err.report()["error"].as_str().unwrap().starts_with("Network error"));
    }
}
