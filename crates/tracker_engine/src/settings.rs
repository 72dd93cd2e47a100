use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Scheme, host and optional path prefix of the backend.
    pub base_url: String,
    /// Sent as `Authorization: Bearer <token>` when present.
    pub token: Option<String>,
    pub connect_timeout: Duration,
    /// Whole-request timeout for REST calls. Live streams only use the
    /// connect timeout.
    pub request_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            token: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}
