use std::time::Duration;

use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: concat!("charitable-client/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// `CHARITABLE_API_URL` and `CHARITABLE_HTTP_TIMEOUT_SECS`, falling back to
    /// the local development backend.
    pub fn from_env() -> Result<Self, ApiError> {
        let base_url =
            std::env::var("CHARITABLE_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let timeout_secs: u64 = match std::env::var("CHARITABLE_HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse().map_err(|_| {
                ApiError::Config(format!("CHARITABLE_HTTP_TIMEOUT_SECS is not a number: {raw}"))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            ..Self::default()
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_backend() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("charitable-client/"));
    }

    #[test]
    fn builder_overrides_keep_other_defaults() {
        let config =
            ClientConfig::new("https://api.example.org").with_timeout(Duration::from_secs(5));
        assert_eq!(config.base_url, "https://api.example.org");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
