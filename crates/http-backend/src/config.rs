use std::time::Duration;

/// Default time allowed for one request, connection included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder for [`HttpBackendConfig`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HttpBackendConfigBuilder {
    base_url: String,
    timeout: Option<Duration>,
}

impl HttpBackendConfigBuilder {
    /// Creates a builder for the backend served under `base_url`, e.g.
    /// `http://127.0.0.1:5000`. The chat route is appended to it.
    #[inline]
    pub fn with_base_url<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
        }
    }

    /// Sets the request timeout.
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> HttpBackendConfig {
        let base_url = self.base_url.trim_end_matches('/').to_owned();
        HttpBackendConfig {
            chat_url: format!("{base_url}/chat/"),
            base_url,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        }
    }
}

/// Configuration for [`crate::HttpBackend`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HttpBackendConfig {
    pub(crate) base_url: String,
    pub(crate) chat_url: String,
    pub(crate) timeout: Duration,
}

impl HttpBackendConfig {
    /// Returns the base URL without a trailing slash.
    #[inline]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the full URL of the chat route.
    #[inline]
    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    /// Returns the request timeout.
    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
