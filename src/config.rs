//! Client configuration.

use std::time::Duration;

/// Client configuration.
///
/// Immutable after construction; the client keeps it behind an `Arc` and every
/// call reads from the same snapshot.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL prefixed onto relative request targets.
    pub base_url: String,
    /// Default timeout for each call.
    pub timeout: Duration,
    /// Headers applied to every request; per-call headers override them.
    pub default_headers: Vec<(String, String)>,
    /// User agent string, consumed by the default transport.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: Duration::from_secs(60),
            default_headers: Vec::new(),
            user_agent: format!("tether/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for client configuration.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the base URL prefixed onto relative request targets.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the default timeout for each call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Add a default header for all requests.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.push((name.into(), value.into()));
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
