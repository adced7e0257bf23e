//! Client configuration types.

use std::time::Duration;

use estuary_core::DEFAULT_PIPE_CAPACITY;

/// Version of this client library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// User agent sent with every request, before any caller supplied suffix.
pub const DEFAULT_USER_AGENT: &str = concat!("estuary-client/", env!("CARGO_PKG_VERSION"));

/// Public Estuary API host.
pub const DEFAULT_HOST: &str = "api.estuary.tech";

/// URL scheme used to reach the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scheme {
    /// TLS, the only scheme the public service accepts.
    #[default]
    Https,
    /// Plain text, for local mock servers.
    Http,
}

impl Scheme {
    /// Scheme name as used in URLs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Https => "https",
            Self::Http => "http",
        }
    }
}

/// Configuration for the client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API host, optionally with a port.
    pub host: String,
    /// URL scheme.
    pub scheme: Scheme,
    /// Appended to [`DEFAULT_USER_AGENT`], separated by a space.
    pub user_agent_suffix: Option<String>,
    /// Deadline for receiving the response head of non-streaming calls.
    pub timeout: Duration,
    /// Connection timeout duration.
    pub connect_timeout: Duration,
    /// Maximum idle connections per host, forwarded to the transport.
    pub pool_idle_per_host: usize,
    /// Idle connection timeout, forwarded to the transport.
    pub pool_idle_timeout: Duration,
    /// Chunks buffered between an upload source and the connection.
    pub upload_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            scheme: Scheme::Https,
            user_agent_suffix: None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            upload_buffer: DEFAULT_PIPE_CAPACITY,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Effective `User-Agent` header value.
    #[must_use]
    pub fn user_agent(&self) -> String {
        match self.user_agent_suffix.as_deref() {
            None | Some("") => DEFAULT_USER_AGENT.to_string(),
            Some(suffix) => format!("{DEFAULT_USER_AGENT} {suffix}"),
        }
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    host: Option<String>,
    scheme: Option<Scheme>,
    user_agent_suffix: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    pool_idle_per_host: Option<usize>,
    pool_idle_timeout: Option<Duration>,
    upload_buffer: Option<usize>,
}

impl ClientConfigBuilder {
    /// Set the API host (`host` or `host:port`).
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the URL scheme.
    #[must_use]
    pub const fn scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = Some(scheme);
        self
    }

    /// Set a suffix appended to the default user agent.
    #[must_use]
    pub fn user_agent(mut self, suffix: impl Into<String>) -> Self {
        self.user_agent_suffix = Some(suffix.into());
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.pool_idle_per_host = Some(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Set the number of chunks buffered for streamed uploads.
    #[must_use]
    pub const fn upload_buffer(mut self, chunks: usize) -> Self {
        self.upload_buffer = Some(chunks);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            host: self.host.unwrap_or(defaults.host),
            scheme: self.scheme.unwrap_or(defaults.scheme),
            user_agent_suffix: self.user_agent_suffix.or(defaults.user_agent_suffix),
            timeout: self.timeout.unwrap_or(defaults.timeout),
            connect_timeout: self.connect_timeout.unwrap_or(defaults.connect_timeout),
            pool_idle_per_host: self
                .pool_idle_per_host
                .unwrap_or(defaults.pool_idle_per_host),
            pool_idle_timeout: self.pool_idle_timeout.unwrap_or(defaults.pool_idle_timeout),
            upload_buffer: self.upload_buffer.unwrap_or(defaults.upload_buffer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.host, "api.estuary.tech");
        assert_eq!(config.scheme, Scheme::Https);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.upload_buffer, DEFAULT_PIPE_CAPACITY);
    }

    #[test]
    fn builder_overrides() {
        let config = ClientConfig::builder()
            .host("127.0.0.1:3004")
            .scheme(Scheme::Http)
            .timeout(Duration::from_secs(60))
            .upload_buffer(2)
            .build();

        assert_eq!(config.host, "127.0.0.1:3004");
        assert_eq!(config.scheme.as_str(), "http");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.upload_buffer, 2);
        assert_eq!(config.pool_idle_per_host, 32);
    }

    #[test]
    fn user_agent_suffix() {
        assert_eq!(ClientConfig::default().user_agent(), DEFAULT_USER_AGENT);
        assert!(DEFAULT_USER_AGENT.starts_with("estuary-client/"));
        assert!(DEFAULT_USER_AGENT.ends_with(VERSION));

        let config = ClientConfig::builder().user_agent("my-app/2.0").build();
        assert_eq!(config.user_agent(), format!("{DEFAULT_USER_AGENT} my-app/2.0"));
    }
}
