use crate::model::headers::Headers;
use crate::parser::{ParserChain, ResponseParser};
use crate::transport::TransportFactory;
use std::sync::Arc;
use std::time::Duration;

/// Shared request settings bound to a [`RequestSpec`](crate::RequestSpec)
/// exactly once.
///
/// Built fluently, then frozen behind an `Arc` and handed to the queue. The
/// parser list and transport factory are validated when an executor is built,
/// not here: an empty chain or missing factory is a fatal setup error at that
/// point.
#[derive(Clone)]
pub struct Configuration {
    base_url: String,
    timeout: Duration,
    headers: Headers,
    with_credentials: bool,
    retry: u32,
    parsers: ParserChain,
    transport_factory: Option<Arc<dyn TransportFactory>>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

impl Configuration {
    pub fn new() -> Self {
        Configuration {
            base_url: String::new(),
            timeout: Duration::from_millis(1000),
            headers: Headers::new(),
            with_credentials: false,
            retry: 0,
            parsers: ParserChain::new(),
            transport_factory: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Default headers, merged *under* per-request headers: on key collision
    /// the request wins.
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_header(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.headers.set(key, value);
        self
    }

    /// Cross-site credential flag, handed to the transport when an executor
    /// is built.
    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = with_credentials;
        self
    }

    /// Retry budget per request; 0 means a single attempt.
    pub fn with_retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    pub fn add_parser(mut self, parser: Arc<dyn ResponseParser>) -> Self {
        self.parsers.push(parser);
        self
    }

    pub fn with_transport_factory(mut self, factory: Arc<dyn TransportFactory>) -> Self {
        self.transport_factory = Some(factory);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn credentials(&self) -> bool {
        self.with_credentials
    }

    pub fn retry(&self) -> u32 {
        self.retry
    }

    pub fn parsers(&self) -> &ParserChain {
        &self.parsers
    }

    pub fn transport_factory(&self) -> Option<&Arc<dyn TransportFactory>> {
        self.transport_factory.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::DefaultParser;

    #[test]
    fn test_defaults() {
        let config = Configuration::new();
        assert_eq!(config.timeout(), Duration::from_millis(1000));
        assert_eq!(config.retry(), 0);
        assert!(config.parsers().is_empty());
        assert!(config.transport_factory().is_none());
        assert!(!config.credentials());
    }

    #[test]
    fn test_fluent_build() {
        let config = Configuration::new()
            .with_base_url("http://api.example.com")
            .with_retry(2)
            .with_header("Accept", "application/json")
            .add_parser(Arc::new(DefaultParser));

        assert_eq!(config.base_url(), "http://api.example.com");
        assert_eq!(config.retry(), 2);
        assert_eq!(config.parsers().len(), 1);
        assert!(config.headers().contains("accept"));
    }
}
