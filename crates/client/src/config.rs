//! HTTP gateway configuration.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Node REST endpoint, e.g. `http://localhost:3000`.
    pub url: String,

    /// Timeout applied to every HTTP request.
    pub request_timeout: Duration,

    /// Interval between polls backing subscriptions.
    pub poll_interval: Duration,

    /// Capacity of each subscription channel.
    pub event_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000".to_string(),
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
            event_buffer: 1024,
        }
    }
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}
