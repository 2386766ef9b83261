//! # Builder for EngineConfig
//!
//! Fluent construction of [`EngineConfig`] values.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use hlsflv_engine::{EngineConfig, Viewport};
//!
//! let config = EngineConfig::builder()
//!     .with_credentials(true)
//!     .with_timeout(Duration::from_secs(20))
//!     .with_header("Referer", "https://example.com/")
//!     .with_initial_bandwidth(2_000_000.0)
//!     .with_viewport(Viewport { width: 1280, height: 720 })
//!     .build();
//!
//! assert!(config.with_credentials);
//! assert_eq!(config.http.timeout, Duration::from_secs(20));
//! ```

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::config::{EngineConfig, Viewport};

/// Builder for creating EngineConfig instances with a fluent API
#[derive(Debug, Clone)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Send cookies with every request
    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.config.with_credentials = with_credentials;
        self
    }

    /// Set the overall timeout for a single HTTP request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.http.timeout = timeout;
        self
    }

    /// Set the connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.http.connect_timeout = timeout;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.http.user_agent = user_agent.into();
        self
    }

    /// Add a custom HTTP header. Invalid names or values are ignored.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.as_ref().parse::<HeaderName>(),
            HeaderValue::from_str(value.as_ref()),
        ) {
            self.config.http.headers.insert(name, value);
        }
        self
    }

    /// Set all HTTP headers, replacing any existing headers
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.config.http.headers = headers;
        self
    }

    /// Refresh interval for live playlists without a target duration
    pub fn with_default_target_duration(mut self, duration: Duration) -> Self {
        self.config.loader.default_target_duration = duration;
        self
    }

    pub fn with_bandwidth_variance(mut self, variance: f64) -> Self {
        self.config.streaming.bandwidth_variance = variance;
        self
    }

    pub fn with_goal_buffer_length(mut self, length: Duration) -> Self {
        self.config.streaming.goal_buffer_length = length;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.config.streaming.tick_interval = interval;
        self
    }

    /// Throughput in bits/s assumed until the first segment is measured
    pub fn with_initial_bandwidth(mut self, bandwidth: f64) -> Self {
        self.config.streaming.initial_bandwidth = Some(bandwidth);
        self
    }

    /// Never select variants as if throughput exceeded `bandwidth` bits/s
    pub fn with_max_bandwidth(mut self, bandwidth: f64) -> Self {
        self.config.streaming.max_bandwidth = Some(bandwidth);
        self
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.config.streaming.viewport = Some(viewport);
        self
    }

    /// Build the EngineConfig instance
    pub fn build(self) -> EngineConfig {
        self.config
    }
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
