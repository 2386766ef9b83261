use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};

use crate::builder::EngineConfigBuilder;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Maximum picture size the player can show, used to cap variant selection.
pub type Viewport = playlist::Resolution;

/// Top-level engine configuration
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Send cookies with playlist and segment requests
    pub with_credentials: bool,

    /// HTTP client settings
    pub http: HttpConfig,

    /// Playlist loader settings
    pub loader: LoaderConfig,

    /// Buffering and bitrate adaptation settings
    pub streaming: StreamingConfig,
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::new()
    }
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Overall timeout for a single request
    pub timeout: Duration,

    /// Connection timeout (time to establish initial connection)
    pub connect_timeout: Duration,

    /// User agent string
    pub user_agent: String,

    /// Headers sent with every request
    pub headers: HeaderMap,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(45),
            connect_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: HttpConfig::get_default_headers(),
        }
    }
}

impl HttpConfig {
    pub fn get_default_headers() -> HeaderMap {
        let mut default_headers = HeaderMap::new();

        default_headers.insert(
            reqwest::header::CONNECTION,
            HeaderValue::from_static("keep-alive"),
        );

        default_headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static(
                "application/vnd.apple.mpegurl,application/x-mpegurl,video/mp2t,*/*;q=0.8",
            ),
        );

        default_headers
    }
}

/// Playlist loader configuration
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Refresh interval for live playlists that declare no target duration
    pub default_target_duration: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            default_target_duration: Duration::from_secs(10),
        }
    }
}

/// Buffering and variant selection configuration
#[derive(Debug, Clone)]
pub struct StreamingConfig {
    /// Safety factor applied to a variant's bandwidth before comparing it
    /// with the measured throughput
    pub bandwidth_variance: f64,

    /// Amount of media to keep buffered ahead of the playback position
    pub goal_buffer_length: Duration,

    /// How often the buffer level is checked
    pub tick_interval: Duration,

    /// Throughput assumed before the first segment is measured, in bits/s
    pub initial_bandwidth: Option<f64>,

    /// Upper bound on the throughput used for variant selection, in bits/s
    pub max_bandwidth: Option<f64>,

    /// Used when the sink does not report a viewport of its own
    pub viewport: Option<Viewport>,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            bandwidth_variance: 1.1,
            goal_buffer_length: Duration::from_secs(5),
            tick_interval: Duration::from_millis(250),
            initial_bandwidth: None,
            max_bandwidth: None,
            viewport: None,
        }
    }
}
