use std::env;
use std::time::Duration;

use crate::error::AppError;
use crate::jobs::parse_base_url;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend location
    pub api: ApiConfig,
    /// Logging setup
    pub logging: LoggingConfig,
    /// HTTP request limits
    pub request: RequestConfig,
    /// Event stream reconnect policy
    pub stream: StreamConfig,
}

/// Analysis backend configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Prefix prepended to every endpoint and job path.
    pub base_url: String,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    /// Human-readable lines
    Pretty,
    /// One JSON object per line
    Json,
}

/// HTTP request configuration
///
/// Only connection establishment is bounded; event streams are long-lived and
/// must not be cut by a total request timeout.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Connection establishment timeout in milliseconds
    pub connect_timeout_ms: u64,
}

/// Event stream reconnect configuration
#[derive(Debug, Clone, PartialEq)]
pub struct StreamConfig {
    /// Reopen attempts before giving up
    pub max_reconnect_attempts: u32,
    /// Base of the exponential reconnect delay in milliseconds
    pub reconnect_base_delay_ms: u64,
    /// Treat a stream as dead after this long without any frame. `None` waits forever.
    pub heartbeat_timeout_ms: Option<u64>,
}

impl StreamConfig {
    /// Delay before reconnect attempt `attempt` (1-based): `base * 2^attempt`.
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        let factor = 2_u64.saturating_pow(attempt);
        Duration::from_millis(self.reconnect_base_delay_ms.saturating_mul(factor))
    }

    /// Heartbeat timeout as a duration, if enabled.
    pub fn heartbeat_timeout(&self) -> Option<Duration> {
        self.heartbeat_timeout_ms.map(Duration::from_millis)
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = env::var("ANALYSIS_API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());
        if let Err(e) = parse_base_url(&base_url) {
            return Err(AppError::Config {
                message: format!("ANALYSIS_API_BASE_URL is not usable: {}", e),
            });
        }
        let api = ApiConfig { base_url };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            connect_timeout_ms: env::var("REQUEST_CONNECT_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10000),
        };

        let stream = StreamConfig {
            max_reconnect_attempts: env::var("STREAM_MAX_RECONNECTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            reconnect_base_delay_ms: env::var("STREAM_RECONNECT_BASE_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1000),
            heartbeat_timeout_ms: env::var("STREAM_HEARTBEAT_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|ms: &u64| *ms > 0),
        };

        Ok(Config {
            api,
            logging,
            request,
            stream,
        })
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10000,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: 3,
            reconnect_base_delay_ms: 1000,
            heartbeat_timeout_ms: None,
        }
    }
}
