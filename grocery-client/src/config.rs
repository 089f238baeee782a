//! Client configuration

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5050";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// 120 polls at 2s ≈ 4 minutes
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 120;
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(4 * 60);
pub const DEFAULT_CACHE_DIR: &str = ".grocery";

/// Client configuration for talking to the ordering service
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service base URL (e.g., "http://localhost:5050")
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Delay between two status polls
    pub poll_interval: Duration,

    /// Upper bound on status polls per order / restock (never zero)
    pub max_poll_attempts: u32,

    /// Age after which the access token is refreshed before a protected call
    pub refresh_interval: Duration,

    /// Directory holding the persisted session record
    pub cache_dir: PathBuf,
}

impl ClientConfig {
    /// Create a new client configuration with default timings
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
        }
    }

    /// Load configuration from environment variables
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `ORDERING_API_URL` | `http://localhost:5050` |
    /// | `GROCERY_CACHE_DIR` | `.grocery` |
    /// | `GROCERY_HTTP_TIMEOUT_SECS` | `10` |
    /// | `GROCERY_POLL_INTERVAL_MS` | `2000` |
    /// | `GROCERY_MAX_POLL_ATTEMPTS` | `120` |
    /// | `GROCERY_REFRESH_INTERVAL_SECS` | `240` |
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    /// Unparseable values fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let parse_u64 = |name: &str| get(name).and_then(|v| v.trim().parse::<u64>().ok());

        let base_url = get("ORDERING_API_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let mut config = Self::new(base_url);

        if let Some(dir) = get("GROCERY_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Some(secs) = parse_u64("GROCERY_HTTP_TIMEOUT_SECS") {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(ms) = parse_u64("GROCERY_POLL_INTERVAL_MS") {
            config = config.with_poll_interval(Duration::from_millis(ms));
        }
        if let Some(n) = parse_u64("GROCERY_MAX_POLL_ATTEMPTS") {
            config = config.with_max_poll_attempts(u32::try_from(n).unwrap_or(u32::MAX));
        }
        if let Some(secs) = parse_u64("GROCERY_REFRESH_INTERVAL_SECS") {
            config = config.with_refresh_interval(Duration::from_secs(secs));
        }
        config
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.timeout = timeout;
        }
        self
    }

    /// Set the poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the poll attempt cap; clamped to at least one attempt
    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = attempts.max(1);
        self
    }

    /// Set the proactive refresh interval
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Set the session cache directory
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Upper bound on a poll loop's wall time (excluding request latency)
    pub fn max_poll_duration(&self) -> Duration {
        self.poll_interval * self.max_poll_attempts
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
