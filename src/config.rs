use crate::{
    error::{Result, SketchError},
    lightx::retry::{Backoff, RetryPolicy},
    pipeline::PollPolicy,
};
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.lightxeditor.com";

/// Per-call timeouts for the provider workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeouts {
    /// Upload-slot and order-status requests.
    pub metadata: Duration,
    pub upload: Duration,
    pub submit: Duration,
    pub download: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            metadata: Duration::from_secs(30),
            upload: Duration::from_secs(60),
            submit: Duration::from_secs(60),
            download: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LightXConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeouts: Timeouts,
    pub poll: PollPolicy,
    pub retry: RetryPolicy,
}

impl LightXConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        LightXConfig {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeouts: Timeouts::default(),
            poll: PollPolicy::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Reads `LIGHTX_API_KEY` (required), `LIGHTX_BASE_URL`,
    /// `POLL_MAX_ATTEMPTS` and `POLL_INTERVAL_SECS`.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("LIGHTX_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| SketchError::Config("LIGHTX_API_KEY is required".into()))?;

        let mut config = LightXConfig::new(api_key);

        if let Ok(base_url) = env::var("LIGHTX_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        if let Some(attempts) = env::var("POLL_MAX_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
        {
            config.poll.max_attempts = attempts.max(1);
        }
        if let Some(secs) = env::var("POLL_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.poll.backoff = Backoff::Fixed(Duration::from_secs(secs));
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub json_logs: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
            json_logs: false,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = ServerConfig::default();
        let host = env::var("HOST").unwrap_or(defaults.host);
        let port = env::var("PORT")
            .ok()
            .and_then(|port| port.parse().ok())
            .unwrap_or(defaults.port);
        let json_logs = env::var("LOG_FORMAT").map_or(false, |val| val == "json");

        ServerConfig {
            host,
            port,
            json_logs,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }
}
