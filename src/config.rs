use std::{env, time::Duration};

use thiserror::Error;

/// Port the Monit HTTP interface listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 2812;
/// Pause between status fetches while the daemon reports transitional state.
pub const DEFAULT_STABILIZE_BACKOFF: Duration = Duration::from_secs(1);
/// Transitional snapshots tolerated before a reconcile gives up.
pub const DEFAULT_MAX_STABILIZE_ATTEMPTS: usize = 60;

/// Connection and stabilization settings for a [`crate::Monit`] client.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: String,
    pub use_tls: bool,
    /// Sleep between fetches while the snapshot is transitional.
    pub stabilize_backoff: Duration,
    /// Upper bound on consecutive transitional snapshots; reaching it fails
    /// the reconcile instead of blocking indefinitely.
    pub max_stabilize_attempts: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("MONIT_PORT must be a valid port number")]
    InvalidPort,
    #[error("MONIT_USE_TLS must be one of: 1, 0, true, false, yes, no")]
    InvalidTlsFlag,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            username: None,
            password: String::new(),
            use_tls: false,
            stabilize_backoff: DEFAULT_STABILIZE_BACKOFF,
            max_stabilize_attempts: DEFAULT_MAX_STABILIZE_ATTEMPTS,
        }
    }
}

impl Config {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Reads settings from `MONIT_HOST`, `MONIT_PORT`, `MONIT_USERNAME`,
    /// `MONIT_PASSWORD` and `MONIT_USE_TLS`. Unset variables keep their
    /// defaults; an empty username counts as unauthenticated.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("MONIT_HOST").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("MONIT_PORT")
            .ok()
            .map(|value| value.trim().parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(DEFAULT_PORT);
        let username = env::var("MONIT_USERNAME")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let password = env::var("MONIT_PASSWORD").unwrap_or_default();
        let use_tls = env::var("MONIT_USE_TLS")
            .ok()
            .map(|value| parse_flag(&value).ok_or(ConfigError::InvalidTlsFlag))
            .transpose()?
            .unwrap_or(false);

        Ok(Self {
            host,
            port,
            username,
            password,
            use_tls,
            ..Self::default()
        })
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = password.into();
        self
    }

    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    pub fn with_stabilize_backoff(mut self, backoff: Duration) -> Self {
        self.stabilize_backoff = backoff;
        self
    }

    pub fn with_max_stabilize_attempts(mut self, attempts: usize) -> Self {
        self.max_stabilize_attempts = attempts;
        self
    }

    pub fn base_url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
