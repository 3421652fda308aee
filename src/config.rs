//! Client configuration parsed from environment variables.

use std::time::Duration;

use crate::error::ClientError;

pub const DEFAULT_ADDRESS: &str = "127.0.0.1:8081";
pub const DEFAULT_RECONNECT_BASE_MS: u64 = 250;
pub const DEFAULT_RECONNECT_MAX_MS: u64 = 10_000;
pub const DEFAULT_MAX_LINE_BYTES: usize = 16 * 1024 * 1024;

/// Delay schedule between reconnect attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay before every attempt.
    Fixed(Duration),
    /// `base * 2^(attempt - 1)`, capped at `max`.
    Exponential { base: Duration, max: Duration },
}

impl Backoff {
    /// Delay before reconnect attempt `attempt` (1-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Exponential { base, max } => {
                let factor = 1_u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
                base.saturating_mul(factor).min(max)
            }
        }
    }
}

/// What to do when an established connection drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconnectPolicy {
    /// Stay disconnected for good.
    #[default]
    Disabled,
    Enabled {
        /// Consecutive failed attempts before giving up. `None` retries forever.
        max_retries: Option<u32>,
        backoff: Backoff,
    },
}

impl ReconnectPolicy {
    /// Exponential backoff with default timings and unlimited retries.
    #[must_use]
    pub fn exponential() -> Self {
        Self::Enabled {
            max_retries: None,
            backoff: Backoff::Exponential {
                base: Duration::from_millis(DEFAULT_RECONNECT_BASE_MS),
                max: Duration::from_millis(DEFAULT_RECONNECT_MAX_MS),
            },
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled { .. })
    }

    /// Delay before attempt `attempt`, or `None` once retries are exhausted.
    #[must_use]
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        match self {
            Self::Disabled => None,
            Self::Enabled { max_retries, backoff } => {
                if max_retries.is_some_and(|max| attempt > max) {
                    None
                } else {
                    Some(backoff.delay(attempt))
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// `host:port` of the external process.
    pub address: String,
    pub reconnect: ReconnectPolicy,
    /// Longest inbound line accepted; longer lines are discarded.
    pub max_line_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_owned(),
            reconnect: ReconnectPolicy::Disabled,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self { address: address.into(), ..Self::default() }
    }

    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    #[must_use]
    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    #[must_use]
    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `PIXELPORT_ADDR`: default `127.0.0.1:8081`
    /// - `PIXELPORT_RECONNECT`: `off` (default), `fixed` or `exponential`
    /// - `PIXELPORT_RECONNECT_MAX_RETRIES`: unlimited when absent
    /// - `PIXELPORT_RECONNECT_BASE_MS`: default 250
    /// - `PIXELPORT_RECONNECT_MAX_MS`: default 10000
    /// - `PIXELPORT_MAX_LINE_BYTES`: default 16 MiB
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] for an unknown reconnect mode.
    pub fn from_env() -> Result<Self, ClientError> {
        let address = std::env::var("PIXELPORT_ADDR").unwrap_or_else(|_| DEFAULT_ADDRESS.to_owned());
        let base = Duration::from_millis(env_parse("PIXELPORT_RECONNECT_BASE_MS", DEFAULT_RECONNECT_BASE_MS));
        let max = Duration::from_millis(env_parse("PIXELPORT_RECONNECT_MAX_MS", DEFAULT_RECONNECT_MAX_MS));
        let max_retries = std::env::var("PIXELPORT_RECONNECT_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok());
        let reconnect = parse_reconnect_mode(
            std::env::var("PIXELPORT_RECONNECT").ok().as_deref(),
            max_retries,
            base,
            max,
        )?;
        let max_line_bytes = env_parse("PIXELPORT_MAX_LINE_BYTES", DEFAULT_MAX_LINE_BYTES);

        Ok(Self { address, reconnect, max_line_bytes })
    }
}

/// Map a reconnect mode name onto a policy.
///
/// # Errors
///
/// Returns [`ClientError::Config`] when `raw` is not `off`, `fixed` or `exponential`.
pub fn parse_reconnect_mode(
    raw: Option<&str>,
    max_retries: Option<u32>,
    base: Duration,
    max: Duration,
) -> Result<ReconnectPolicy, ClientError> {
    match raw.unwrap_or("off") {
        "off" | "disabled" => Ok(ReconnectPolicy::Disabled),
        "fixed" => Ok(ReconnectPolicy::Enabled { max_retries, backoff: Backoff::Fixed(base) }),
        "exponential" => Ok(ReconnectPolicy::Enabled { max_retries, backoff: Backoff::Exponential { base, max } }),
        other => Err(ClientError::Config(format!(
            "unknown PIXELPORT_RECONNECT mode '{other}' (expected 'off', 'fixed' or 'exponential')"
        ))),
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
