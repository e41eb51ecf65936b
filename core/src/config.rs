//! Client configuration and the retry policy derived from it.
//!
//! Every field has a default, so an empty TOML document yields the stock
//! behavior: three attempts, reconnect between attempts, no backoff delay
//! and at most 20 redirect hops per call.

use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_MAX_REDIRECTS: usize = 20;

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_reconnect_between_attempts() -> bool {
    true
}

fn default_max_redirects() -> usize {
    DEFAULT_MAX_REDIRECTS
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Total attempts per exchange, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_reconnect_between_attempts")]
    pub reconnect_between_attempts: bool,
    /// Delay before the second attempt; 0 disables backoff.
    #[serde(default)]
    pub initial_backoff_ms: u64,
    /// Upper bound for the doubled delay; 0 means no cap.
    #[serde(default)]
    pub max_backoff_ms: u64,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            reconnect_between_attempts: true,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let backoff = if self.initial_backoff_ms == 0 {
            Backoff::None
        } else {
            let initial = Duration::from_millis(self.initial_backoff_ms);
            let max = if self.max_backoff_ms == 0 {
                None
            } else {
                Some(Duration::from_millis(self.max_backoff_ms))
            };
            Backoff::Exponential { initial, max }
        };
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            reconnect: self.reconnect_between_attempts,
            backoff,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    None,
    /// Doubles after each failed attempt, optionally capped.
    Exponential {
        initial: Duration,
        max: Option<Duration>,
    },
}

/// How a single exchange is retried after a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub reconnect: bool,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        ClientConfig::default().retry_policy()
    }
}

impl RetryPolicy {
    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::None => Duration::ZERO,
            Backoff::Exponential { initial, max } => {
                let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
                let delay = initial.saturating_mul(factor);
                match max {
                    Some(cap) => delay.min(cap),
                    None => delay,
                }
            }
        }
    }
}
