use std::fmt;

use serde::{Deserialize, Serialize};

use crate::report::RetryPolicy;

/// Data-driven tuning for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Session length in seconds.
    pub duration_secs: f64,
    /// Milliseconds between spawn attempts.
    pub spawn_interval_ms: f64,
    /// Milliseconds a target stays up if not hit.
    pub target_lifetime_ms: f64,
    /// Side of the square target in CSS pixels.
    pub target_size: f64,
    /// Maximum gap (inclusive) between hits that still counts as a combo.
    pub combo_window_ms: f64,
    /// Delivery retries for the results report.
    pub retry: RetryPolicy,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            duration_secs: 30.0,
            spawn_interval_ms: 500.0,
            target_lifetime_ms: 1000.0,
            target_size: 50.0,
            combo_window_ms: 800.0,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Parse(String),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(m) => write!(f, "config parse error: {m}"),
            Self::Invalid(m) => write!(f, "invalid config: {m}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl GameConfig {
    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("duration_secs", self.duration_secs),
            ("spawn_interval_ms", self.spawn_interval_ms),
            ("target_lifetime_ms", self.target_lifetime_ms),
            ("target_size", self.target_size),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be > 0, got {value}")));
            }
        }
        if !(self.combo_window_ms.is_finite() && self.combo_window_ms >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "combo_window_ms must be >= 0, got {}",
                self.combo_window_ms
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}
