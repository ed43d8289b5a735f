//! Arena configuration.
//!
//! `ArenaConfig` carries the pacing, timeout and liveness settings the
//! host applies to every session it creates. All durations are stored as
//! seconds (`f64`) so the config round-trips through JSON unchanged.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{ArenaError, ArenaResult};

/// Slowest allowed autonomous-loop speed multiplier.
pub const MIN_SPEED: f64 = 0.25;

/// Fastest allowed autonomous-loop speed multiplier.
pub const MAX_SPEED: f64 = 4.0;

/// Largest allowed decision timeout in seconds. 0 disables the timeout.
pub const MAX_TIMEOUT_SECS: f64 = 300.0;

/// Largest delay, window or grace period a config may carry, in seconds.
pub const MAX_DURATION_SECS: f64 = 86_400.0;

/// Clamp a speed multiplier into `[MIN_SPEED, MAX_SPEED]`.
///
/// Non-finite input falls back to normal speed.
#[must_use]
pub fn clamp_speed(speed: f64) -> f64 {
    if speed.is_finite() {
        speed.clamp(MIN_SPEED, MAX_SPEED)
    } else {
        1.0
    }
}

/// Clamp a decision timeout into `[0, MAX_TIMEOUT_SECS]`.
///
/// NaN disables the timeout.
#[must_use]
pub fn clamp_timeout(secs: f64) -> f64 {
    if secs.is_nan() {
        0.0
    } else {
        secs.clamp(0.0, MAX_TIMEOUT_SECS)
    }
}

/// Host-wide settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Pause between autonomous turns at speed 1.0.
    pub base_delay_secs: f64,

    /// Speed multiplier a new bot-vs-bot session starts with.
    pub default_speed: f64,

    /// Decision timeout a new session starts with (0 = disabled).
    pub default_timeout_secs: f64,

    /// Silence after which a human participant counts as disconnected.
    pub liveness_window_secs: f64,

    /// Delay before an autonomous reply in human-vs-bot mode.
    pub autonomous_reply_delay_secs: f64,

    /// Most autonomous turns one mixed-mode chain may play in a row.
    pub max_autonomous_chain: usize,

    /// How long reset waits for the autonomous loop to stop.
    pub shutdown_grace_secs: f64,

    /// Seeds handed to each seat's agent factory.
    pub seat_seeds: [u64; 2],

    /// Fixed match seed. `None` derives one from the clock.
    pub match_seed: Option<u64>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            base_delay_secs: 1.5,
            default_speed: 1.0,
            default_timeout_secs: 30.0,
            liveness_window_secs: 10.0,
            autonomous_reply_delay_secs: 0.5,
            max_autonomous_chain: 8,
            shutdown_grace_secs: 2.0,
            seat_seeds: [356, 789],
            match_seed: None,
        }
    }
}

impl ArenaConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> ArenaResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ArenaError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every duration is finite, non-negative and at most
    /// [`MAX_DURATION_SECS`].
    pub fn validate(&self) -> ArenaResult<()> {
        let durations = [
            ("base_delay_secs", self.base_delay_secs),
            ("default_timeout_secs", self.default_timeout_secs),
            ("liveness_window_secs", self.liveness_window_secs),
            ("autonomous_reply_delay_secs", self.autonomous_reply_delay_secs),
            ("shutdown_grace_secs", self.shutdown_grace_secs),
        ];
        for (name, value) in durations {
            if !value.is_finite() || value < 0.0 {
                return Err(ArenaError::InvalidConfig(format!("{name} must be >= 0, got {value}")));
            }
            if value > MAX_DURATION_SECS || Duration::try_from_secs_f64(value).is_err() {
                return Err(ArenaError::InvalidConfig(format!(
                    "{name} must be <= {MAX_DURATION_SECS}, got {value}"
                )));
            }
        }
        if !self.default_speed.is_finite() || self.default_speed <= 0.0 {
            return Err(ArenaError::InvalidConfig(format!(
                "default_speed must be > 0, got {}",
                self.default_speed
            )));
        }
        if self.max_autonomous_chain == 0 {
            return Err(ArenaError::InvalidConfig("max_autonomous_chain must be > 0".into()));
        }
        Ok(())
    }

    pub fn with_base_delay(mut self, secs: f64) -> Self {
        self.base_delay_secs = secs;
        self
    }

    pub fn with_default_speed(mut self, speed: f64) -> Self {
        self.default_speed = speed;
        self
    }

    pub fn with_default_timeout(mut self, secs: f64) -> Self {
        self.default_timeout_secs = secs;
        self
    }

    pub fn with_liveness_window(mut self, secs: f64) -> Self {
        self.liveness_window_secs = secs;
        self
    }

    pub fn with_autonomous_reply_delay(mut self, secs: f64) -> Self {
        self.autonomous_reply_delay_secs = secs;
        self
    }

    pub fn with_max_autonomous_chain(mut self, turns: usize) -> Self {
        self.max_autonomous_chain = turns;
        self
    }

    pub fn with_shutdown_grace(mut self, secs: f64) -> Self {
        self.shutdown_grace_secs = secs;
        self
    }

    pub fn with_seat_seeds(mut self, first: u64, second: u64) -> Self {
        self.seat_seeds = [first, second];
        self
    }

    pub fn with_match_seed(mut self, seed: u64) -> Self {
        self.match_seed = Some(seed);
        self
    }

    #[must_use]
    pub fn base_delay(&self) -> Duration {
        to_duration(self.base_delay_secs)
    }

    #[must_use]
    pub fn liveness_window(&self) -> Duration {
        to_duration(self.liveness_window_secs)
    }

    #[must_use]
    pub fn autonomous_reply_delay(&self) -> Duration {
        to_duration(self.autonomous_reply_delay_secs)
    }

    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        to_duration(self.shutdown_grace_secs)
    }
}

/// Seconds to `Duration`, capped at [`MAX_DURATION_SECS`]. Invalid values
/// map to zero.
fn to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.min(MAX_DURATION_SECS)).unwrap_or(Duration::ZERO)
}
