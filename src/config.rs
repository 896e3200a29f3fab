//! Mode controller configuration parameters
//!
//! All tunable timings for the locator tag's mode controller.
//! Values can be overridden from NVS; see [`crate::adapters::nvs`].

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeConfig {
    // --- Timed modes ---
    /// Recovery mode window (minutes)
    pub recovery_mode_timeout_min: u16,
    /// Identification mode window (minutes)
    pub id_mode_timeout_min: u16,
    /// DFU mode window (minutes), extended by every update command
    pub dfu_mode_timeout_min: u16,

    // --- Factory reset ---
    /// Time allowed between the first account key write and provisioning (minutes)
    pub provisioning_timeout_min: u16,
    /// Delay before a key/provisioning mismatch reset, so an in-flight
    /// connection can finish (seconds)
    pub key_mismatch_reset_delay_secs: u16,

    // --- Buttons ---
    /// Minimum mode-button hold to request recovery mode (milliseconds)
    pub recovery_button_min_hold_ms: u32,
    /// Button debounce window (milliseconds)
    pub button_debounce_ms: u32,

    // --- Startup ---
    /// Startup handshake timeout (seconds)
    pub init_timeout_secs: u16,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            // Timed modes
            recovery_mode_timeout_min: 1,
            id_mode_timeout_min: 5,
            dfu_mode_timeout_min: 1,

            // Factory reset
            provisioning_timeout_min: 5,
            key_mismatch_reset_delay_secs: 3,

            // Buttons
            recovery_button_min_hold_ms: 3000,
            button_debounce_ms: 50,

            // Startup
            init_timeout_secs: 60,
        }
    }
}

impl ModeConfig {
    pub fn recovery_mode_timeout(&self) -> Duration {
        minutes(self.recovery_mode_timeout_min)
    }

    pub fn id_mode_timeout(&self) -> Duration {
        minutes(self.id_mode_timeout_min)
    }

    pub fn dfu_mode_timeout(&self) -> Duration {
        minutes(self.dfu_mode_timeout_min)
    }

    pub fn provisioning_timeout(&self) -> Duration {
        minutes(self.provisioning_timeout_min)
    }

    pub fn key_mismatch_reset_delay(&self) -> Duration {
        Duration::from_secs(u64::from(self.key_mismatch_reset_delay_secs))
    }

    pub fn init_timeout(&self) -> core::time::Duration {
        core::time::Duration::from_secs(u64::from(self.init_timeout_secs))
    }

    /// Range-check every field. Out-of-range values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=60).contains(&self.recovery_mode_timeout_min) {
            return Err(ConfigError::ValidationFailed(
                "recovery_mode_timeout_min must be 1–60",
            ));
        }
        if !(1..=60).contains(&self.id_mode_timeout_min) {
            return Err(ConfigError::ValidationFailed(
                "id_mode_timeout_min must be 1–60",
            ));
        }
        if !(1..=30).contains(&self.dfu_mode_timeout_min) {
            return Err(ConfigError::ValidationFailed(
                "dfu_mode_timeout_min must be 1–30",
            ));
        }
        if !(1..=60).contains(&self.provisioning_timeout_min) {
            return Err(ConfigError::ValidationFailed(
                "provisioning_timeout_min must be 1–60",
            ));
        }
        if !(1..=60).contains(&self.key_mismatch_reset_delay_secs) {
            return Err(ConfigError::ValidationFailed(
                "key_mismatch_reset_delay_secs must be 1–60",
            ));
        }
        if !(500..=10_000).contains(&self.recovery_button_min_hold_ms) {
            return Err(ConfigError::ValidationFailed(
                "recovery_button_min_hold_ms must be 500–10000",
            ));
        }
        if !(10..=500).contains(&self.button_debounce_ms) {
            return Err(ConfigError::ValidationFailed(
                "button_debounce_ms must be 10–500",
            ));
        }
        if self.button_debounce_ms >= self.recovery_button_min_hold_ms {
            return Err(ConfigError::ValidationFailed(
                "button_debounce_ms must be < recovery_button_min_hold_ms",
            ));
        }
        if !(5..=600).contains(&self.init_timeout_secs) {
            return Err(ConfigError::ValidationFailed(
                "init_timeout_secs must be 5–600",
            ));
        }
        Ok(())
    }
}

fn minutes(m: u16) -> Duration {
    Duration::from_secs(u64::from(m) * 60)
}
