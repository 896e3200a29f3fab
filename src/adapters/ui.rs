//! User-interface adapter.
//!
//! Implements [`UiPort`] by logging every indication in a structured,
//! greppable form and forwarding it to the status LED pattern engine.

use log::info;

use crate::app::ports::{UiPort, UiState};
use crate::drivers::led_patterns::LedPatternEngine;

pub struct IndicatorUi {
    leds: LedPatternEngine,
}

impl Default for IndicatorUi {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatorUi {
    pub const fn new() -> Self {
        Self {
            leds: LedPatternEngine::new(),
        }
    }

    pub fn is_active(&self, state: UiState) -> bool {
        self.leds.is_active(state)
    }

    /// Advance the LED pattern; returns the level to drive the LED with.
    pub fn tick(&mut self, delta_ms: u32) -> bool {
        self.leds.tick(delta_ms)
    }
}

impl UiPort for IndicatorUi {
    fn indicate(&mut self, state: UiState, active: bool) {
        info!(
            "UI | {} {}",
            state.name(),
            if active { "on" } else { "off" }
        );
        self.leds.set_state(state, active);
    }
}
