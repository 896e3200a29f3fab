//! Status LED pattern engine with priority-based pattern selection.
//!
//! The tag has a single status LED.  Several UI conditions can be active at
//! once; the engine shows the highest-priority one.  The runner calls
//! `tick()` and drives the LED with the returned level.
//!
//! ## Priority hierarchy (highest first)
//!
//! 1. **DFU mode** — rapid flash
//! 2. **Recovery mode** — double blink
//! 3. **Identification mode** — fast blink
//! 4. **Provisioned** — short heartbeat
//! 5. **App running** — slow blink
//!
//! ## Pattern types
//!
//! | Pattern      | Description                      | Rate   |
//! |-------------|----------------------------------|--------|
//! | Solid        | Constant on                      | —      |
//! | Heartbeat    | 50 ms flash every 2 s            | 0.5 Hz |
//! | SlowBlink    | On/off square wave               | 1 Hz   |
//! | FastBlink    | On/off square wave               | 4 Hz   |
//! | DoubleBlink  | Two quick flashes, then pause    | 1 Hz   |
//! | RapidFlash   | Very fast on/off                 | 8 Hz   |

use crate::app::ports::UiState;

/// Pattern identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternId {
    Solid,
    Heartbeat,
    SlowBlink,
    FastBlink,
    DoubleBlink,
    RapidFlash,
    Off,
}

/// Pattern shown for each UI state, in priority order (highest first).
const PRIORITY: [(UiState, PatternId); UiState::COUNT] = [
    (UiState::DfuMode, PatternId::RapidFlash),
    (UiState::RecoveryMode, PatternId::DoubleBlink),
    (UiState::IdentificationMode, PatternId::FastBlink),
    (UiState::Provisioned, PatternId::Heartbeat),
    (UiState::AppRunning, PatternId::SlowBlink),
];

/// LED pattern engine. Stack-allocated, no heap.
pub struct LedPatternEngine {
    phase_ms: u32,
    /// Bit `n` set when `UiState` with discriminant `n` is active.
    active_states: u8,
    shown: Option<PatternId>,
}

impl Default for LedPatternEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LedPatternEngine {
    pub const fn new() -> Self {
        Self {
            phase_ms: 0,
            active_states: 0,
            shown: None,
        }
    }

    pub fn set_state(&mut self, state: UiState, active: bool) {
        let bit = 1u8 << (state as u8);
        if active {
            self.active_states |= bit;
        } else {
            self.active_states &= !bit;
        }
    }

    pub fn is_active(&self, state: UiState) -> bool {
        self.active_states & (1u8 << (state as u8)) != 0
    }

    /// Clear all states — LED will be off.
    pub fn clear_all(&mut self) {
        self.active_states = 0;
        self.shown = None;
        self.phase_ms = 0;
    }

    /// The pattern the highest-priority active state asks for.
    pub fn selected(&self) -> PatternId {
        PRIORITY
            .iter()
            .find(|(state, _)| self.is_active(*state))
            .map_or(PatternId::Off, |(_, pattern)| *pattern)
    }

    /// Advance the pattern phase and return the LED level.
    /// `delta_ms` is the time since the last call.
    pub fn tick(&mut self, delta_ms: u32) -> bool {
        self.phase_ms = self.phase_ms.wrapping_add(delta_ms);

        let selected = self.selected();
        if self.shown != Some(selected) {
            // Start every new pattern from the beginning of its cycle.
            self.phase_ms = 0;
            self.shown = Some(selected);
        }

        Self::level(selected, self.phase_ms)
    }

    fn level(pattern: PatternId, phase_ms: u32) -> bool {
        match pattern {
            PatternId::Solid => true,
            PatternId::Off => false,
            PatternId::Heartbeat => (phase_ms % 2000) < 50,
            PatternId::SlowBlink => (phase_ms % 1000) < 500,
            PatternId::FastBlink => (phase_ms % 250) < 125,
            PatternId::DoubleBlink => {
                let cycle = phase_ms % 1000;
                cycle < 100 || (200..300).contains(&cycle)
            }
            PatternId::RapidFlash => (phase_ms % 125) < 63,
        }
    }
}
