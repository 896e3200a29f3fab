//! Descriptor table for the three timed modes.
//!
//! Recovery, identification and DFU share one lifecycle: enter, refresh on
//! re-entry, leave on timeout.  What differs between them is data, so each
//! mode is a row in a fixed table rather than its own handler set.
//!
//! ```text
//!            enter / refresh
//!   INACTIVE ───────────────▶ ACTIVE ──┐ re-entry: re-arm timer
//!       ▲                       │  ◀───┘
//!       └────── timeout ────────┘
//! ```

use embassy_time::Duration;

use crate::app::ports::{ReadMode, UiState};
use crate::config::ModeConfig;
use crate::timer::TimerId;

/// The timed modes, indexable into the descriptor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TimedMode {
    Recovery = 0,
    Identification = 1,
    Dfu = 2,
}

impl TimedMode {
    pub const COUNT: usize = 3;

    pub const ALL: [TimedMode; Self::COUNT] =
        [TimedMode::Recovery, TimedMode::Identification, TimedMode::Dfu];

    pub const fn timer(self) -> TimerId {
        match self {
            Self::Recovery => TimerId::RecoveryMode,
            Self::Identification => TimerId::IdentificationMode,
            Self::Dfu => TimerId::DfuMode,
        }
    }

    /// The mode driven by `timer`, or `None` for the factory-reset timer.
    pub const fn from_timer(timer: TimerId) -> Option<Self> {
        match timer {
            TimerId::RecoveryMode => Some(Self::Recovery),
            TimerId::IdentificationMode => Some(Self::Identification),
            TimerId::DfuMode => Some(Self::Dfu),
            TimerId::FactoryReset => None,
        }
    }

    pub const fn from_read_mode(mode: ReadMode) -> Self {
        match mode {
            ReadMode::Recovery => Self::Recovery,
            ReadMode::Identification => Self::Identification,
        }
    }
}

/// Reads a mode's window length out of the configuration.
pub type TimeoutFn = fn(&ModeConfig) -> Duration;

/// Static description of one timed mode.
pub struct TimedModeDescriptor {
    pub mode: TimedMode,
    pub name: &'static str,
    pub ui_state: UiState,
    /// Beacon read-mode window opened on entry, if any.
    pub read_mode: Option<ReadMode>,
    /// Entry is ignored while the tag is unprovisioned.
    pub requires_provisioned: bool,
    pub timeout: TimeoutFn,
}

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the timed-mode table.  Called once when the engine is created.
pub fn build_mode_table() -> [TimedModeDescriptor; TimedMode::COUNT] {
    [
        // Index 0 — Recovery
        TimedModeDescriptor {
            mode: TimedMode::Recovery,
            name: "recovery mode",
            ui_state: UiState::RecoveryMode,
            read_mode: Some(ReadMode::Recovery),
            requires_provisioned: true,
            timeout: ModeConfig::recovery_mode_timeout,
        },
        // Index 1 — Identification
        TimedModeDescriptor {
            mode: TimedMode::Identification,
            name: "identification mode",
            ui_state: UiState::IdentificationMode,
            read_mode: Some(ReadMode::Identification),
            requires_provisioned: true,
            timeout: ModeConfig::id_mode_timeout,
        },
        // Index 2 — DFU
        TimedModeDescriptor {
            mode: TimedMode::Dfu,
            name: "DFU mode",
            ui_state: UiState::DfuMode,
            read_mode: None,
            requires_provisioned: false,
            timeout: ModeConfig::dfu_mode_timeout,
        },
    ]
}
