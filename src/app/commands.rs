//! Inbound requests from the user interface.
//!
//! Button gestures are turned into [`UiRequest`]s here and posted to the
//! mode engine as [`ModeEvent::UiRequest`](crate::events::ModeEvent::UiRequest).

use crate::config::ModeConfig;

/// Actions a user can request with the tag's buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiRequest {
    EnterRecovery,
    EnterIdentification,
    EnterDfu,
}

impl UiRequest {
    pub const fn name(self) -> &'static str {
        match self {
            Self::EnterRecovery => "enter-recovery",
            Self::EnterIdentification => "enter-identification",
            Self::EnterDfu => "enter-dfu",
        }
    }
}

/// Which physical button produced a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonRole {
    /// Short press: identification.  Long hold: recovery.
    Mode,
    /// Any press: DFU.
    Dfu,
}

/// Map a released button to the request it stands for.
pub fn request_for(role: ButtonRole, held_ms: u32, config: &ModeConfig) -> UiRequest {
    match role {
        ButtonRole::Mode if held_ms >= config.recovery_button_min_hold_ms => {
            UiRequest::EnterRecovery
        }
        ButtonRole::Mode => UiRequest::EnterIdentification,
        ButtonRole::Dfu => UiRequest::EnterDfu,
    }
}
