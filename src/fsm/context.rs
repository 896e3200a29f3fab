//! The mode ledger: every flag the engine reasons about, in one place.
//!
//! `ModeLedger` is the blackboard the event handlers read and write.  It is
//! only ever mutated from the serialized event context; other contexts see
//! a published snapshot (see [`crate::gate::GateFlags`]).

use core::fmt;

use super::states::TimedMode;

// ---------------------------------------------------------------------------
// Timed mode state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimedModeState {
    #[default]
    Inactive,
    Active,
}

impl TimedModeState {
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

// ---------------------------------------------------------------------------
// Factory reset trigger
// ---------------------------------------------------------------------------

/// Why a reset-to-factory is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryResetTrigger {
    /// Account-key presence disagreed with the provisioning state.
    KeyStateMismatch,
    /// An account key was written but provisioning never completed.
    ProvisioningTimeout,
}

impl fmt::Display for FactoryResetTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyStateMismatch => write!(f, "key-state mismatch"),
            Self::ProvisioningTimeout => write!(f, "provisioning timeout"),
        }
    }
}

// ---------------------------------------------------------------------------
// ModeLedger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeLedger {
    provisioned: bool,
    recovery: TimedModeState,
    identification: TimedModeState,
    dfu: TimedModeState,
    account_key_present: bool,
    /// At most one reset can be pending; a new schedule replaces the old one.
    factory_reset_trigger: Option<FactoryResetTrigger>,
    factory_reset_executed: bool,
    first_provisioning_callback: bool,
}

impl Default for ModeLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeLedger {
    /// Power-on state: everything off, still waiting for the first
    /// provisioning-state callback.
    pub const fn new() -> Self {
        Self {
            provisioned: false,
            recovery: TimedModeState::Inactive,
            identification: TimedModeState::Inactive,
            dfu: TimedModeState::Inactive,
            account_key_present: false,
            factory_reset_trigger: None,
            factory_reset_executed: false,
            first_provisioning_callback: true,
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub const fn provisioned(&self) -> bool {
        self.provisioned
    }

    pub const fn account_key_present(&self) -> bool {
        self.account_key_present
    }

    pub const fn factory_reset_trigger(&self) -> Option<FactoryResetTrigger> {
        self.factory_reset_trigger
    }

    pub const fn factory_reset_pending(&self) -> bool {
        self.factory_reset_trigger.is_some()
    }

    pub const fn factory_reset_executed(&self) -> bool {
        self.factory_reset_executed
    }

    pub const fn first_provisioning_callback(&self) -> bool {
        self.first_provisioning_callback
    }

    pub const fn mode_state(&self, mode: TimedMode) -> TimedModeState {
        match mode {
            TimedMode::Recovery => self.recovery,
            TimedMode::Identification => self.identification,
            TimedMode::Dfu => self.dfu,
        }
    }

    pub const fn recovery_active(&self) -> bool {
        self.recovery.is_active()
    }

    pub const fn identification_active(&self) -> bool {
        self.identification.is_active()
    }

    pub const fn dfu_active(&self) -> bool {
        self.dfu.is_active()
    }

    // ── Mutation (engine only) ────────────────────────────────

    pub(crate) fn set_provisioned(&mut self, provisioned: bool) {
        self.provisioned = provisioned;
    }

    pub(crate) fn set_account_key_present(&mut self, present: bool) {
        self.account_key_present = present;
    }

    pub(crate) fn set_factory_reset_trigger(&mut self, trigger: Option<FactoryResetTrigger>) {
        self.factory_reset_trigger = trigger;
    }

    pub(crate) fn set_factory_reset_executed(&mut self, executed: bool) {
        self.factory_reset_executed = executed;
    }

    pub(crate) fn set_first_provisioning_callback(&mut self, first: bool) {
        self.first_provisioning_callback = first;
    }

    pub(crate) fn set_mode_state(&mut self, mode: TimedMode, state: TimedModeState) {
        match mode {
            TimedMode::Recovery => self.recovery = state,
            TimedMode::Identification => self.identification = state,
            TimedMode::Dfu => self.dfu = state,
        }
    }
}
