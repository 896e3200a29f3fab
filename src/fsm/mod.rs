//! Mode engine: the event handlers that keep the tag's modes consistent.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  ModeEngine                                                      │
//! │                                                                  │
//! │   ModeEvent ──▶ handle() ──┬─▶ provisioning / account-key logic  │
//! │                            ├─▶ timed-mode table (states.rs)      │
//! │                            └─▶ FactoryResetScheduler             │
//! │                                                                  │
//! │   ModeLedger (context.rs) ◀── every handler reads/writes it      │
//! │                                                                  │
//! │   directives ──▶ DevicePorts (advertising, keys, read modes,     │
//! │                               UI, factory reset)                 │
//! │   timers     ──▶ TimerPort                                       │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All handlers run in one serialized context.  A handler that hits a
//! collaborator failure logs it, abandons its remaining steps and returns
//! the error; the runner logs and moves on to the next event.

pub mod context;
pub mod states;

use log::{debug, info, warn};

use crate::app::commands::UiRequest;
use crate::app::ports::{AdvMode, DevicePorts, ReadMode, TimerPort, UiState};
use crate::config::ModeConfig;
use crate::error::ModeError;
use crate::events::ModeEvent;
use crate::scheduler::FactoryResetScheduler;
use crate::smp::SmpCommand;
use crate::timer::TimerId;

use context::{FactoryResetTrigger, ModeLedger, TimedModeState};
use states::{TimedMode, TimedModeDescriptor, build_mode_table};

pub struct ModeEngine {
    ledger: ModeLedger,
    config: ModeConfig,
    modes: [TimedModeDescriptor; TimedMode::COUNT],
    reset: FactoryResetScheduler,
}

impl ModeEngine {
    pub fn new(config: ModeConfig) -> Self {
        Self {
            ledger: ModeLedger::new(),
            config,
            modes: build_mode_table(),
            reset: FactoryResetScheduler::new(),
        }
    }

    pub fn ledger(&self) -> &ModeLedger {
        &self.ledger
    }

    pub fn config(&self) -> &ModeConfig {
        &self.config
    }

    pub fn factory_reset(&self) -> &FactoryResetScheduler {
        &self.reset
    }

    /// Apply one event.
    pub fn handle(
        &mut self,
        event: ModeEvent,
        timers: &mut impl TimerPort,
        dev: &mut impl DevicePorts,
    ) -> Result<(), ModeError> {
        match event {
            ModeEvent::ProvisioningChanged(provisioned) => {
                self.on_provisioning_changed(provisioned, timers, dev)
            }
            ModeEvent::AccountKeyWritten => self.on_account_key_written(timers, dev),
            ModeEvent::ReadModeExited(mode) => {
                self.on_read_mode_exited(mode, timers, dev);
                Ok(())
            }
            ModeEvent::ClockSynced => self.on_clock_synced(dev),
            ModeEvent::FirmwareUpdateCommand(cmd) => {
                self.on_firmware_update_command(cmd, timers);
                Ok(())
            }
            ModeEvent::UiRequest(request) => self.on_ui_request(request, timers, dev),
            ModeEvent::TimerExpired(id) => self.on_timer_expired(id, dev),
        }
    }

    // ═══════════════════════════════════════════════════════════════
    //  Provisioning
    // ═══════════════════════════════════════════════════════════════

    pub fn on_provisioning_changed(
        &mut self,
        provisioned: bool,
        timers: &mut impl TimerPort,
        dev: &mut impl DevicePorts,
    ) -> Result<(), ModeError> {
        info!(
            "Mode: provisioning state changed: {}",
            if provisioned { "provisioned" } else { "unprovisioned" }
        );

        dev.indicate(UiState::Provisioned, provisioned);
        self.ledger.set_provisioned(provisioned);

        if provisioned
            && self.ledger.factory_reset_trigger() == Some(FactoryResetTrigger::ProvisioningTimeout)
        {
            self.reset.cancel(&mut self.ledger, timers);
            dev.suspend_address_rotation(false);
        }

        let key_present = dev.has_account_key().map_err(|e| {
            warn!("Mode: account key query failed: {}", e);
            ModeError::collaborator("query account key", e)
        })?;
        self.ledger.set_account_key_present(key_present);

        if key_present != provisioned {
            warn!(
                "Mode: account key {} but beacon {}, scheduling factory reset",
                if key_present { "present" } else { "absent" },
                if provisioned { "provisioned" } else { "unprovisioned" }
            );
            // The reset is the recovery path; it goes ahead even if the
            // advertising cannot be stopped.
            if let Err(e) = dev.set_mode(AdvMode::Off) {
                warn!("Mode: failed to stop advertising before reset: {}", e);
            }
            if self.ledger.factory_reset_trigger()
                == Some(FactoryResetTrigger::ProvisioningTimeout)
            {
                dev.suspend_address_rotation(false);
            }
            let delay = self.config.key_mismatch_reset_delay();
            self.reset.schedule(
                FactoryResetTrigger::KeyStateMismatch,
                delay,
                &mut self.ledger,
                timers,
            );
            return Ok(());
        }

        if self.ledger.factory_reset_executed() {
            info!("Mode: factory reset complete, press a button to start discoverable advertising");
            self.ledger.set_factory_reset_executed(false);
            return Ok(());
        }

        let mode = match (provisioned, self.ledger.first_provisioning_callback()) {
            (false, _) => AdvMode::Discoverable,
            (true, true) => AdvMode::NotDiscoverable,
            (true, false) => AdvMode::Off,
        };
        dev.set_mode(mode).map_err(|e| {
            warn!("Mode: failed to set advertising {}: {}", mode.name(), e);
            ModeError::collaborator("set advertising mode", e)
        })?;
        self.ledger.set_first_provisioning_callback(false);
        debug!("Mode: advertising {}", mode.name());
        Ok(())
    }

    pub fn on_account_key_written(
        &mut self,
        timers: &mut impl TimerPort,
        dev: &mut impl DevicePorts,
    ) -> Result<(), ModeError> {
        info!("Mode: account key written");

        dev.set_mode(AdvMode::NotDiscoverable).map_err(|e| {
            warn!("Mode: failed to leave discoverable advertising: {}", e);
            ModeError::collaborator("set advertising mode", e)
        })?;

        if !self.ledger.account_key_present() {
            let timeout = self.config.provisioning_timeout();
            self.reset.schedule(
                FactoryResetTrigger::ProvisioningTimeout,
                timeout,
                &mut self.ledger,
                timers,
            );
            dev.suspend_address_rotation(true);
        }

        let key_present = dev.has_account_key().map_err(|e| {
            warn!("Mode: account key query failed: {}", e);
            ModeError::collaborator("query account key", e)
        })?;
        self.ledger.set_account_key_present(key_present);
        Ok(())
    }

    pub fn on_clock_synced(&mut self, dev: &mut impl DevicePorts) -> Result<(), ModeError> {
        if !self.ledger.provisioned() {
            debug!("Mode: clock synced while unprovisioned, nothing to do");
            return Ok(());
        }
        info!("Mode: clock synced, stopping pairing advertising");
        dev.set_mode(AdvMode::Off)
            .map_err(|e| ModeError::collaborator("set advertising mode", e))
    }

    // ═══════════════════════════════════════════════════════════════
    //  Timed modes
    // ═══════════════════════════════════════════════════════════════

    pub fn on_ui_request(
        &mut self,
        request: UiRequest,
        timers: &mut impl TimerPort,
        dev: &mut impl DevicePorts,
    ) -> Result<(), ModeError> {
        debug!("Mode: UI request {}", request.name());
        let mode = match request {
            UiRequest::EnterRecovery => TimedMode::Recovery,
            UiRequest::EnterIdentification => TimedMode::Identification,
            UiRequest::EnterDfu => TimedMode::Dfu,
        };
        self.enter_timed_mode(mode, timers, dev)
    }

    pub fn on_read_mode_exited(
        &mut self,
        mode: ReadMode,
        timers: &mut impl TimerPort,
        dev: &mut impl DevicePorts,
    ) {
        let mode = TimedMode::from_read_mode(mode);
        timers.cancel(mode.timer());
        self.exit_timed_mode(mode, dev);
    }

    /// Update commands extend the DFU window; everything else is ignored.
    pub fn on_firmware_update_command(&mut self, cmd: SmpCommand, timers: &mut impl TimerPort) {
        if !cmd.is_dfu_related() {
            debug!(
                "DFU: ignoring SMP command group {} id {}",
                cmd.group, cmd.id
            );
            return;
        }
        if !self.ledger.dfu_active() {
            debug!("DFU: update command outside DFU mode, window not extended");
            return;
        }
        let timeout = self.config.dfu_mode_timeout();
        timers.arm(TimerId::DfuMode, timeout);
        debug!("DFU: window extended by {} s", timeout.as_secs());
    }

    pub fn on_timer_expired(
        &mut self,
        id: TimerId,
        dev: &mut impl DevicePorts,
    ) -> Result<(), ModeError> {
        match TimedMode::from_timer(id) {
            Some(mode) => {
                info!("Mode: {} timed out", self.modes[mode as usize].name);
                self.exit_timed_mode(mode, dev);
                Ok(())
            }
            None => {
                // Rotation resumes whether or not the reset itself succeeds.
                let pending = self.ledger.factory_reset_trigger();
                let result = self.reset.on_expired(&mut self.ledger, dev);
                if pending == Some(FactoryResetTrigger::ProvisioningTimeout) {
                    dev.suspend_address_rotation(false);
                }
                result.map(|_| ())
            }
        }
    }

    fn enter_timed_mode(
        &mut self,
        mode: TimedMode,
        timers: &mut impl TimerPort,
        dev: &mut impl DevicePorts,
    ) -> Result<(), ModeError> {
        let desc = &self.modes[mode as usize];

        if desc.requires_provisioned && !self.ledger.provisioned() {
            info!("Mode: {} is unavailable while unprovisioned", desc.name);
            return Ok(());
        }

        let refreshing = self.ledger.mode_state(mode).is_active();
        let timeout = (desc.timeout)(&self.config);

        if let Some(read_mode) = desc.read_mode {
            dev.enter_read_mode(read_mode).map_err(|e| {
                warn!("Mode: beacon refused {} read mode: {}", read_mode.name(), e);
                ModeError::collaborator("enter read mode", e)
            })?;
        }

        if mode == TimedMode::Dfu {
            let adv = if self.ledger.provisioned() {
                AdvMode::NotDiscoverable
            } else {
                AdvMode::Discoverable
            };
            dev.set_mode(adv).map_err(|e| {
                warn!("DFU: failed to set advertising {}: {}", adv.name(), e);
                ModeError::collaborator("set advertising mode", e)
            })?;
            dev.enable_update_transport(true);
        }

        timers.arm(mode.timer(), timeout);
        self.ledger.set_mode_state(mode, TimedModeState::Active);
        dev.indicate(desc.ui_state, true);

        if refreshing {
            info!("Mode: {} refreshed, {} s remaining", desc.name, timeout.as_secs());
        } else {
            info!("Mode: entered {} for {} s", desc.name, timeout.as_secs());
        }
        Ok(())
    }

    /// Leave a timed mode.  Idempotent: leaving an inactive mode does nothing.
    fn exit_timed_mode(&mut self, mode: TimedMode, dev: &mut impl DevicePorts) {
        let desc = &self.modes[mode as usize];

        if !self.ledger.mode_state(mode).is_active() {
            debug!("Mode: {} already inactive", desc.name);
            return;
        }

        self.ledger.set_mode_state(mode, TimedModeState::Inactive);

        if mode == TimedMode::Dfu {
            dev.enable_update_transport(false);
            if let Err(e) = dev.set_mode(AdvMode::Off) {
                warn!("DFU: failed to stop advertising: {}", e);
            }
        }

        dev.indicate(desc.ui_state, false);
        info!("Mode: left {}", desc.name);
    }
}
