//! Mock device adapter for integration tests.
//!
//! Records every directive the mode engine issues so tests can assert on
//! the full call history without a radio stack.

use locator_tag::app::ports::{
    AdvMode, AdvertisingPort, FactoryResetPort, KeyStorePort, PortError, ReadMode, ReadModePort,
    UiPort, UiState,
};
use locator_tag::config::ModeConfig;
use locator_tag::fsm::ModeEngine;
use locator_tag::timer::DeadlineTimers;

use embassy_time::Instant;

// ── Directive record ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCall {
    SetAdv(AdvMode),
    SuspendRotation(bool),
    UpdateTransport(bool),
    EnterReadMode(ReadMode),
    Indicate(UiState, bool),
    FactoryReset,
}

// ── MockDevice ────────────────────────────────────────────────

pub struct MockDevice {
    pub calls: Vec<DeviceCall>,
    /// What the key store reports.
    pub key_present: bool,
    pub fail_key_query: bool,
    pub fail_adv: bool,
    pub fail_read_mode: bool,
    pub fail_reset: bool,
}

#[allow(dead_code)]
impl MockDevice {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            key_present: false,
            fail_key_query: false,
            fail_adv: false,
            fail_read_mode: false,
            fail_reset: false,
        }
    }

    pub fn with_key() -> Self {
        Self {
            key_present: true,
            ..Self::new()
        }
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    pub fn last_adv(&self) -> Option<AdvMode> {
        self.calls.iter().rev().find_map(|c| match c {
            DeviceCall::SetAdv(mode) => Some(*mode),
            _ => None,
        })
    }

    pub fn ui_shown(&self, state: UiState) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                DeviceCall::Indicate(s, on) if *s == state => Some(*on),
                _ => None,
            })
            .unwrap_or(false)
    }

    /// Latest address-rotation directive, if any was issued.
    pub fn rotation_suspended(&self) -> Option<bool> {
        self.calls.iter().rev().find_map(|c| match c {
            DeviceCall::SuspendRotation(suspend) => Some(*suspend),
            _ => None,
        })
    }

    pub fn count(&self, call: DeviceCall) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl AdvertisingPort for MockDevice {
    fn set_mode(&mut self, mode: AdvMode) -> Result<(), PortError> {
        if self.fail_adv {
            return Err(PortError::Unavailable);
        }
        self.calls.push(DeviceCall::SetAdv(mode));
        Ok(())
    }

    fn suspend_address_rotation(&mut self, suspend: bool) {
        self.calls.push(DeviceCall::SuspendRotation(suspend));
    }

    fn enable_update_transport(&mut self, enable: bool) {
        self.calls.push(DeviceCall::UpdateTransport(enable));
    }
}

impl KeyStorePort for MockDevice {
    fn has_account_key(&self) -> Result<bool, PortError> {
        if self.fail_key_query {
            Err(PortError::Io)
        } else {
            Ok(self.key_present)
        }
    }
}

impl ReadModePort for MockDevice {
    fn enter_read_mode(&mut self, mode: ReadMode) -> Result<(), PortError> {
        if self.fail_read_mode {
            return Err(PortError::Rejected);
        }
        self.calls.push(DeviceCall::EnterReadMode(mode));
        Ok(())
    }
}

impl UiPort for MockDevice {
    fn indicate(&mut self, state: UiState, active: bool) {
        self.calls.push(DeviceCall::Indicate(state, active));
    }
}

impl FactoryResetPort for MockDevice {
    fn perform_factory_reset(&mut self) -> Result<(), PortError> {
        self.calls.push(DeviceCall::FactoryReset);
        if self.fail_reset {
            return Err(PortError::Io);
        }
        self.key_present = false;
        Ok(())
    }
}

// ── Harness ───────────────────────────────────────────────────

/// Engine, timers and mock device, with time starting at zero.
pub struct Harness {
    pub engine: ModeEngine,
    pub timers: DeadlineTimers,
    pub dev: MockDevice,
}

#[allow(dead_code)]
impl Harness {
    pub fn new(dev: MockDevice) -> Self {
        Self {
            engine: ModeEngine::new(ModeConfig::default()),
            timers: DeadlineTimers::new(Instant::from_secs(0)),
            dev,
        }
    }

    /// A harness that has already seen `ProvisioningChanged(true)` with a key.
    pub fn provisioned() -> Self {
        let mut h = Self::new(MockDevice::with_key());
        h.send(locator_tag::events::ModeEvent::ProvisioningChanged(true))
            .expect("provisioning");
        h.dev.clear();
        h
    }

    pub fn send(
        &mut self,
        event: locator_tag::events::ModeEvent,
    ) -> Result<(), locator_tag::error::ModeError> {
        self.engine.handle(event, &mut self.timers, &mut self.dev)
    }

    /// Advance to `secs` and deliver every expired timer.
    pub fn advance_to_secs(&mut self, secs: u64) {
        self.advance_to(Instant::from_secs(secs));
    }

    pub fn advance_to(&mut self, now: Instant) {
        for id in self.timers.advance(now) {
            let _ = self.send(locator_tag::events::ModeEvent::TimerExpired(id));
        }
    }
}
