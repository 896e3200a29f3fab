//! Advertising adapter.
//!
//! Holds the pairing-advertisement state requested by the mode engine and
//! keeps the SMP service UUID placement consistent with it:
//!
//! | Update transport | Advertising mode  | SMP UUID placement |
//! |------------------|-------------------|--------------------|
//! | disabled         | any               | none               |
//! | enabled          | discoverable      | advertising data   |
//! | enabled          | not-discoverable  | scan response      |
//! | enabled          | off               | none               |
//!
//! The radio stack itself is outside this crate; it reads [`mode`],
//! [`rotation_suspended`] and the [`SmpAdvProvider`] when it rebuilds its
//! advertising set.
//!
//! [`mode`]: AdvertisingAdapter::mode
//! [`rotation_suspended`]: AdvertisingAdapter::rotation_suspended

use log::info;

use crate::app::ports::{AdvMode, AdvertisingPort, PortError};
use crate::smp::{SmpAdvPlacement, SmpAdvProvider};

pub struct AdvertisingAdapter {
    ready: bool,
    mode: AdvMode,
    rotation_suspended: bool,
    update_transport: bool,
    smp: SmpAdvProvider,
}

impl Default for AdvertisingAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl AdvertisingAdapter {
    /// Starts stopped and not ready; call [`set_ready`](Self::set_ready)
    /// once the radio is up.
    pub fn new() -> Self {
        Self {
            ready: false,
            mode: AdvMode::Off,
            rotation_suspended: false,
            update_transport: false,
            smp: SmpAdvProvider::new(),
        }
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub fn mode(&self) -> AdvMode {
        self.mode
    }

    pub fn rotation_suspended(&self) -> bool {
        self.rotation_suspended
    }

    pub fn update_transport_enabled(&self) -> bool {
        self.update_transport
    }

    pub fn smp_provider(&self) -> &SmpAdvProvider {
        &self.smp
    }

    fn refresh_placement(&mut self) {
        let placement = match (self.update_transport, self.mode) {
            (false, _) | (true, AdvMode::Off) => SmpAdvPlacement::Disabled,
            (true, AdvMode::Discoverable) => SmpAdvPlacement::AdvertisingData,
            (true, AdvMode::NotDiscoverable) => SmpAdvPlacement::ScanResponse,
        };
        self.smp.set_placement(placement);
    }
}

impl AdvertisingPort for AdvertisingAdapter {
    fn set_mode(&mut self, mode: AdvMode) -> Result<(), PortError> {
        if !self.ready {
            return Err(PortError::Unavailable);
        }
        if self.mode != mode {
            info!("ADV | {} -> {}", self.mode.name(), mode.name());
        }
        self.mode = mode;
        self.refresh_placement();
        Ok(())
    }

    fn suspend_address_rotation(&mut self, suspend: bool) {
        info!(
            "ADV | address rotation {}",
            if suspend { "suspended" } else { "resumed" }
        );
        self.rotation_suspended = suspend;
    }

    fn enable_update_transport(&mut self, enable: bool) {
        info!(
            "ADV | update transport {}",
            if enable { "enabled" } else { "disabled" }
        );
        self.update_transport = enable;
        self.refresh_placement();
    }
}
