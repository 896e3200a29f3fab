//! Device adapter — bundles every collaborator behind the engine's ports.
//!
//! Owns the advertising state, account-key store, beacon read windows and
//! UI, exposing them as one [`DevicePorts`](crate::app::ports::DevicePorts)
//! value.  The runner hands this to the
//! [`ModeService`](crate::app::service::ModeService) on every pass.

use crate::app::ports::{
    AdvMode, AdvertisingPort, FactoryResetPort, KeyStorePort, PortError, ReadMode, ReadModePort,
    StoragePort, UiPort, UiState,
};

use super::advertising::AdvertisingAdapter;
use super::key_store::NvsKeyStore;
use super::read_mode::ReadWindowAdapter;
use super::ui::IndicatorUi;

/// Concrete adapter that combines every collaborator behind port traits.
pub struct DeviceAdapter<S: StoragePort> {
    pub advertising: AdvertisingAdapter,
    pub keys: NvsKeyStore<S>,
    pub read_windows: ReadWindowAdapter,
    pub ui: IndicatorUi,
}

impl<S: StoragePort> DeviceAdapter<S> {
    pub fn new(
        advertising: AdvertisingAdapter,
        keys: NvsKeyStore<S>,
        read_windows: ReadWindowAdapter,
        ui: IndicatorUi,
    ) -> Self {
        Self {
            advertising,
            keys,
            read_windows,
            ui,
        }
    }
}

// ── AdvertisingPort ───────────────────────────────────────────

impl<S: StoragePort> AdvertisingPort for DeviceAdapter<S> {
    fn set_mode(&mut self, mode: AdvMode) -> Result<(), PortError> {
        self.advertising.set_mode(mode)
    }

    fn suspend_address_rotation(&mut self, suspend: bool) {
        self.advertising.suspend_address_rotation(suspend);
    }

    fn enable_update_transport(&mut self, enable: bool) {
        self.advertising.enable_update_transport(enable);
    }
}

// ── KeyStorePort / FactoryResetPort ───────────────────────────

impl<S: StoragePort> KeyStorePort for DeviceAdapter<S> {
    fn has_account_key(&self) -> Result<bool, PortError> {
        self.keys.has_account_key()
    }
}

impl<S: StoragePort> FactoryResetPort for DeviceAdapter<S> {
    fn perform_factory_reset(&mut self) -> Result<(), PortError> {
        self.keys.perform_factory_reset()
    }
}

// ── ReadModePort ──────────────────────────────────────────────

impl<S: StoragePort> ReadModePort for DeviceAdapter<S> {
    fn enter_read_mode(&mut self, mode: ReadMode) -> Result<(), PortError> {
        self.read_windows.enter_read_mode(mode)
    }
}

// ── UiPort ────────────────────────────────────────────────────

impl<S: StoragePort> UiPort for DeviceAdapter<S> {
    fn indicate(&mut self, state: UiState, active: bool) {
        self.ui.indicate(state, active);
    }
}
