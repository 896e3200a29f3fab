//! Startup sequence and the initialisation handshake.
//!
//! Initialisation runs on the controller's own thread, in a fixed order.
//! The first stage that fails stops the sequence.  The entry point waits
//! for the outcome on an [`InitHandshake`] with a bounded timeout and
//! halts if initialisation failed or never reported back.
//!
//! ```text
//!  main ──spawn──▶ controller thread
//!    │               run_init_sequence()
//!    │                 ui → pairing cb → gatt cb → radio → settings → …
//!    │               handshake.complete(result)
//!    ▼                    │
//!  handshake.wait(timeout) ◀──┘
//! ```

use core::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::{error, info};

use crate::app::ports::PortError;
use crate::error::StartupError;

/// Initialisation stages, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStage {
    UserInterface,
    PairingCallbacks,
    AttributeAuthorization,
    Radio,
    Settings,
    Identity,
    Battery,
    Ringing,
    FastPairPrepare,
    BeaconPrepare,
    FactoryReset,
    FastPairEnable,
    FirmwareUpdate,
}

impl InitStage {
    pub const SEQUENCE: [InitStage; 13] = [
        InitStage::UserInterface,
        InitStage::PairingCallbacks,
        InitStage::AttributeAuthorization,
        InitStage::Radio,
        InitStage::Settings,
        InitStage::Identity,
        InitStage::Battery,
        InitStage::Ringing,
        InitStage::FastPairPrepare,
        InitStage::BeaconPrepare,
        InitStage::FactoryReset,
        InitStage::FastPairEnable,
        InitStage::FirmwareUpdate,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::UserInterface => "user interface",
            Self::PairingCallbacks => "pairing callbacks",
            Self::AttributeAuthorization => "attribute authorization",
            Self::Radio => "radio",
            Self::Settings => "settings",
            Self::Identity => "identity",
            Self::Battery => "battery",
            Self::Ringing => "ringing",
            Self::FastPairPrepare => "fast pair prepare",
            Self::BeaconPrepare => "beacon prepare",
            Self::FactoryReset => "factory reset",
            Self::FastPairEnable => "fast pair enable",
            Self::FirmwareUpdate => "firmware update",
        }
    }
}

/// Platform hooks for each initialisation stage.
pub trait PlatformInit {
    fn init_stage(&mut self, stage: InitStage) -> Result<(), PortError>;
}

/// Run every stage in order, stopping at the first failure.
pub fn run_init_sequence(platform: &mut impl PlatformInit) -> Result<(), StartupError> {
    for stage in InitStage::SEQUENCE {
        if let Err(source) = platform.init_stage(stage) {
            error!("Startup: {} init failed: {}", stage.name(), source);
            return Err(StartupError::Stage {
                stage: stage.name(),
                source,
            });
        }
        info!("Startup: {} ready", stage.name());
    }
    info!("Startup: initialisation complete");
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Handshake
// ───────────────────────────────────────────────────────────────

/// One-shot completion signal between the controller thread and the
/// entry point.
pub struct InitHandshake {
    signal: Signal<CriticalSectionRawMutex, Result<(), StartupError>>,
}

impl Default for InitHandshake {
    fn default() -> Self {
        Self::new()
    }
}

impl InitHandshake {
    pub const fn new() -> Self {
        Self {
            signal: Signal::new(),
        }
    }

    /// Report the outcome of initialisation.
    pub fn complete(&self, result: Result<(), StartupError>) {
        self.signal.signal(result);
    }

    /// Wait for the outcome, giving up after `timeout`.
    pub async fn wait(&self, timeout: Duration) -> Result<(), StartupError> {
        futures_lite::future::or(self.signal.wait(), async {
            async_io_mini::Timer::after(timeout).await;
            Err(StartupError::Timeout)
        })
        .await
    }

    /// Blocking form of [`wait`](Self::wait) for the synchronous entry point.
    pub fn block_on_wait(&self, timeout: Duration) -> Result<(), StartupError> {
        futures_lite::future::block_on(self.wait(timeout))
    }
}
