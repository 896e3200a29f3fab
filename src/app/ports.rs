//! Port traits — the hexagonal boundary between the mode engine and the
//! rest of the tag firmware.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ModeEngine (domain)
//! ```
//!
//! The advertising manager, account-key store, beacon read-mode windows,
//! user interface and reset-to-factory action are all collaborators the
//! engine only *directs*.  Adapters implement these traits; the engine
//! consumes them through generics so the domain core never touches the
//! radio stack or flash directly.
//!
//! ## Error convention
//!
//! Every directive whose failure the engine must react to returns
//! `Result<_, PortError>`.  Directives that cannot meaningfully fail
//! (UI indication, address-rotation suspension, update-transport toggling)
//! are infallible; adapters log their own problems.

use embassy_time::Duration;

use crate::config::ModeConfig;
use crate::timer::TimerId;

// ───────────────────────────────────────────────────────────────
// Shared vocabulary
// ───────────────────────────────────────────────────────────────

/// Advertising modes the engine can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvMode {
    Off,
    Discoverable,
    NotDiscoverable,
}

impl AdvMode {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Discoverable => "discoverable",
            Self::NotDiscoverable => "not-discoverable",
        }
    }
}

/// Beacon read-mode windows managed by the beacon collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReadMode {
    /// Ephemeral identity key readable.
    Recovery = 0,
    /// Identifying information readable.
    Identification = 1,
}

impl ReadMode {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Recovery => "recovery",
            Self::Identification => "identification",
        }
    }
}

impl TryFrom<u8> for ReadMode {
    type Error = crate::error::EventError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Recovery),
            1 => Ok(Self::Identification),
            other => Err(crate::error::EventError::UnknownReadMode(other)),
        }
    }
}

/// Conditions the user interface can be told about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum UiState {
    AppRunning = 0,
    Provisioned = 1,
    RecoveryMode = 2,
    IdentificationMode = 3,
    DfuMode = 4,
}

impl UiState {
    pub const COUNT: usize = 5;

    pub const fn name(self) -> &'static str {
        match self {
            Self::AppRunning => "app-running",
            Self::Provisioned => "provisioned",
            Self::RecoveryMode => "recovery-mode",
            Self::IdentificationMode => "identification-mode",
            Self::DfuMode => "dfu-mode",
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Advertising port (domain → radio stack)
// ───────────────────────────────────────────────────────────────

pub trait AdvertisingPort {
    /// Switch the pairing advertisement mode.
    fn set_mode(&mut self, mode: AdvMode) -> Result<(), PortError>;

    /// Suspend (or resume) random-address rotation.  Suspension keeps the
    /// address stable while a provisioning sequence is in flight.
    fn suspend_address_rotation(&mut self, suspend: bool);

    /// Include (or drop) the firmware-update transport in advertising.
    fn enable_update_transport(&mut self, enable: bool);
}

// ───────────────────────────────────────────────────────────────
// Account-key store (domain → persistent keys)
// ───────────────────────────────────────────────────────────────

pub trait KeyStorePort {
    /// Whether at least one account key is stored.
    fn has_account_key(&self) -> Result<bool, PortError>;
}

// ───────────────────────────────────────────────────────────────
// Beacon read-mode windows (domain → beacon stack)
// ───────────────────────────────────────────────────────────────

pub trait ReadModePort {
    /// Open (or re-open) a read-mode window in the beacon stack.
    /// The beacon stack reports the window's end as a
    /// [`ModeEvent::ReadModeExited`](crate::events::ModeEvent::ReadModeExited).
    fn enter_read_mode(&mut self, mode: ReadMode) -> Result<(), PortError>;
}

// ───────────────────────────────────────────────────────────────
// User interface (domain → LED / buzzer)
// ───────────────────────────────────────────────────────────────

pub trait UiPort {
    fn indicate(&mut self, state: UiState, active: bool);
}

// ───────────────────────────────────────────────────────────────
// Reset-to-factory action (domain → key store / flash)
// ───────────────────────────────────────────────────────────────

pub trait FactoryResetPort {
    /// Erase all provisioning material.  Completion is reported back through
    /// the normal provisioning-state callback.
    fn perform_factory_reset(&mut self) -> Result<(), PortError>;
}

/// Every collaborator the mode engine directs, bundled.
///
/// Blanket-implemented, so a single adapter struct (or a test double) that
/// implements the five ports can be handed to the engine as one value.
pub trait DevicePorts:
    AdvertisingPort + KeyStorePort + ReadModePort + UiPort + FactoryResetPort
{
}

impl<T> DevicePorts for T where
    T: AdvertisingPort + KeyStorePort + ReadModePort + UiPort + FactoryResetPort
{
}

// ───────────────────────────────────────────────────────────────
// Timer port (domain → one-shot timers)
// ───────────────────────────────────────────────────────────────

/// One-shot timers keyed by [`TimerId`].
///
/// Expiry is delivered back to the engine as
/// [`ModeEvent::TimerExpired`](crate::events::ModeEvent::TimerExpired)
/// in the same serialized context as every other event.
pub trait TimerPort {
    /// Arm `id` to fire after `after`.  Re-arming replaces the previous
    /// deadline; there is never more than one deadline per id.
    fn arm(&mut self, id: TimerId, after: Duration);

    /// Disarm `id`.  Returns `true` if it was armed.
    fn cancel(&mut self, id: TimerId) -> bool;

    fn is_armed(&self, id: TimerId) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists controller configuration.
///
/// Implementations MUST validate before persisting and reject invalid
/// ranges with [`ConfigError::ValidationFailed`].
pub trait ConfigPort {
    /// Returns [`ModeConfig::default()`] if nothing is stored.
    fn load(&self) -> Result<ModeConfig, ConfigError>;

    fn save(&self, config: &ModeConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Namespaced key-value storage.  Writes MUST be atomic.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Failure reported by a collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortError {
    /// Collaborator not ready (stack disabled, not initialised).
    Unavailable,
    /// Collaborator refused the request in its current state.
    Rejected,
    /// Storage or bus failure underneath the collaborator.
    Io,
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    StorageFull,
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    NotFound,
    Full,
    IoError,
    /// Caller's buffer is smaller than the stored value.
    BufferTooSmall,
}

impl core::fmt::Display for PortError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unavailable => write!(f, "collaborator unavailable"),
            Self::Rejected => write!(f, "request rejected"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
        }
    }
}

impl From<StorageError> for PortError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => Self::Unavailable,
            StorageError::Full | StorageError::IoError | StorageError::BufferTooSmall => Self::Io,
        }
    }
}
