//! Unified error types for the locator-tag mode controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! top-level event loop's error handling uniform.  All variants are `Copy`
//! so they can be returned from the serialized event context and logged
//! without allocation.

use core::fmt;

use crate::app::ports::{ConfigError, PortError, StorageError};
use crate::fsm::context::FactoryResetTrigger;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An event could not be fully applied by the mode engine.
    Mode(ModeError),
    /// An inbound event payload was malformed.
    Event(EventError),
    /// Startup did not complete.
    Startup(StartupError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// Persistent storage failed.
    Storage(StorageError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mode(e) => write!(f, "mode: {e}"),
            Self::Event(e) => write!(f, "event: {e}"),
            Self::Startup(e) => write!(f, "startup: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
        }
    }
}

impl From<ModeError> for Error {
    fn from(e: ModeError) -> Self {
        Self::Mode(e)
    }
}

impl From<EventError> for Error {
    fn from(e: EventError) -> Self {
        Self::Event(e)
    }
}

impl From<StartupError> for Error {
    fn from(e: StartupError) -> Self {
        Self::Startup(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Mode engine errors
// ---------------------------------------------------------------------------

/// A collaborator call failed while the engine was handling an event.
///
/// The remaining steps of that event were abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeError {
    /// `step` names the directive that failed.
    Collaborator {
        step: &'static str,
        source: PortError,
    },
    /// The reset-to-factory action failed when the reset timer fired.
    /// The pending trigger has already been cleared.
    FactoryResetFailed {
        trigger: FactoryResetTrigger,
        source: PortError,
    },
}

impl ModeError {
    pub const fn collaborator(step: &'static str, source: PortError) -> Self {
        Self::Collaborator { step, source }
    }
}

impl fmt::Display for ModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collaborator { step, source } => write!(f, "{step} failed: {source}"),
            Self::FactoryResetFailed { trigger, source } => {
                write!(f, "factory reset ({trigger}) failed: {source}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound payload errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventError {
    /// The transport delivered a callback for an event we never registered.
    SpuriousEvent(u32),
    /// Payload length does not match the expected structure.
    InvalidSize { got: usize, expected: usize },
    /// SMP header carried an operation code outside the request/response set.
    UnknownOp(u8),
    /// The read-mode collaborator reported a mode this controller never opens.
    UnknownReadMode(u8),
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpuriousEvent(id) => write!(f, "spurious event {id:#x}"),
            Self::InvalidSize { got, expected } => {
                write!(f, "invalid payload size {got} (expected {expected})")
            }
            Self::UnknownOp(op) => write!(f, "unknown SMP op {op}"),
            Self::UnknownReadMode(raw) => write!(f, "unknown read mode {raw}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Startup errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupError {
    /// An initialisation stage failed; startup stopped there.
    Stage {
        stage: &'static str,
        source: PortError,
    },
    /// Initialisation did not signal completion within the handshake timeout.
    Timeout,
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stage { stage, source } => write!(f, "stage '{stage}' failed: {source}"),
            Self::Timeout => write!(f, "initialisation handshake timed out"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
