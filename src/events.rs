//! Mode events and the queue that serializes them.
//!
//! Events are produced by:
//! - the beacon stack (provisioning changes, account keys, read-mode exits,
//!   clock synchronisation)
//! - the management transport (firmware-update commands)
//! - button gestures (UI requests)
//! - the deadline timers (expiries)
//!
//! Every producer posts into one bounded [`EventBus`]; a single consumer
//! applies them to the mode engine one at a time, in arrival order.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Beacon stack│────▶│              │     │              │
//! │ SMP hook    │────▶│   EventBus   │────▶│ ModeService  │
//! │ Buttons     │────▶│  (bounded)   │     │  (consumer)  │
//! │ Read windows│────▶│              │     │              │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::app::commands::UiRequest;
use crate::app::ports::ReadMode;
use crate::error::EventError;
use crate::smp::SmpCommand;
use crate::timer::TimerId;

/// Events the mode engine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeEvent {
    // ── Beacon stack ──────────────────────────────────────
    /// The beacon reported its provisioning state.  Also delivered once
    /// at boot with the restored state.
    ProvisioningChanged(bool),
    /// An account key was written by a pairing peer.
    AccountKeyWritten,
    /// A read-mode window closed on the beacon side.
    ReadModeExited(ReadMode),
    /// The beacon's clock was synchronised by an owner device.
    ClockSynced,

    // ── Management transport ──────────────────────────────
    FirmwareUpdateCommand(SmpCommand),

    // ── User interface ────────────────────────────────────
    UiRequest(UiRequest),

    // ── Timers ────────────────────────────────────────────
    TimerExpired(TimerId),
}

impl ModeEvent {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ProvisioningChanged(_) => "provisioning-changed",
            Self::AccountKeyWritten => "account-key-written",
            Self::ReadModeExited(_) => "read-mode-exited",
            Self::ClockSynced => "clock-synced",
            Self::FirmwareUpdateCommand(_) => "firmware-update-command",
            Self::UiRequest(_) => "ui-request",
            Self::TimerExpired(_) => "timer-expired",
        }
    }
}

/// Number of events that may be pending at once.
pub const EVENT_QUEUE_DEPTH: usize = 16;

/// Bounded multi-producer queue feeding the serialized event context.
///
/// Safe to post from any thread; the `CriticalSectionRawMutex` makes it
/// usable from interrupt context too.
pub struct EventBus {
    channel: Channel<CriticalSectionRawMutex, ModeEvent, EVENT_QUEUE_DEPTH>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Enqueue an event without blocking.  Returns `false` (and logs) if
    /// the queue is full and the event was dropped.
    pub fn post(&self, event: ModeEvent) -> bool {
        match self.channel.try_send(event) {
            Ok(()) => true,
            Err(_) => {
                warn!("EventBus: queue full, dropping {}", event.name());
                false
            }
        }
    }

    /// Dequeue the next pending event, if any.
    pub fn try_next(&self) -> Option<ModeEvent> {
        self.channel.try_receive().ok()
    }

    /// Wait for the next event.
    pub async fn next(&self) -> ModeEvent {
        self.channel.receive().await
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

/// Process-wide event bus used by the firmware entry point.
pub static EVENTS: EventBus = EventBus::new();

// ── Producer helpers for raw callback payloads ────────────────

/// Management-transport hook: decode the SMP header and post it.
/// Malformed or spurious callbacks are rejected and nothing is posted.
pub fn post_smp_callback(bus: &EventBus, event: u32, data: &[u8]) -> Result<(), EventError> {
    let cmd = SmpCommand::from_callback(event, data).inspect_err(|e| {
        warn!("EventBus: rejected SMP callback: {}", e);
    })?;
    bus.post(ModeEvent::FirmwareUpdateCommand(cmd));
    Ok(())
}

/// Beacon hook: a read-mode window closed.  Unknown modes are rejected.
pub fn post_read_mode_exit(bus: &EventBus, raw_mode: u8) -> Result<(), EventError> {
    let mode = ReadMode::try_from(raw_mode).inspect_err(|e| {
        warn!("EventBus: rejected read-mode exit: {}", e);
    })?;
    bus.post(ModeEvent::ReadModeExited(mode));
    Ok(())
}
