//! Attribute access gate and pairing policy.
//!
//! The GATT server asks, per attribute access, whether a peer may touch an
//! attribute.  Two classes of attribute are mode-dependent:
//!
//! | Resource          | Allowed when                                   |
//! |-------------------|------------------------------------------------|
//! | `UpdateTransport` | DFU mode is active                             |
//! | `IdentifyingInfo` | unprovisioned, or identification mode active   |
//! | `Other`           | always                                         |
//!
//! Access checks happen on the radio stack's own thread, outside the
//! serialized event context.  They read [`GateFlags`], a lock-free snapshot
//! the runner publishes after every event.

use core::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};

use crate::fsm::context::ModeLedger;

/// SMP characteristic da2e7828-fbce-4e01-ae9e-261174997c48.
pub const SMP_CHARACTERISTIC_UUID: u128 = 0xda2e_7828_fbce_4e01_ae9e_2611_7499_7c48;

/// GAP Device Name characteristic.
pub const GAP_DEVICE_NAME_UUID: u16 = 0x2A00;

/// Attributes that reveal who the tag is.
const IDENTIFYING_UUIDS: &[AttributeUuid] = &[AttributeUuid::Uuid16(GAP_DEVICE_NAME_UUID)];

// ───────────────────────────────────────────────────────────────
// Classification
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeUuid {
    Uuid16(u16),
    Uuid128(u128),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    UpdateTransport,
    IdentifyingInfo,
    Other,
}

pub fn classify(uuid: AttributeUuid) -> Resource {
    if uuid == AttributeUuid::Uuid128(SMP_CHARACTERISTIC_UUID) {
        Resource::UpdateTransport
    } else if IDENTIFYING_UUIDS.contains(&uuid) {
        Resource::IdentifyingInfo
    } else {
        Resource::Other
    }
}

// ───────────────────────────────────────────────────────────────
// Decision
// ───────────────────────────────────────────────────────────────

/// The three flags an access decision depends on.
pub trait ModeView {
    fn provisioned(&self) -> bool;
    fn identification_active(&self) -> bool;
    fn dfu_active(&self) -> bool;
}

impl ModeView for ModeLedger {
    fn provisioned(&self) -> bool {
        ModeLedger::provisioned(self)
    }

    fn identification_active(&self) -> bool {
        ModeLedger::identification_active(self)
    }

    fn dfu_active(&self) -> bool {
        ModeLedger::dfu_active(self)
    }
}

pub fn allow(resource: Resource, view: &impl ModeView) -> bool {
    match resource {
        Resource::UpdateTransport => view.dfu_active(),
        Resource::IdentifyingInfo => !view.provisioned() || view.identification_active(),
        Resource::Other => true,
    }
}

/// GATT authorization hook: classify, decide, log denials.
pub fn authorize_attribute(uuid: AttributeUuid, view: &impl ModeView) -> bool {
    let resource = classify(uuid);
    let allowed = allow(resource, view);
    if allowed {
        debug!("Gate: {:?} access allowed", resource);
    } else {
        match resource {
            Resource::UpdateTransport => {
                warn!("Gate: DFU access denied, enter DFU mode first");
            }
            Resource::IdentifyingInfo => {
                warn!("Gate: identifying info access denied, enter identification mode first");
            }
            Resource::Other => {}
        }
    }
    allowed
}

// ───────────────────────────────────────────────────────────────
// Pairing
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingDecision {
    Accept,
    Reject,
}

/// Normal (non-Fast-Pair) pairing is never accepted.
pub fn pairing_accept() -> PairingDecision {
    warn!("Gate: normal pairing rejected");
    PairingDecision::Reject
}

// ───────────────────────────────────────────────────────────────
// Published snapshot
// ───────────────────────────────────────────────────────────────

/// Lock-free copy of the gate-relevant ledger flags.
pub struct GateFlags {
    provisioned: AtomicBool,
    identification: AtomicBool,
    dfu: AtomicBool,
}

impl Default for GateFlags {
    fn default() -> Self {
        Self::new()
    }
}

impl GateFlags {
    /// Starts closed for the update transport and open for identifying
    /// info, matching an unprovisioned tag.
    pub const fn new() -> Self {
        Self {
            provisioned: AtomicBool::new(false),
            identification: AtomicBool::new(false),
            dfu: AtomicBool::new(false),
        }
    }

    pub fn publish(&self, ledger: &ModeLedger) {
        self.provisioned.store(ledger.provisioned(), Ordering::Release);
        self.identification
            .store(ledger.identification_active(), Ordering::Release);
        self.dfu.store(ledger.dfu_active(), Ordering::Release);
    }
}

impl ModeView for GateFlags {
    fn provisioned(&self) -> bool {
        self.provisioned.load(Ordering::Acquire)
    }

    fn identification_active(&self) -> bool {
        self.identification.load(Ordering::Acquire)
    }

    fn dfu_active(&self) -> bool {
        self.dfu.load(Ordering::Acquire)
    }
}

/// Process-wide gate snapshot read by the GATT authorization callback.
pub static GATE: GateFlags = GateFlags::new();
