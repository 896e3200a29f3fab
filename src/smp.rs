//! SMP (Simple Management Protocol) plumbing for DFU mode.
//!
//! Two concerns live here:
//!
//! * decoding the 8-byte SMP request header delivered by the management
//!   transport's command-received hook, and deciding whether the command
//!   is part of a firmware update (which extends the DFU window);
//! * deciding where the SMP service UUID goes in the pairing advertisement
//!   while the update transport is enabled.
//!
//! ## Header layout
//!
//! ```text
//!  byte  0      1      2..4        4..6         6      7
//!       ┌──────┬──────┬───────────┬────────────┬──────┬──────┐
//!       │ op   │flags │ len (BE)  │ group (BE) │ seq  │ id   │
//!       └──────┴──────┴───────────┴────────────┴──────┴──────┘
//! ```
//!
//! The low three bits of `op` carry the operation; the upper bits carry the
//! protocol version and are ignored.

use log::debug;

use crate::error::EventError;

/// Size of the SMP header on the wire.
pub const SMP_HEADER_LEN: usize = 8;

/// Management event id for "command received", the only transport event
/// this controller subscribes to.
pub const MGMT_EVT_CMD_RECV: u32 = 0x0000_0001;

/// OS management group.
pub const MGMT_GROUP_ID_OS: u16 = 0;
/// Image management group.
pub const MGMT_GROUP_ID_IMAGE: u16 = 1;
/// Reset command within the OS group.
pub const OS_MGMT_ID_RESET: u8 = 5;

/// SMP service UUID 8d53dc1d-1db7-4cd3-868b-8a527460aa84, little-endian.
pub const SMP_SERVICE_UUID: [u8; 16] = [
    0x84, 0xaa, 0x60, 0x74, 0x52, 0x8a, 0x8b, 0x86, 0xd3, 0x4c, 0xb7, 0x1d, 0x1d, 0xdc, 0x53, 0x8d,
];

// ───────────────────────────────────────────────────────────────
// Command header
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SmpOp {
    Read = 0,
    ReadRsp = 1,
    Write = 2,
    WriteRsp = 3,
}

impl SmpOp {
    fn from_raw(raw: u8) -> Result<Self, EventError> {
        match raw & 0x07 {
            0 => Ok(Self::Read),
            1 => Ok(Self::ReadRsp),
            2 => Ok(Self::Write),
            3 => Ok(Self::WriteRsp),
            other => Err(EventError::UnknownOp(other)),
        }
    }
}

/// A received SMP command, reduced to what the mode engine needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmpCommand {
    pub op: SmpOp,
    pub group: u16,
    pub id: u8,
    pub seq: u8,
}

impl SmpCommand {
    /// Shorthand for a write request, which is what every DFU command is.
    pub const fn request(group: u16, id: u8) -> Self {
        Self {
            op: SmpOp::Write,
            group,
            id,
            seq: 0,
        }
    }

    /// Decode a raw SMP header.  The payload must be exactly one header.
    pub fn decode_header(data: &[u8]) -> Result<Self, EventError> {
        let header: &[u8; SMP_HEADER_LEN] =
            data.try_into().map_err(|_| EventError::InvalidSize {
                got: data.len(),
                expected: SMP_HEADER_LEN,
            })?;

        Ok(Self {
            op: SmpOp::from_raw(header[0])?,
            group: u16::from_be_bytes([header[4], header[5]]),
            seq: header[6],
            id: header[7],
        })
    }

    /// Decode the payload of a management-transport callback.  Events other
    /// than "command received" are rejected as spurious.
    pub fn from_callback(event: u32, data: &[u8]) -> Result<Self, EventError> {
        if event != MGMT_EVT_CMD_RECV {
            return Err(EventError::SpuriousEvent(event));
        }
        Self::decode_header(data)
    }

    /// Image upload/erase/test commands and the OS reset that completes an
    /// update.  Only these keep DFU mode alive.
    pub const fn is_dfu_related(&self) -> bool {
        self.group == MGMT_GROUP_ID_IMAGE
            || (self.group == MGMT_GROUP_ID_OS && self.id == OS_MGMT_ID_RESET)
    }
}

// ───────────────────────────────────────────────────────────────
// Advertising placement
// ───────────────────────────────────────────────────────────────

/// Where the SMP service UUID is placed in the pairing advertisement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmpAdvPlacement {
    #[default]
    Disabled,
    /// In the advertising payload (discoverable pairing advertising).
    AdvertisingData,
    /// In the scan response (not-discoverable advertising, where the
    /// advertising payload is full).
    ScanResponse,
}

/// Advertising data provider for the SMP service UUID.
#[derive(Debug, Clone, Default)]
pub struct SmpAdvProvider {
    placement: SmpAdvPlacement,
}

impl SmpAdvProvider {
    pub const fn new() -> Self {
        Self {
            placement: SmpAdvPlacement::Disabled,
        }
    }

    pub fn placement(&self) -> SmpAdvPlacement {
        self.placement
    }

    pub fn set_placement(&mut self, placement: SmpAdvPlacement) {
        if self.placement != placement {
            debug!("SMP adv: placement {:?} -> {:?}", self.placement, placement);
            self.placement = placement;
        }
    }

    /// UUID bytes for the advertising payload, if placed there.
    pub fn advertising_data(&self) -> Option<&'static [u8; 16]> {
        match self.placement {
            SmpAdvPlacement::AdvertisingData => Some(&SMP_SERVICE_UUID),
            _ => None,
        }
    }

    /// UUID bytes for the scan response, if placed there.
    pub fn scan_response_data(&self) -> Option<&'static [u8; 16]> {
        match self.placement {
            SmpAdvPlacement::ScanResponse => Some(&SMP_SERVICE_UUID),
            _ => None,
        }
    }
}
