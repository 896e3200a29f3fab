//! Beacon read-mode windows.
//!
//! The beacon stack opens a read window when asked and closes it on its own
//! schedule.  This adapter models that: each window has its own deadline,
//! and [`advance`](ReadWindowAdapter::advance) posts a
//! [`ModeEvent::ReadModeExited`] for every window that has closed.

use embassy_time::{Duration, Instant};
use log::{info, warn};

use crate::app::ports::{PortError, ReadMode, ReadModePort};
use crate::config::ModeConfig;
use crate::events::{EventBus, ModeEvent};

pub struct ReadWindowAdapter {
    now: Instant,
    recovery: Option<Instant>,
    identification: Option<Instant>,
    recovery_len: Duration,
    identification_len: Duration,
}

impl ReadWindowAdapter {
    pub fn new(config: &ModeConfig, now: Instant) -> Self {
        Self {
            now,
            recovery: None,
            identification: None,
            recovery_len: config.recovery_mode_timeout(),
            identification_len: config.id_mode_timeout(),
        }
    }

    pub fn is_open(&self, mode: ReadMode) -> bool {
        self.slot(mode).is_some()
    }

    /// Close every window whose deadline has passed and report each one.
    pub fn advance(&mut self, now: Instant, bus: &EventBus) {
        if now > self.now {
            self.now = now;
        }
        for mode in [ReadMode::Recovery, ReadMode::Identification] {
            let current = self.now;
            let slot = self.slot_mut(mode);
            if slot.is_some_and(|until| until <= current) {
                *slot = None;
                info!("BEACON | {} read mode closed", mode.name());
                if !bus.post(ModeEvent::ReadModeExited(mode)) {
                    warn!("BEACON | exit of {} read mode lost", mode.name());
                }
            }
        }
    }

    fn slot(&self, mode: ReadMode) -> Option<Instant> {
        match mode {
            ReadMode::Recovery => self.recovery,
            ReadMode::Identification => self.identification,
        }
    }

    fn slot_mut(&mut self, mode: ReadMode) -> &mut Option<Instant> {
        match mode {
            ReadMode::Recovery => &mut self.recovery,
            ReadMode::Identification => &mut self.identification,
        }
    }
}

impl ReadModePort for ReadWindowAdapter {
    fn enter_read_mode(&mut self, mode: ReadMode) -> Result<(), PortError> {
        let len = match mode {
            ReadMode::Recovery => self.recovery_len,
            ReadMode::Identification => self.identification_len,
        };
        let until = self.now + len;
        *self.slot_mut(mode) = Some(until);
        info!("BEACON | {} read mode open for {} s", mode.name(), len.as_secs());
        Ok(())
    }
}
