//! Mode service — the serialized event context.
//!
//! [`ModeService`] owns the [`ModeEngine`] and its deadline timers.  Each
//! pass of the runner:
//!
//! 1. advances the timers to the current instant, feeding every expiry to
//!    the engine as a `TimerExpired` event;
//! 2. drains the [`EventBus`] in arrival order;
//! 3. publishes the gate snapshot.
//!
//! [`ModeService::run_woken`] is the same pass for an event the caller
//! already received from the bus.
//!
//! ```text
//!  EventBus ──▶ ┌────────────────────────┐ ──▶ DevicePorts
//!               │      ModeService        │
//!  now ───────▶ │  ModeEngine · Timers    │ ──▶ GateFlags
//!               └────────────────────────┘
//! ```
//!
//! Collaborator failures never stop the runner: they are logged and the
//! next event is processed.

use embassy_time::Instant;
use log::{info, warn};

use crate::config::ModeConfig;
use crate::error::ModeError;
use crate::events::{EventBus, ModeEvent};
use crate::fsm::ModeEngine;
use crate::fsm::context::ModeLedger;
use crate::gate::GateFlags;
use crate::timer::DeadlineTimers;

use super::ports::{DevicePorts, UiPort, UiState};

// ───────────────────────────────────────────────────────────────
// ModeService
// ───────────────────────────────────────────────────────────────

pub struct ModeService {
    engine: ModeEngine,
    timers: DeadlineTimers,
    handled: u32,
    failed: u32,
}

impl ModeService {
    pub fn new(config: ModeConfig, now: Instant) -> Self {
        info!(
            "ModeService: recovery {} min, identification {} min, DFU {} min",
            config.recovery_mode_timeout_min, config.id_mode_timeout_min, config.dfu_mode_timeout_min
        );
        Self {
            engine: ModeEngine::new(config),
            timers: DeadlineTimers::new(now),
            handled: 0,
            failed: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Signal that startup finished and the controller is live.
    pub fn start(&mut self, ui: &mut impl UiPort) {
        ui.indicate(UiState::AppRunning, true);
        info!("ModeService: running");
    }

    // ── Event processing ──────────────────────────────────────

    /// Apply a single event.  Errors are logged and returned.
    pub fn handle_event(
        &mut self,
        event: ModeEvent,
        dev: &mut impl DevicePorts,
    ) -> Result<(), ModeError> {
        self.handled = self.handled.wrapping_add(1);
        let result = self.engine.handle(event, &mut self.timers, dev);
        if let Err(e) = result {
            self.failed = self.failed.wrapping_add(1);
            warn!("ModeService: {} abandoned: {}", event.name(), e);
        }
        result
    }

    /// Advance time to `now` and handle every expired timer, earliest first.
    pub fn poll_timers(&mut self, now: Instant, dev: &mut impl DevicePorts) -> usize {
        let expired = self.timers.advance(now);
        let count = expired.len();
        for id in expired {
            let _ = self.handle_event(ModeEvent::TimerExpired(id), dev);
        }
        count
    }

    /// Handle every event currently queued on `bus`.
    pub fn drain(&mut self, bus: &EventBus, dev: &mut impl DevicePorts) -> usize {
        let mut count = 0;
        while let Some(event) = bus.try_next() {
            let _ = self.handle_event(event, dev);
            count += 1;
        }
        count
    }

    /// One full runner pass.  Returns the next timer deadline, so the
    /// caller knows how long it may sleep.
    pub fn run_once(
        &mut self,
        now: Instant,
        bus: &EventBus,
        dev: &mut impl DevicePorts,
        gate: &GateFlags,
    ) -> Option<Instant> {
        self.poll_timers(now, dev);
        self.drain(bus, dev);
        gate.publish(self.engine.ledger());
        self.timers.next_deadline()
    }

    /// Runner pass for an event already taken off `bus` by an async wait.
    /// `first` is handled ahead of anything still queued.
    pub fn run_woken(
        &mut self,
        now: Instant,
        first: ModeEvent,
        bus: &EventBus,
        dev: &mut impl DevicePorts,
        gate: &GateFlags,
    ) -> Option<Instant> {
        self.poll_timers(now, dev);
        let _ = self.handle_event(first, dev);
        self.drain(bus, dev);
        gate.publish(self.engine.ledger());
        self.timers.next_deadline()
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn ledger(&self) -> &ModeLedger {
        self.engine.ledger()
    }

    pub fn engine(&self) -> &ModeEngine {
        &self.engine
    }

    pub fn timers(&self) -> &DeadlineTimers {
        &self.timers
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Events handled since boot.
    pub fn handled_count(&self) -> u32 {
        self.handled
    }

    /// Events abandoned because a collaborator failed.
    pub fn failed_count(&self) -> u32 {
        self.failed
    }
}
