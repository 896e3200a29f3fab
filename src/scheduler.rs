//! Factory reset scheduler.
//!
//! Owns the single reset-to-factory timer.  Two independent triggers can
//! schedule it; whichever scheduled last wins, and its delay restarts.
//!
//! ```text
//!  key-state mismatch ──┐
//!                       ├──▶ schedule(trigger, delay) ──▶ TimerId::FactoryReset
//!  account key written ─┘                                      │
//!                                                              ▼
//!  provisioned ─────────────▶ cancel()               on_expired() ──▶ FactoryResetPort
//! ```
//!
//! The pending trigger lives in the [`ModeLedger`]; the timer lives behind
//! [`TimerPort`].  This type keeps the two in step.

use embassy_time::Duration;
use log::{error, info, warn};

use crate::app::ports::{FactoryResetPort, TimerPort};
use crate::error::ModeError;
use crate::fsm::context::{FactoryResetTrigger, ModeLedger};
use crate::timer::TimerId;

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct FactoryResetScheduler {
    executed: u32,
    failed: u32,
}

impl FactoryResetScheduler {
    pub const fn new() -> Self {
        Self {
            executed: 0,
            failed: 0,
        }
    }

    /// Arm the reset timer for `delay`, replacing any pending reset.
    pub fn schedule(
        &mut self,
        trigger: FactoryResetTrigger,
        delay: Duration,
        ledger: &mut ModeLedger,
        timers: &mut impl TimerPort,
    ) {
        if let Some(previous) = ledger.factory_reset_trigger() {
            info!(
                "FactoryReset: replacing pending reset ({}) with {}",
                previous, trigger
            );
        }
        timers.arm(TimerId::FactoryReset, delay);
        ledger.set_factory_reset_trigger(Some(trigger));
        info!(
            "FactoryReset: scheduled in {} s ({})",
            delay.as_secs(),
            trigger
        );
    }

    /// Cancel the pending reset.  A no-op when nothing is pending.
    pub fn cancel(&mut self, ledger: &mut ModeLedger, timers: &mut impl TimerPort) {
        let had_timer = timers.cancel(TimerId::FactoryReset);
        if let Some(trigger) = ledger.factory_reset_trigger() {
            info!("FactoryReset: cancelled pending reset ({})", trigger);
        } else if had_timer {
            warn!("FactoryReset: cancelled a timer with no recorded trigger");
        }
        ledger.set_factory_reset_trigger(None);
    }

    /// Handle expiry of the reset timer.
    ///
    /// The pending trigger is cleared before the reset runs, so a failed
    /// reset never leaves a stale trigger behind.  Returns the trigger that
    /// fired, or `None` if nothing was pending.
    pub fn on_expired(
        &mut self,
        ledger: &mut ModeLedger,
        reset: &mut impl FactoryResetPort,
    ) -> Result<Option<FactoryResetTrigger>, ModeError> {
        let Some(trigger) = ledger.factory_reset_trigger() else {
            warn!("FactoryReset: timer fired with nothing pending, ignoring");
            return Ok(None);
        };
        ledger.set_factory_reset_trigger(None);

        info!("FactoryReset: executing ({})", trigger);
        match reset.perform_factory_reset() {
            Ok(()) => {
                self.executed = self.executed.saturating_add(1);
                ledger.set_factory_reset_executed(true);
                info!("FactoryReset: complete");
                Ok(Some(trigger))
            }
            Err(source) => {
                self.failed = self.failed.saturating_add(1);
                error!("FactoryReset: failed ({}): {}", trigger, source);
                Err(ModeError::FactoryResetFailed { trigger, source })
            }
        }
    }

    /// Resets completed since boot.
    pub fn executed_count(&self) -> u32 {
        self.executed
    }

    /// Resets attempted but failed since boot.
    pub fn failed_count(&self) -> u32 {
        self.failed
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
