//! One-shot deadline timers for the mode engine.
//!
//! The controller needs exactly four timers, one per [`TimerId`].  Instead
//! of a kernel timer per id, [`DeadlineTimers`] keeps a small deadline table
//! and is advanced by the runner with the current [`Instant`]:
//!
//! ```text
//!   engine ──arm/cancel──▶ DeadlineTimers ◀──advance(now)── runner
//!                                 │
//!                                 └─ expired ids ──▶ TimerExpired events
//! ```
//!
//! The table never reads a clock itself.  Time always comes from the
//! caller, which keeps the whole engine deterministic under test.

use embassy_time::{Duration, Instant};
use heapless::Vec;
use log::debug;

use crate::app::ports::TimerPort;

/// Identifies each one-shot timer the engine owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum TimerId {
    DfuMode = 0,
    RecoveryMode = 1,
    IdentificationMode = 2,
    FactoryReset = 3,
}

impl TimerId {
    pub const COUNT: usize = 4;

    pub const ALL: [TimerId; Self::COUNT] = [
        TimerId::DfuMode,
        TimerId::RecoveryMode,
        TimerId::IdentificationMode,
        TimerId::FactoryReset,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::DfuMode => "dfu-mode",
            Self::RecoveryMode => "recovery-mode",
            Self::IdentificationMode => "identification-mode",
            Self::FactoryReset => "factory-reset",
        }
    }
}

/// Expired timer ids, in deadline order.
pub type Expired = Vec<TimerId, { TimerId::COUNT }>;

/// Deadline table driven by an externally supplied clock.
#[derive(Debug, Clone)]
pub struct DeadlineTimers {
    now: Instant,
    deadlines: [Option<Instant>; TimerId::COUNT],
}

impl DeadlineTimers {
    /// Create an empty table whose notion of "now" starts at `now`.
    pub const fn new(now: Instant) -> Self {
        Self {
            now,
            deadlines: [None; TimerId::COUNT],
        }
    }

    /// The last instant passed to [`advance`](Self::advance).
    pub fn now(&self) -> Instant {
        self.now
    }

    pub fn deadline(&self, id: TimerId) -> Option<Instant> {
        self.deadlines[id as usize]
    }

    /// Earliest armed deadline, if any.  The runner sleeps until then.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.iter().flatten().copied().min()
    }

    /// Move time forward to `now` and disarm every timer whose deadline has
    /// been reached.  A deadline equal to `now` counts as reached.
    ///
    /// Time never moves backwards: an earlier `now` is ignored.
    pub fn advance(&mut self, now: Instant) -> Expired {
        if now > self.now {
            self.now = now;
        }

        let mut due: Vec<(Instant, TimerId), { TimerId::COUNT }> = Vec::new();
        for id in TimerId::ALL {
            if let Some(at) = self.deadlines[id as usize] {
                if at <= self.now {
                    self.deadlines[id as usize] = None;
                    // Capacity equals TimerId::COUNT, so push cannot fail.
                    let _ = due.push((at, id));
                }
            }
        }
        due.sort_unstable();

        due.into_iter().map(|(_, id)| id).collect()
    }
}

impl TimerPort for DeadlineTimers {
    fn arm(&mut self, id: TimerId, after: Duration) {
        let at = self.now + after;
        if self.deadlines[id as usize].replace(at).is_some() {
            debug!("Timers: {} re-armed for {} ms", id.name(), after.as_millis());
        } else {
            debug!("Timers: {} armed for {} ms", id.name(), after.as_millis());
        }
    }

    fn cancel(&mut self, id: TimerId) -> bool {
        let was_armed = self.deadlines[id as usize].take().is_some();
        if was_armed {
            debug!("Timers: {} cancelled", id.name());
        }
        was_armed
    }

    fn is_armed(&self, id: TimerId) -> bool {
        self.deadlines[id as usize].is_some()
    }
}
