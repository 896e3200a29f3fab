//! ESP-IDF runtime symbol providers for third-party crates.
//!
//! `embassy-sync` primitives lock through `critical-section`, which expects
//! the platform to supply the acquire/release symbols.  On ESP-IDF they are
//! backed by a process-wide mutex, re-entrant per thread.
//!
//! `async-io-mini` timers (startup handshake, controller tasks) run on
//! `embassy-time`, whose driver symbols are backed by the ESP-IDF
//! high-resolution timer.

use std::cell::RefCell;
use std::time::Duration;
use std::sync::{Mutex, MutexGuard, PoisonError};

static SECTION: Mutex<()> = Mutex::new(());

struct Held {
    depth: u8,
    guard: Option<MutexGuard<'static, ()>>,
}

thread_local! {
    static HELD: RefCell<Held> = const { RefCell::new(Held { depth: 0, guard: None }) };
}

#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_acquire() -> u8 {
    HELD.with(|held| {
        let mut held = held.borrow_mut();
        if held.depth == 0 {
            held.guard = Some(SECTION.lock().unwrap_or_else(PoisonError::into_inner));
        }
        held.depth = held.depth.saturating_add(1);
        held.depth
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_release(_token: u8) {
    HELD.with(|held| {
        let mut held = held.borrow_mut();
        if held.depth == 0 {
            return;
        }
        held.depth -= 1;
        if held.depth == 0 {
            held.guard = None;
        }
    });
}

// ── embassy-time driver ───────────────────────────────────────

#[unsafe(no_mangle)]
pub extern "C" fn _embassy_time_now() -> u64 {
    // SAFETY: the system timer is running before `main`.
    (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
}

#[unsafe(no_mangle)]
pub extern "C" fn _embassy_time_schedule_wake(at: u64, waker: *mut core::ffi::c_void) {
    if waker.is_null() {
        return;
    }

    // SAFETY: embassy-time passes a valid `Waker` for the duration of the
    // call; it is cloned before returning.
    let waker = unsafe { (*(waker as *const core::task::Waker)).clone() };
    std::thread::spawn(move || {
        let now = _embassy_time_now();
        if at > now {
            std::thread::sleep(Duration::from_micros(at - now));
        }
        waker.wake();
    });
}
