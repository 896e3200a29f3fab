//! Polled, debounced button driver.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up.  The runner calls `tick()`
//! every few milliseconds; the driver samples the pin through the
//! `embedded-hal` [`InputPin`] trait and runs a debounce + hold-time state
//! machine.
//!
//! ## Gesture detection
//!
//! A press only counts once the pin has stayed low for the debounce
//! window.  On release the driver reports how long the button was held;
//! mapping that to a request (short press vs. long hold) is left to
//! [`crate::app::commands::request_for`].

use embedded_hal::digital::InputPin;
use log::warn;

/// Button events emitted after debounce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Released { held_ms: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureState {
    Idle,
    DebounceWait { since_ms: u32 },
    Pressed { since_ms: u32 },
}

pub struct ButtonDriver<P: InputPin> {
    pin: P,
    debounce_ms: u32,
    state: GestureState,
}

impl<P: InputPin> ButtonDriver<P> {
    pub fn new(pin: P, debounce_ms: u32) -> Self {
        Self {
            pin,
            debounce_ms,
            state: GestureState::Idle,
        }
    }

    /// Whether a debounced press is in progress.
    pub fn is_held(&self) -> bool {
        matches!(self.state, GestureState::Pressed { .. })
    }

    /// Sample the pin.  `now_ms` is monotonic milliseconds (may wrap).
    pub fn tick(&mut self, now_ms: u32) -> Option<ButtonEvent> {
        let pressed = match self.pin.is_low() {
            Ok(low) => low,
            Err(_) => {
                warn!("Button: pin read failed, treating as released");
                false
            }
        };

        match self.state {
            GestureState::Idle => {
                if pressed {
                    self.state = GestureState::DebounceWait { since_ms: now_ms };
                }
                None
            }

            GestureState::DebounceWait { since_ms } => {
                if !pressed {
                    // Bounce: never held long enough to count.
                    self.state = GestureState::Idle;
                } else if now_ms.wrapping_sub(since_ms) >= self.debounce_ms {
                    self.state = GestureState::Pressed { since_ms };
                }
                None
            }

            GestureState::Pressed { since_ms } => {
                if pressed {
                    return None;
                }
                self.state = GestureState::Idle;
                Some(ButtonEvent::Released {
                    held_ms: now_ms.wrapping_sub(since_ms),
                })
            }
        }
    }
}
