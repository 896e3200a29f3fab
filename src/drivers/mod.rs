//! Peripheral drivers: buttons and the status LED.

pub mod button;
pub mod led_patterns;
