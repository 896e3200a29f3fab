//! Application core — mode control logic, zero I/O.
//!
//! The event runner ([`service`]), the port traits it drives ([`ports`]),
//! and the user-interface requests it accepts ([`commands`]).  All
//! interaction with the radio stack, flash and buttons happens through the
//! port traits, keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod ports;
pub mod service;
