//! Locator tag mode controller.
//!
//! Keeps the tag's advertising, provisioning and timed modes (recovery,
//! identification, DFU) consistent with one another, and schedules the
//! reset-to-factory when provisioning goes wrong.  Exposes the pure-logic
//! modules for integration testing; all ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod fsm;
pub mod gate;
pub mod scheduler;
pub mod smp;
pub mod startup;
pub mod timer;

pub mod adapters;
pub mod drivers;

#[cfg(target_os = "espidf")]
mod esp_link_shims;

pub use error::{Error, Result};
