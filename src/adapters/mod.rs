//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements         | Connects to                    |
//! |---------------|--------------------|--------------------------------|
//! | `advertising` | AdvertisingPort    | Pairing advertisement + SMP UUID|
//! | `device`      | all five device ports | Bundles the adapters below  |
//! | `key_store`   | KeyStorePort       | Account keys in NVS            |
//! |               | FactoryResetPort   |                                |
//! | `nvs`         | ConfigPort         | NVS / in-memory store          |
//! |               | StoragePort        |                                |
//! | `read_mode`   | ReadModePort       | Beacon read-mode windows       |
//! | `time`        | —                  | ESP32 system timer             |
//! | `ui`          | UiPort             | Serial log + status LED        |

pub mod advertising;
pub mod device;
pub mod key_store;
pub mod nvs;
pub mod read_mode;
pub mod time;
pub mod ui;
