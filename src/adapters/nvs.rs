//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements both [`ConfigPort`] and [`StoragePort`] for the tag.
//!
//! - Config validation: every field is range-checked before persistence.
//! - Namespace isolation: the controller config and the account keys live
//!   in separate namespaces, so a factory reset never touches the config.
//! - On ESP32 the safe `EspNvs` wrapper is used; each commit is atomic.
//!   Host builds use an in-memory map.

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::ModeConfig;
use log::info;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
#[cfg(target_os = "espidf")]
use log::warn;

const CONFIG_NAMESPACE: &str = "tagctl";
const CONFIG_KEY: &str = "modecfg";

/// Upper bound for a stored config blob.
const MAX_CONFIG_BLOB: usize = 64;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
    #[cfg(target_os = "espidf")]
    partition: EspDefaultNvsPartition,
}

impl NvsAdapter {
    /// Take the default NVS partition (ESP32) or create an empty store (host).
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            let partition = EspDefaultNvsPartition::take().map_err(|e| {
                warn!("NvsAdapter: failed to take default partition: {}", e);
                ConfigError::IoError
            })?;
            info!("NvsAdapter: ESP-IDF NVS ready");
            Ok(Self { partition })
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("NvsAdapter: simulation backend");
            Ok(Self {
                store: std::cell::RefCell::new(HashMap::new()),
            })
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    #[cfg(target_os = "espidf")]
    fn open(&self, namespace: &str, write: bool) -> Result<EspNvs<NvsDefault>, StorageError> {
        EspNvs::new(self.partition.clone(), namespace, write).map_err(|e| {
            warn!("NvsAdapter: cannot open namespace '{}': {}", namespace, e);
            StorageError::IoError
        })
    }
}

// ── ConfigPort ────────────────────────────────────────────────

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<ModeConfig, ConfigError> {
        let mut buf = [0u8; MAX_CONFIG_BLOB];
        match self.read(CONFIG_NAMESPACE, CONFIG_KEY, &mut buf) {
            Ok(len) => {
                let cfg: ModeConfig =
                    postcard::from_bytes(&buf[..len]).map_err(|_| ConfigError::Corrupted)?;
                cfg.validate()?;
                info!("NvsAdapter: loaded config ({} bytes)", len);
                Ok(cfg)
            }
            Err(StorageError::NotFound) => {
                info!("NvsAdapter: no stored config, using defaults");
                Ok(ModeConfig::default())
            }
            Err(StorageError::BufferTooSmall) => Err(ConfigError::Corrupted),
            Err(_) => Err(ConfigError::IoError),
        }
    }

    fn save(&self, config: &ModeConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;

        #[cfg(not(target_os = "espidf"))]
        {
            let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
            self.store.borrow_mut().insert(key, bytes);
            info!("NvsAdapter: config saved (simulation)");
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let mut nvs = self
                .open(CONFIG_NAMESPACE, true)
                .map_err(|_| ConfigError::IoError)?;
            nvs.set_raw(CONFIG_KEY, &bytes).map_err(|e| {
                warn!("NvsAdapter: config write failed: {}", e);
                ConfigError::IoError
            })?;
            info!("NvsAdapter: config saved ({} bytes)", bytes.len());
            Ok(())
        }
    }
}

// ── StoragePort ───────────────────────────────────────────────

impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            match self.store.borrow().get(&composite) {
                Some(data) if data.len() > buf.len() => Err(StorageError::BufferTooSmall),
                Some(data) => {
                    buf[..data.len()].copy_from_slice(data);
                    Ok(data.len())
                }
                None => Err(StorageError::NotFound),
            }
        }

        #[cfg(target_os = "espidf")]
        {
            let nvs = match self.open(namespace, false) {
                Ok(nvs) => nvs,
                // A namespace that was never written cannot be opened read-only.
                Err(_) => return Err(StorageError::NotFound),
            };
            let capacity = buf.len();
            match nvs.get_raw(key, buf) {
                Ok(Some(data)) => Ok(data.len()),
                Ok(None) => Err(StorageError::NotFound),
                Err(e) => {
                    warn!("NvsAdapter: read {}::{} failed: {}", namespace, key, e);
                    if nvs.blob_len(key).ok().flatten().is_some_and(|len| len > capacity) {
                        Err(StorageError::BufferTooSmall)
                    } else {
                        Err(StorageError::IoError)
                    }
                }
            }
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow_mut().insert(composite, data.to_vec());
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let mut nvs = self.open(namespace, true)?;
            nvs.set_raw(key, data).map(|_| ()).map_err(|e| {
                warn!("NvsAdapter: write {}::{} failed: {}", namespace, key, e);
                StorageError::IoError
            })
        }
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow_mut().remove(&composite);
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let mut nvs = self.open(namespace, true)?;
            nvs.remove(key).map(|_| ()).map_err(|e| {
                warn!("NvsAdapter: delete {}::{} failed: {}", namespace, key, e);
                StorageError::IoError
            })
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow().contains_key(&composite)
        }

        #[cfg(target_os = "espidf")]
        {
            self.open(namespace, false)
                .ok()
                .and_then(|nvs| nvs.contains(key).ok())
                .unwrap_or(false)
        }
    }
}
