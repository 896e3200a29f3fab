//! Account-key store and reset-to-factory action, backed by [`StoragePort`].
//!
//! Account keys are 16-byte blobs in their own namespace.  The tag keeps
//! a small fixed number of slots; presence of any valid slot means "an
//! account key is stored".  A factory reset erases every slot plus the
//! beacon's provisioning material.

use log::{info, warn};

use crate::app::ports::{FactoryResetPort, KeyStorePort, PortError, StorageError, StoragePort};

pub const ACCOUNT_KEY_LEN: usize = 16;

/// Number of account key slots.
pub const ACCOUNT_KEY_SLOTS: usize = 5;

const KEY_NAMESPACE: &str = "fp_keys";
const SLOT_KEYS: [&str; ACCOUNT_KEY_SLOTS] = ["acc_key_0", "acc_key_1", "acc_key_2", "acc_key_3", "acc_key_4"];

const BEACON_NAMESPACE: &str = "beacon";
const BEACON_KEYS: [&str; 2] = ["eik", "prov"];

pub struct NvsKeyStore<S: StoragePort> {
    storage: S,
}

impl<S: StoragePort> NvsKeyStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Store `key` in the first free slot.  Fails with `Rejected` when every
    /// slot is in use.
    pub fn store_account_key(&mut self, key: &[u8; ACCOUNT_KEY_LEN]) -> Result<usize, PortError> {
        let slot = SLOT_KEYS
            .iter()
            .position(|name| !self.storage.exists(KEY_NAMESPACE, name))
            .ok_or(PortError::Rejected)?;
        self.storage.write(KEY_NAMESPACE, SLOT_KEYS[slot], key)?;
        info!("KeyStore: account key stored in slot {}", slot);
        Ok(slot)
    }

    /// Mark the beacon as provisioned by persisting its identity key.
    pub fn store_beacon_identity(&mut self, eik: &[u8; 32]) -> Result<(), PortError> {
        self.storage.write(BEACON_NAMESPACE, "eik", eik)?;
        self.storage.write(BEACON_NAMESPACE, "prov", &[1])?;
        Ok(())
    }

    pub fn beacon_provisioned(&self) -> bool {
        self.storage.exists(BEACON_NAMESPACE, "prov")
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    fn slot_valid(&self, slot: &str) -> Result<bool, PortError> {
        let mut buf = [0u8; ACCOUNT_KEY_LEN];
        match self.storage.read(KEY_NAMESPACE, slot, &mut buf) {
            Ok(ACCOUNT_KEY_LEN) => Ok(true),
            Ok(len) => {
                warn!("KeyStore: slot {} holds {} bytes, ignoring", slot, len);
                Ok(false)
            }
            Err(StorageError::NotFound) => Ok(false),
            Err(StorageError::BufferTooSmall) => {
                warn!("KeyStore: slot {} oversized, ignoring", slot);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl<S: StoragePort> KeyStorePort for NvsKeyStore<S> {
    fn has_account_key(&self) -> Result<bool, PortError> {
        for slot in SLOT_KEYS {
            if self.slot_valid(slot)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl<S: StoragePort> FactoryResetPort for NvsKeyStore<S> {
    fn perform_factory_reset(&mut self) -> Result<(), PortError> {
        for slot in SLOT_KEYS {
            self.storage.delete(KEY_NAMESPACE, slot)?;
        }
        for key in BEACON_KEYS {
            self.storage.delete(BEACON_NAMESPACE, key)?;
        }
        info!("KeyStore: all account keys and beacon material erased");
        Ok(())
    }
}
