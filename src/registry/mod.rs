use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::ledger::{require_principal, DeviceId, Principal};

/// Immutable metadata stamped onto a device at mint time.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceRecord {
    pub creator: Principal,
    pub name: String,
    pub description: String,
    pub efficiency: u8,
    pub created_at: u64,
}

/// Registry of unique vacuum-energy device records.
///
/// Each minted device has exactly one record and one ownership entry;
/// records are never mutated or deleted, ownership moves via [`transfer`].
///
/// [`transfer`]: RegistryState::transfer
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RegistryState {
    last_device_id: DeviceId,
    records: BTreeMap<DeviceId, DeviceRecord>,
    owners: BTreeMap<DeviceId, Principal>,
}

impl RegistryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a new device record owned by `creator`.
    ///
    /// Identifiers start at 1 and increase by one per mint; the counter is
    /// never rewound short of rebuilding the state. `timestamp` is the
    /// sequencer-assigned wall-clock time of the call. Any caller may mint.
    pub fn mint(
        &mut self,
        name: String,
        description: String,
        efficiency: u8,
        creator: Principal,
        timestamp: u64,
    ) -> DeviceId {
        self.last_device_id += 1;
        let device_id = self.last_device_id;
        self.records.insert(
            device_id,
            DeviceRecord {
                creator: creator.clone(),
                name,
                description,
                efficiency,
                created_at: timestamp,
            },
        );
        self.owners.insert(device_id, creator);
        device_id
    }

    /// Move ownership of `device_id` from `sender` to `recipient`.
    ///
    /// Fails when the device does not exist or `sender` is not its current
    /// owner. Transferring a device to its current owner succeeds and leaves
    /// the state unchanged.
    pub fn transfer(
        &mut self,
        device_id: DeviceId,
        sender: &Principal,
        recipient: Principal,
    ) -> Result<(), LedgerError> {
        let owner = self
            .owners
            .get_mut(&device_id)
            .ok_or(LedgerError::UnknownDevice { device_id })?;
        require_principal(sender, owner)?;
        *owner = recipient;
        Ok(())
    }

    pub fn record(&self, device_id: DeviceId) -> Option<&DeviceRecord> {
        self.records.get(&device_id)
    }

    pub fn owner_of(&self, device_id: DeviceId) -> Option<&Principal> {
        self.owners.get(&device_id)
    }

    pub fn records(&self) -> &BTreeMap<DeviceId, DeviceRecord> {
        &self.records
    }

    pub fn owners(&self) -> &BTreeMap<DeviceId, Principal> {
        &self.owners
    }

    /// Identifier handed out by the most recent mint (0 when empty).
    pub fn last_device_id(&self) -> DeviceId {
        self.last_device_id
    }
}
