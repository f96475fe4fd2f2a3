use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::LedgerError;
use crate::market::MarketState;
use crate::registry::{DeviceRecord, RegistryState};

pub type Principal = String;
pub type DeviceId = u64;
pub type Amount = u64;

/// Check that `caller` is the expected principal for an operation.
pub fn require_principal(caller: &Principal, expected: &Principal) -> Result<(), LedgerError> {
    if caller != expected {
        return Err(LedgerError::Unauthorized {
            caller: caller.clone(),
        });
    }
    Ok(())
}

/// Process-wide ledger state: both engines, owned outright.
///
/// The sequencer holds this container for the lifetime of the ledger and
/// routes every caller-identified request through one engine's public
/// operations; nothing else touches the underlying tables.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerState {
    pub registry: RegistryState,
    pub market: MarketState,
}

impl LedgerState {
    pub fn new(market_owner: Principal) -> Self {
        Self {
            registry: RegistryState::new(),
            market: MarketState::new(market_owner),
        }
    }

    /// Capture the current state together with its commitment root.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            devices: self.registry.records().clone(),
            owners: self.registry.owners().clone(),
            currency: self.market.currency_balances().clone(),
            energy: self.market.energy_balances().clone(),
            total_supply: self.market.total_supply(),
            unit_price: self.market.unit_price(),
            merkle_root: compute_merkle_root(&self.registry, &self.market),
        }
    }
}

/// Point-in-time copy of the ledger, ready for the sequencer to persist.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub devices: BTreeMap<DeviceId, DeviceRecord>,
    pub owners: BTreeMap<DeviceId, Principal>,
    pub currency: BTreeMap<Principal, Amount>,
    pub energy: BTreeMap<Principal, Amount>,
    pub total_supply: Amount,
    pub unit_price: Amount,
    pub merkle_root: [u8; 32],
}

impl LedgerSnapshot {
    /// Render the commitment root as hex.
    pub fn root_hex(&self) -> String {
        hex::encode(self.merkle_root)
    }
}

fn compute_merkle_root(registry: &RegistryState, market: &MarketState) -> [u8; 32] {
    let mut leaves: Vec<[u8; 32]> = Vec::new();
    for (device_id, record) in registry.records() {
        let mut hasher = Sha256::new();
        hasher.update(b"device");
        hasher.update(device_id.to_le_bytes());
        hasher.update(record.creator.as_bytes());
        hasher.update(record.name.as_bytes());
        hasher.update(record.description.as_bytes());
        hasher.update([record.efficiency]);
        hasher.update(record.created_at.to_le_bytes());
        leaves.push(hasher.finalize().into());
    }
    for (device_id, owner) in registry.owners() {
        let mut hasher = Sha256::new();
        hasher.update(b"owner");
        hasher.update(device_id.to_le_bytes());
        hasher.update(owner.as_bytes());
        leaves.push(hasher.finalize().into());
    }
    for (account, amount) in market.currency_balances() {
        let mut hasher = Sha256::new();
        hasher.update(b"currency");
        hasher.update(account.as_bytes());
        hasher.update(amount.to_le_bytes());
        leaves.push(hasher.finalize().into());
    }
    for (account, amount) in market.energy_balances() {
        let mut hasher = Sha256::new();
        hasher.update(b"energy");
        hasher.update(account.as_bytes());
        hasher.update(amount.to_le_bytes());
        leaves.push(hasher.finalize().into());
    }
    let mut hasher = Sha256::new();
    hasher.update(b"params");
    hasher.update(market.owner().as_bytes());
    hasher.update(market.total_supply().to_le_bytes());
    hasher.update(market.unit_price().to_le_bytes());
    leaves.push(hasher.finalize().into());

    build_merkle(leaves)
}

fn build_merkle(mut leaves: Vec<[u8; 32]>) -> [u8; 32] {
    if leaves.is_empty() {
        return Sha256::digest(b"vacuum-ledger-empty").into();
    }
    while leaves.len() > 1 {
        let mut next = Vec::with_capacity((leaves.len() + 1) / 2);
        for chunk in leaves.chunks(2) {
            let mut hasher = Sha256::new();
            hasher.update(b"node");
            hasher.update(chunk[0]);
            if chunk.len() == 2 {
                hasher.update(chunk[1]);
            } else {
                hasher.update(chunk[0]);
            }
            next.push(hasher.finalize().into());
        }
        leaves = next;
    }
    leaves[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: &str = "CONTRACT_OWNER";

    fn funded_ledger() -> LedgerState {
        let mut ledger = LedgerState::new(OWNER.to_string());
        ledger.registry.mint(
            "Quantum Vacuum Extractor".into(),
            "A device to extract energy from quantum vacuum fluctuations".into(),
            85,
            "creator1".to_string(),
            1_700_000_000_000,
        );
        ledger.market.mint(1_000, &OWNER.to_string()).unwrap();
        ledger
            .market
            .deposit_currency(&"buyer1".to_string(), 100_000);
        ledger
    }

    #[test]
    fn merkle_root_is_deterministic() {
        let ledger = funded_ledger();
        let root1 = ledger.snapshot().merkle_root;
        let root2 = ledger.snapshot().merkle_root;
        assert_eq!(root1, root2);
    }

    #[test]
    fn committed_mutations_change_the_root() {
        let mut ledger = funded_ledger();
        let before = ledger.snapshot().merkle_root;
        ledger.market.buy(500, &"buyer1".to_string()).unwrap();
        let after = ledger.snapshot().merkle_root;
        assert_ne!(before, after);
    }

    #[test]
    fn failed_calls_leave_the_root_unchanged() {
        let mut ledger = funded_ledger();
        let before = ledger.snapshot().merkle_root;

        ledger
            .market
            .set_price(150, &"unauthorized_user".to_string())
            .unwrap_err();
        ledger.market.buy(500, &"pauper".to_string()).unwrap_err();
        ledger
            .registry
            .transfer(1, &"unauthorized_user".to_string(), "thief".to_string())
            .unwrap_err();

        assert_eq!(ledger.snapshot().merkle_root, before);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut ledger = funded_ledger();
        ledger.market.buy(500, &"buyer1".to_string()).unwrap();
        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.root_hex().len(), 64);

        let encoded = serde_json::to_string(&snapshot).unwrap();
        let decoded: LedgerSnapshot = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn full_trading_day_preserves_conservation() {
        let mut ledger = funded_ledger();
        let creator = "creator1".to_string();
        let buyer = "buyer1".to_string();

        let id = ledger.registry.mint(
            "Casimir Cell".into(),
            "Parallel-plate vacuum energy harvester".into(),
            72,
            creator.clone(),
            1_700_000_100_000,
        );
        ledger
            .registry
            .transfer(id, &creator, buyer.clone())
            .unwrap();
        ledger.market.buy(500, &buyer).unwrap();
        ledger.market.set_price(150, &OWNER.to_string()).unwrap();
        ledger.market.sell(100, &buyer).unwrap();

        let snapshot = ledger.snapshot();
        let circulating: Amount = snapshot.energy.values().copied().sum();
        assert_eq!(circulating, snapshot.total_supply);
        assert_eq!(snapshot.owners[&id], buyer);
        assert_eq!(snapshot.devices.len(), 2);
    }
}
