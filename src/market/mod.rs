use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::ledger::{require_principal, Amount, Principal};

/// Unit price a fresh market opens with (currency units per energy unit).
pub const DEFAULT_UNIT_PRICE: Amount = 100;

/// Marketplace for fungible vacuum-energy units.
///
/// Two balance spaces are tracked per principal: reference currency and
/// energy. Energy enters circulation only through the owner-gated [`mint`];
/// [`buy`] and [`sell`] redistribute what already exists, so the sum of all
/// energy balances equals `total_supply` between any two calls. Every
/// operation checks before it mutates; a failed call leaves both tables
/// untouched.
///
/// [`mint`]: MarketState::mint
/// [`buy`]: MarketState::buy
/// [`sell`]: MarketState::sell
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarketState {
    owner: Principal,
    currency: BTreeMap<Principal, Amount>,
    energy: BTreeMap<Principal, Amount>,
    total_supply: Amount,
    unit_price: Amount,
}

impl MarketState {
    /// Open an empty market administered by `owner` at the default price.
    pub fn new(owner: Principal) -> Self {
        Self {
            owner,
            currency: BTreeMap::new(),
            energy: BTreeMap::new(),
            total_supply: 0,
            unit_price: DEFAULT_UNIT_PRICE,
        }
    }

    /// Open an empty market at a custom unit price.
    pub fn with_unit_price(owner: Principal, unit_price: Amount) -> Result<Self, LedgerError> {
        if unit_price == 0 {
            return Err(LedgerError::InvalidPrice { price: unit_price });
        }
        let mut market = Self::new(owner);
        market.unit_price = unit_price;
        Ok(market)
    }

    /// Issue `amount` new energy units to the contract owner.
    ///
    /// Only the owner principal may receive freshly minted supply. A zero
    /// amount is accepted and changes nothing.
    pub fn mint(&mut self, amount: Amount, recipient: &Principal) -> Result<(), LedgerError> {
        require_principal(recipient, &self.owner)?;
        credit(&mut self.energy, recipient, amount);
        self.total_supply += amount;
        Ok(())
    }

    /// Replace the unit price. Owner-gated; zero prices are rejected.
    pub fn set_price(&mut self, new_price: Amount, sender: &Principal) -> Result<(), LedgerError> {
        require_principal(sender, &self.owner)?;
        if new_price == 0 {
            return Err(LedgerError::InvalidPrice { price: new_price });
        }
        self.unit_price = new_price;
        Ok(())
    }

    /// Buy `amount` energy units from the owner's inventory.
    ///
    /// The buyer pays `amount * unit_price` currency to the owner and
    /// receives the energy in the same transition.
    pub fn buy(&mut self, amount: Amount, buyer: &Principal) -> Result<(), LedgerError> {
        let cost = amount * self.unit_price;
        if self.currency_balance(buyer) < cost {
            return Err(LedgerError::InsufficientFunds {
                account: buyer.clone(),
            });
        }
        if self.energy_balance(&self.owner) < amount {
            return Err(LedgerError::InsufficientEnergy {
                account: self.owner.clone(),
            });
        }
        debit(&mut self.currency, buyer, cost);
        credit(&mut self.currency, &self.owner, cost);
        debit(&mut self.energy, &self.owner, amount);
        credit(&mut self.energy, buyer, amount);
        Ok(())
    }

    /// Sell `amount` energy units back to the owner for currency.
    pub fn sell(&mut self, amount: Amount, seller: &Principal) -> Result<(), LedgerError> {
        if self.energy_balance(seller) < amount {
            return Err(LedgerError::InsufficientEnergy {
                account: seller.clone(),
            });
        }
        let payment = amount * self.unit_price;
        if self.currency_balance(&self.owner) < payment {
            return Err(LedgerError::InsufficientFunds {
                account: self.owner.clone(),
            });
        }
        debit(&mut self.energy, seller, amount);
        credit(&mut self.energy, &self.owner, amount);
        debit(&mut self.currency, &self.owner, payment);
        credit(&mut self.currency, seller, payment);
        Ok(())
    }

    /// Credit reference currency arriving from outside the market.
    ///
    /// Currency is not part of `total_supply`; the sequencer funds accounts
    /// here before they trade.
    pub fn deposit_currency(&mut self, account: &Principal, amount: Amount) {
        credit(&mut self.currency, account, amount);
    }

    pub fn owner(&self) -> &Principal {
        &self.owner
    }

    pub fn unit_price(&self) -> Amount {
        self.unit_price
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Currency held by `account`; absent entries read as zero.
    pub fn currency_balance(&self, account: &Principal) -> Amount {
        self.currency.get(account).copied().unwrap_or(0)
    }

    /// Energy held by `account`; absent entries read as zero.
    pub fn energy_balance(&self, account: &Principal) -> Amount {
        self.energy.get(account).copied().unwrap_or(0)
    }

    pub fn currency_balances(&self) -> &BTreeMap<Principal, Amount> {
        &self.currency
    }

    pub fn energy_balances(&self) -> &BTreeMap<Principal, Amount> {
        &self.energy
    }
}

fn credit(table: &mut BTreeMap<Principal, Amount>, account: &Principal, amount: Amount) {
    if amount == 0 {
        return;
    }
    *table.entry(account.clone()).or_default() += amount;
}

// Callers verify the balance covers `amount` before debiting.
fn debit(table: &mut BTreeMap<Principal, Amount>, account: &Principal, amount: Amount) {
    if amount == 0 {
        return;
    }
    if let Some(balance) = table.get_mut(account) {
        *balance -= amount;
    }
}
