use thiserror::Error;

use crate::ledger::{Amount, DeviceId, Principal};

/// Canonical error type exposed by the ledger engines.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Caller does not hold the permission the operation requires.
    #[error("{caller} is not authorized for this operation")]
    Unauthorized { caller: Principal },

    /// Referenced device has never been minted.
    #[error("unknown device {device_id}")]
    UnknownDevice { device_id: DeviceId },

    /// Currency balance below the required cost.
    #[error("insufficient funds in account {account}")]
    InsufficientFunds { account: Principal },

    /// Energy balance below the required amount.
    #[error("insufficient energy in account {account}")]
    InsufficientEnergy { account: Principal },

    /// The unit price must stay strictly positive.
    #[error("invalid unit price {price}")]
    InvalidPrice { price: Amount },
}
