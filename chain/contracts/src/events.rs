//! Contract events
//!
//! Events are immutable records appended to the vault's notification log,
//! exactly once per successful operation, after all state mutation.

use serde::{Deserialize, Serialize};
use vault_types::ids::AccountId;
use vault_types::numeric::Amount;

/// Native asset accepted from an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposited {
    pub account_id: AccountId,
    pub amount: Amount,
}

/// Native asset paid out to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawn {
    pub account_id: AccountId,
    pub amount: Amount,
}

/// Enum wrapper for all contract events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractEvent {
    Deposited(Deposited),
    Withdrawn(Withdrawn),
}

impl ContractEvent {
    /// The indexed account of the event.
    pub fn account_id(&self) -> AccountId {
        match self {
            ContractEvent::Deposited(e) => e.account_id,
            ContractEvent::Withdrawn(e) => e.account_id,
        }
    }

    pub fn amount(&self) -> Amount {
        match self {
            ContractEvent::Deposited(e) => e.amount,
            ContractEvent::Withdrawn(e) => e.amount,
        }
    }
}
