//! Value transfer out of the vault
//!
//! Sending native asset hands control to the recipient, which may run
//! arbitrary code, including calling back into the vault. The recipient gets
//! `&mut Vault` so that reentry is possible and observable; the vault's
//! reentrancy guard is what rejects it.

use std::collections::HashMap;
use vault_types::ids::AccountId;
use vault_types::numeric::Amount;

use crate::errors::TransferError;
use crate::vault::Vault;

/// Delivers native asset to an account.
pub trait NativeTransfer {
    /// Send `amount` to `to`. An `Err` fails the enclosing withdrawal and
    /// rolls it back.
    fn send(&mut self, vault: &mut Vault, to: AccountId, amount: Amount)
        -> Result<(), TransferError>;
}

/// Plain transfer to a recipient that accepts value and runs no code.
#[derive(Debug, Default)]
pub struct DirectTransfer {
    delivered: HashMap<AccountId, Amount>,
}

impl DirectTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total amount delivered to an account through this transfer.
    pub fn delivered_to(&self, account_id: &AccountId) -> Amount {
        self.delivered
            .get(account_id)
            .copied()
            .unwrap_or(Amount::ZERO)
    }
}

impl NativeTransfer for DirectTransfer {
    fn send(
        &mut self,
        _vault: &mut Vault,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), TransferError> {
        let delivered = self.delivered.entry(to).or_insert(Amount::ZERO);
        *delivered = delivered
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected("recipient balance overflow".to_string()))?;
        Ok(())
    }
}

/// Recipient that refuses every transfer.
#[derive(Debug, Clone)]
pub struct RejectingTransfer {
    reason: String,
}

impl RejectingTransfer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl NativeTransfer for RejectingTransfer {
    fn send(
        &mut self,
        _vault: &mut Vault,
        _to: AccountId,
        _amount: Amount,
    ) -> Result<(), TransferError> {
        Err(TransferError::Rejected(self.reason.clone()))
    }
}
