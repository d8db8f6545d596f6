//! Snapshot — verifiable export and restore of persisted vault state
//!
//! A snapshot carries the policy, every account's record and available
//! balance, and the total held, sorted by account for deterministic
//! serialization. A SHA-256 digest over the canonical JSON guards integrity.
//! The event log is not part of persisted state and is not captured.
//!
//! Restoring re-checks the policy, every per-account invariant and
//! conservation of value before handing back a vault.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::info;
use vault_types::ids::AccountId;
use vault_types::numeric::Amount;

use crate::errors::SnapshotError;
use crate::ledger::{AccountRecord, Ledger};
use crate::vault::{validate_withdraw_limit, Vault, BANK_CAP};

pub const SNAPSHOT_VERSION: u32 = 1;

/// One account's persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub account_id: AccountId,
    pub record: AccountRecord,
    pub available_balance: Amount,
}

/// Everything the digest covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultState {
    pub bank_cap: Amount,
    pub withdraw_limit: Amount,
    pub total_held: Amount,
    /// Sorted by account id.
    pub accounts: Vec<AccountSnapshot>,
}

impl VaultState {
    /// Hex SHA-256 over the canonical JSON encoding.
    pub fn compute_digest(&self) -> Result<String, SnapshotError> {
        let bytes =
            serde_json::to_vec(self).map_err(|e| SnapshotError::Serialization(e.to_string()))?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSnapshot {
    pub version: u32,
    pub state: VaultState,
    pub digest: String,
}

impl VaultSnapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self).map_err(|e| SnapshotError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(json).map_err(|e| SnapshotError::Serialization(e.to_string()))
    }
}

impl Vault {
    /// Capture persisted state. Not allowed while an operation is running
    /// (e.g. from inside a transfer), since that state may still be reverted.
    pub fn snapshot(&self) -> Result<VaultSnapshot, SnapshotError> {
        let ledger = self.ledger();
        if ledger.in_transaction() || self.is_locked() {
            return Err(SnapshotError::InTransaction);
        }

        let accounts = ledger
            .accounts()
            .into_iter()
            .map(|account_id| AccountSnapshot {
                account_id,
                record: ledger.record(&account_id),
                available_balance: ledger.balance(&account_id),
            })
            .collect();

        let state = VaultState {
            bank_cap: BANK_CAP,
            withdraw_limit: self.withdraw_limit(),
            total_held: ledger.total_held(),
            accounts,
        };
        let digest = state.compute_digest()?;

        Ok(VaultSnapshot {
            version: SNAPSHOT_VERSION,
            state,
            digest,
        })
    }

    /// Rebuild a vault from a snapshot after verifying its digest and the
    /// ledger invariants.
    pub fn restore(snapshot: VaultSnapshot) -> Result<Vault, SnapshotError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(snapshot.version));
        }

        let actual = snapshot.state.compute_digest()?;
        if actual != snapshot.digest {
            return Err(SnapshotError::IntegrityFailure {
                expected: snapshot.digest,
                actual,
            });
        }

        let state = snapshot.state;
        if state.bank_cap != BANK_CAP {
            return Err(SnapshotError::PolicyMismatch {
                expected: BANK_CAP,
                found: state.bank_cap,
            });
        }
        validate_withdraw_limit(state.withdraw_limit)?;

        let mut records = HashMap::with_capacity(state.accounts.len());
        let mut balances = HashMap::with_capacity(state.accounts.len());
        let mut balance_sum = Amount::ZERO;

        for account in state.accounts {
            if account.record.total_deposited > BANK_CAP {
                return Err(SnapshotError::CapExceeded {
                    account_id: account.account_id.to_string(),
                    total_deposited: account.record.total_deposited,
                });
            }
            check_account(&account)?;
            if records.insert(account.account_id, account.record).is_some() {
                return Err(SnapshotError::DuplicateAccount {
                    account_id: account.account_id.to_string(),
                });
            }
            balances.insert(account.account_id, account.available_balance);
            balance_sum = balance_sum
                .checked_add(account.available_balance)
                .ok_or(SnapshotError::ConservationViolated {
                    balances: Amount::from_wei(u128::MAX),
                    held: state.total_held,
                })?;
        }

        if balance_sum != state.total_held {
            return Err(SnapshotError::ConservationViolated {
                balances: balance_sum,
                held: state.total_held,
            });
        }

        info!(
            accounts = records.len(),
            total_held = %state.total_held,
            "Vault restored from snapshot"
        );

        let ledger = Ledger::from_parts(records, balances, state.total_held);
        Ok(Vault::from_ledger(state.withdraw_limit, ledger))
    }
}

/// Relations between one account's fields that every reachable state obeys:
/// the balance only grows through deposits, and deposited value implies at
/// least one deposit.
fn check_account(account: &AccountSnapshot) -> Result<(), SnapshotError> {
    let record = &account.record;
    let reason = if account.available_balance > record.total_deposited {
        format!(
            "balance {} exceeds total deposited {}",
            account.available_balance, record.total_deposited
        )
    } else if !record.total_deposited.is_zero() && record.deposit_count == 0 {
        format!("deposited {} with no deposits", record.total_deposited)
    } else {
        return Ok(());
    };
    Err(SnapshotError::InconsistentAccount {
        account_id: account.account_id.to_string(),
        reason,
    })
}
