//! Vault — capped deposits, limited withdrawals, activity counters
//!
//! Policy:
//! - Per-account cumulative deposit cap (`BANK_CAP`, compiled in)
//! - Per-call withdrawal limit (fixed at construction)
//!
//! Every mutating operation is atomic: it runs inside a ledger checkpoint
//! and is reverted completely on any error. `withdraw` additionally holds
//! the reentrancy guard for its whole duration, because the value transfer
//! hands control to the recipient.

use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, warn};
use vault_types::ids::AccountId;
use vault_types::numeric::Amount;

use crate::errors::VaultError;
use crate::events::{ContractEvent, Deposited, Withdrawn};
use crate::ledger::{AccountRecord, Ledger};
use crate::security::ReentrancyGuard;
use crate::transfer::NativeTransfer;

/// Maximum cumulative deposit per account: 1 ether.
pub const BANK_CAP: Amount = Amount::ONE_ETHER;

/// Read-only view of an account returned by `get_user_stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_deposited: Amount,
    pub deposit_count: u64,
    pub withdraw_count: u64,
    pub available_balance: Amount,
}

impl From<UserStats> for (Amount, u64, u64, Amount) {
    fn from(stats: UserStats) -> Self {
        (
            stats.total_deposited,
            stats.deposit_count,
            stats.withdraw_count,
            stats.available_balance,
        )
    }
}

/// Core vault contract.
#[derive(Debug)]
pub struct Vault {
    ledger: Ledger,
    /// Immutable after construction.
    withdraw_limit: Amount,
    reentrancy_guard: ReentrancyGuard,
}

impl Vault {
    /// Construct a vault with the given per-call withdrawal limit.
    ///
    /// Fails with `ZeroAmount` for a zero limit and `AboveLimit` for a limit
    /// greater than `BANK_CAP`.
    pub fn new(withdraw_limit: Amount) -> Result<Self, VaultError> {
        validate_withdraw_limit(withdraw_limit)?;
        info!(
            withdraw_limit = %withdraw_limit,
            bank_cap = %BANK_CAP,
            "Vault initialized"
        );
        Ok(Self::from_ledger(withdraw_limit, Ledger::new()))
    }

    pub(crate) fn from_ledger(withdraw_limit: Amount, ledger: Ledger) -> Self {
        Self {
            ledger,
            withdraw_limit,
            reentrancy_guard: ReentrancyGuard::new(),
        }
    }

    // ───────────────────────── Deposit ─────────────────────────

    /// Accept `amount` of native asset from `account_id`.
    ///
    /// Checks, in order: amount non-zero, cumulative deposits within
    /// `BANK_CAP`. Emits `Deposited`. Makes no external call, so it takes no
    /// lock and may be called by a recipient during a transfer.
    pub fn deposit(
        &mut self,
        account_id: AccountId,
        amount: Amount,
    ) -> Result<ContractEvent, VaultError> {
        let result = self.atomic(|vault| vault.apply_deposit(account_id, amount));
        match &result {
            Ok(_) => debug!(account_id = %account_id, amount = %amount, "Deposit accepted"),
            Err(err) => debug!(account_id = %account_id, amount = %amount, error = %err, "Deposit rejected"),
        }
        result
    }

    fn apply_deposit(
        &mut self,
        account_id: AccountId,
        amount: Amount,
    ) -> Result<ContractEvent, VaultError> {
        if amount.is_zero() {
            return Err(VaultError::ZeroAmount);
        }

        let mut record = self.ledger.record(&account_id);
        // Compared against the headroom so an oversized amount is AboveLimit,
        // not an overflowing sum.
        let headroom = BANK_CAP
            .checked_sub(record.total_deposited)
            .unwrap_or(Amount::ZERO);
        if amount > headroom {
            return Err(VaultError::AboveLimit {
                limit: BANK_CAP,
                attempted: record.total_deposited.saturating_add(amount),
            });
        }
        let total_deposited = record
            .total_deposited
            .checked_add(amount)
            .ok_or(VaultError::Overflow)?;

        record.total_deposited = total_deposited;
        record.deposit_count = record
            .deposit_count
            .checked_add(1)
            .ok_or(VaultError::Overflow)?;

        let balance = self
            .ledger
            .balance(&account_id)
            .checked_add(amount)
            .ok_or(VaultError::Overflow)?;
        let total_held = self
            .ledger
            .total_held()
            .checked_add(amount)
            .ok_or(VaultError::Overflow)?;

        self.ledger.set_record(account_id, record);
        self.ledger.set_balance(account_id, balance);
        self.ledger.set_total_held(total_held);

        let event = ContractEvent::Deposited(Deposited { account_id, amount });
        self.ledger.emit(event.clone());
        Ok(event)
    }

    // ───────────────────────── Withdraw ─────────────────────────

    /// Pay `amount` out to `account_id` through `transfer`.
    ///
    /// Checks, in order: no withdrawal already in progress, current balance
    /// non-zero, `amount` within the withdrawal limit. The balance is then
    /// decremented with checked arithmetic, so requesting more than the
    /// balance fails with `Underflow`. State is updated before the transfer;
    /// a failed transfer reverts everything, including anything the
    /// recipient did to the vault in the meantime. Emits `Withdrawn`.
    pub fn withdraw(
        &mut self,
        account_id: AccountId,
        amount: Amount,
        transfer: &mut dyn NativeTransfer,
    ) -> Result<ContractEvent, VaultError> {
        let result = self.non_reentrant(|vault| {
            vault.atomic(|vault| vault.apply_withdraw(account_id, amount, transfer))
        });
        match &result {
            Ok(_) => debug!(account_id = %account_id, amount = %amount, "Withdrawal completed"),
            Err(err @ (VaultError::ReentrancyDetected | VaultError::TransferFailed(_))) => {
                warn!(account_id = %account_id, amount = %amount, error = %err, "Withdrawal aborted")
            }
            Err(err) => debug!(account_id = %account_id, amount = %amount, error = %err, "Withdrawal rejected"),
        }
        result
    }

    fn apply_withdraw(
        &mut self,
        account_id: AccountId,
        amount: Amount,
        transfer: &mut dyn NativeTransfer,
    ) -> Result<ContractEvent, VaultError> {
        let balance = self.ledger.balance(&account_id);
        if balance.is_zero() {
            return Err(VaultError::NoFunds);
        }
        if amount > self.withdraw_limit {
            return Err(VaultError::AboveLimit {
                limit: self.withdraw_limit,
                attempted: amount,
            });
        }

        // Effects
        let remaining = balance.checked_sub(amount).ok_or(VaultError::Underflow)?;
        let mut record = self.ledger.record(&account_id);
        record.withdraw_count = record
            .withdraw_count
            .checked_add(1)
            .ok_or(VaultError::Overflow)?;
        let total_held = self
            .ledger
            .total_held()
            .checked_sub(amount)
            .ok_or(VaultError::Underflow)?;

        self.ledger.set_balance(account_id, remaining);
        self.ledger.set_record(account_id, record);
        self.ledger.set_total_held(total_held);

        // Interaction
        transfer.send(self, account_id, amount)?;

        let event = ContractEvent::Withdrawn(Withdrawn { account_id, amount });
        self.ledger.emit(event.clone());
        Ok(event)
    }

    // ───────────────────────── Queries ─────────────────────────

    /// `(total_deposited, deposit_count, withdraw_count, available_balance)`
    /// for an account. Never fails; unknown accounts read as zero.
    pub fn get_user_stats(&self, account_id: &AccountId) -> UserStats {
        let record = self.ledger.record(account_id);
        UserStats {
            total_deposited: record.total_deposited,
            deposit_count: record.deposit_count,
            withdraw_count: record.withdraw_count,
            available_balance: self.ledger.balance(account_id),
        }
    }

    pub fn record(&self, account_id: &AccountId) -> AccountRecord {
        self.ledger.record(account_id)
    }

    pub fn balance_of(&self, account_id: &AccountId) -> Amount {
        self.ledger.balance(account_id)
    }

    /// Total native asset held by the vault.
    pub fn total_held(&self) -> Amount {
        self.ledger.total_held()
    }

    pub fn bank_cap(&self) -> Amount {
        BANK_CAP
    }

    pub fn withdraw_limit(&self) -> Amount {
        self.withdraw_limit
    }

    /// Whether a withdrawal is currently in progress.
    pub fn is_locked(&self) -> bool {
        self.reentrancy_guard.is_locked()
    }

    /// Sum of available balances equals total held.
    pub fn is_conserved(&self) -> bool {
        self.ledger.sum_of_balances() == Some(self.ledger.total_held())
    }

    pub(crate) fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    // ───────────────────────── Events ─────────────────────────

    /// Get all emitted events.
    pub fn events(&self) -> &[ContractEvent] {
        self.ledger.events()
    }

    /// Drain all events (consume and clear).
    ///
    /// Returns nothing while an operation is in flight (e.g. when called by
    /// a recipient during a transfer); the log is left intact for the
    /// outer operation to commit or revert.
    pub fn drain_events(&mut self) -> Vec<ContractEvent> {
        if self.is_locked() {
            return Vec::new();
        }
        self.ledger.drain_events()
    }

    // ───────────────────────── Internal Guards ─────────────────────────

    /// Run `op` as one transaction: commit on success, revert on error.
    ///
    /// A panic inside `op` (e.g. a trapping recipient) also reverts the
    /// checkpoint before the panic continues.
    fn atomic<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, VaultError>,
    ) -> Result<T, VaultError> {
        let checkpoint = self.ledger.checkpoint();
        match panic::catch_unwind(AssertUnwindSafe(|| op(self))) {
            Ok(Ok(value)) => {
                self.ledger.commit(checkpoint);
                Ok(value)
            }
            Ok(Err(err)) => {
                self.ledger.revert(checkpoint);
                Err(err)
            }
            Err(payload) => {
                self.ledger.revert(checkpoint);
                warn!("Operation panicked; ledger reverted");
                panic::resume_unwind(payload)
            }
        }
    }

    /// Run `op` holding the reentrancy guard; the lock is dropped on every
    /// exit path, unwinding included.
    fn non_reentrant<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, VaultError>,
    ) -> Result<T, VaultError> {
        let _lock = self.reentrancy_guard.acquire()?;
        op(self)
    }
}

pub(crate) fn validate_withdraw_limit(withdraw_limit: Amount) -> Result<(), VaultError> {
    if withdraw_limit.is_zero() {
        return Err(VaultError::ZeroAmount);
    }
    if withdraw_limit > BANK_CAP {
        return Err(VaultError::AboveLimit {
            limit: BANK_CAP,
            attempted: withdraw_limit,
        });
    }
    Ok(())
}
