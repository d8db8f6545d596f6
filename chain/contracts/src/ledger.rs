//! Ledger — journaled per-account state
//!
//! Owns the two persisted mappings (account records and available balances),
//! the total amount of native asset held, and the notification log.
//!
//! Every write records the value it replaces in a journal. A caller opens a
//! checkpoint before an operation and either commits it or reverts to it,
//! which restores every key written since, including writes made by nested
//! operations (e.g. a deposit made by a recipient during a transfer).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use vault_types::ids::AccountId;
use vault_types::numeric::Amount;

use crate::events::ContractEvent;

/// Per-account activity record. Created zero-valued on first access.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Sum of every deposit ever accepted. Never decreases.
    pub total_deposited: Amount,
    pub deposit_count: u64,
    pub withdraw_count: u64,
}

#[derive(Debug, Clone)]
enum JournalEntry {
    Record {
        account_id: AccountId,
        previous: Option<AccountRecord>,
    },
    Balance {
        account_id: AccountId,
        previous: Option<Amount>,
    },
    TotalHeld(Amount),
    Event { log_len: usize },
}

/// Position in the journal to revert to.
#[derive(Debug)]
#[must_use = "a checkpoint must be committed or reverted"]
pub struct Checkpoint {
    journal_len: usize,
}

/// Journaled account store.
#[derive(Debug, Default)]
pub struct Ledger {
    records: HashMap<AccountId, AccountRecord>,
    balances: HashMap<AccountId, Amount>,
    total_held: Amount,
    events: Vec<ContractEvent>,
    journal: Vec<JournalEntry>,
    /// Number of open checkpoints.
    depth: usize,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted state. The journal starts empty.
    pub(crate) fn from_parts(
        records: HashMap<AccountId, AccountRecord>,
        balances: HashMap<AccountId, Amount>,
        total_held: Amount,
    ) -> Self {
        Self {
            records,
            balances,
            total_held,
            ..Self::default()
        }
    }

    // ───────────────────────── Reads ─────────────────────────

    /// Record for an account, zero-valued if it has never been touched.
    pub fn record(&self, account_id: &AccountId) -> AccountRecord {
        self.records.get(account_id).copied().unwrap_or_default()
    }

    /// Currently withdrawable amount for an account.
    pub fn balance(&self, account_id: &AccountId) -> Amount {
        self.balances.get(account_id).copied().unwrap_or(Amount::ZERO)
    }

    /// Total native asset held by the vault.
    pub fn total_held(&self) -> Amount {
        self.total_held
    }

    /// Checked sum of all available balances. `None` on overflow.
    pub fn sum_of_balances(&self) -> Option<Amount> {
        self.balances
            .values()
            .try_fold(Amount::ZERO, |acc, b| acc.checked_add(*b))
    }

    /// Every account that has a record or a balance.
    pub fn accounts(&self) -> Vec<AccountId> {
        let mut ids: Vec<AccountId> = self
            .records
            .keys()
            .chain(self.balances.keys())
            .copied()
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    /// Take the event log. Yields nothing while a checkpoint is open, since
    /// those events may still be reverted.
    pub fn drain_events(&mut self) -> Vec<ContractEvent> {
        if self.in_transaction() {
            return Vec::new();
        }
        std::mem::take(&mut self.events)
    }

    /// Whether any checkpoint is open.
    pub fn in_transaction(&self) -> bool {
        self.depth > 0
    }

    // ───────────────────────── Writes ─────────────────────────

    pub fn set_record(&mut self, account_id: AccountId, record: AccountRecord) {
        let previous = self.records.insert(account_id, record);
        self.log_undo(JournalEntry::Record {
            account_id,
            previous,
        });
    }

    pub fn set_balance(&mut self, account_id: AccountId, balance: Amount) {
        let previous = self.balances.insert(account_id, balance);
        self.log_undo(JournalEntry::Balance {
            account_id,
            previous,
        });
    }

    pub fn set_total_held(&mut self, total_held: Amount) {
        let previous = std::mem::replace(&mut self.total_held, total_held);
        self.log_undo(JournalEntry::TotalHeld(previous));
    }

    /// Append a notification to the log.
    pub fn emit(&mut self, event: ContractEvent) {
        self.log_undo(JournalEntry::Event {
            log_len: self.events.len(),
        });
        self.events.push(event);
    }

    // Writes outside any checkpoint are final and need no undo entry.
    fn log_undo(&mut self, entry: JournalEntry) {
        if self.depth > 0 {
            self.journal.push(entry);
        }
    }

    // ───────────────────────── Transactions ─────────────────────────

    /// Open a checkpoint. Checkpoints nest.
    pub fn checkpoint(&mut self) -> Checkpoint {
        self.depth += 1;
        Checkpoint {
            journal_len: self.journal.len(),
        }
    }

    /// Keep every write made since `checkpoint`.
    ///
    /// Writes stay journaled until the outermost checkpoint closes, so an
    /// enclosing operation can still revert them.
    pub fn commit(&mut self, checkpoint: Checkpoint) {
        debug_assert!(checkpoint.journal_len <= self.journal.len());
        self.close();
    }

    /// Undo every write made since `checkpoint`, newest first.
    pub fn revert(&mut self, checkpoint: Checkpoint) {
        while self.journal.len() > checkpoint.journal_len {
            let Some(entry) = self.journal.pop() else {
                break;
            };
            match entry {
                JournalEntry::Record {
                    account_id,
                    previous,
                } => match previous {
                    Some(record) => {
                        self.records.insert(account_id, record);
                    }
                    None => {
                        self.records.remove(&account_id);
                    }
                },
                JournalEntry::Balance {
                    account_id,
                    previous,
                } => match previous {
                    Some(balance) => {
                        self.balances.insert(account_id, balance);
                    }
                    None => {
                        self.balances.remove(&account_id);
                    }
                },
                JournalEntry::TotalHeld(previous) => self.total_held = previous,
                JournalEntry::Event { log_len } => self.events.truncate(log_len),
            }
        }
        self.close();
    }

    fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.journal.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Deposited;

    fn deposited(account_id: AccountId, wei: u128) -> ContractEvent {
        ContractEvent::Deposited(Deposited {
            account_id,
            amount: Amount::from_wei(wei),
        })
    }

    #[test]
    fn test_untouched_account_is_zero() {
        let ledger = Ledger::new();
        let acc = AccountId::new();
        assert_eq!(ledger.record(&acc), AccountRecord::default());
        assert_eq!(ledger.balance(&acc), Amount::ZERO);
        assert!(ledger.accounts().is_empty());
    }

    #[test]
    fn test_commit_keeps_writes_and_clears_journal() {
        let mut ledger = Ledger::new();
        let acc = AccountId::new();

        let cp = ledger.checkpoint();
        ledger.set_balance(acc, Amount::from_wei(10));
        ledger.set_total_held(Amount::from_wei(10));
        ledger.commit(cp);

        assert_eq!(ledger.balance(&acc), Amount::from_wei(10));
        assert_eq!(ledger.total_held(), Amount::from_wei(10));
        assert!(!ledger.in_transaction());
        assert!(ledger.journal.is_empty());
    }

    #[test]
    fn test_revert_restores_previous_values() {
        let mut ledger = Ledger::new();
        let acc = AccountId::new();

        let cp = ledger.checkpoint();
        ledger.set_balance(acc, Amount::from_wei(10));
        ledger.commit(cp);

        let cp = ledger.checkpoint();
        ledger.set_balance(acc, Amount::from_wei(3));
        ledger.set_balance(acc, Amount::from_wei(1));
        ledger.set_record(
            acc,
            AccountRecord {
                withdraw_count: 2,
                ..AccountRecord::default()
            },
        );
        ledger.emit(deposited(acc, 1));
        ledger.revert(cp);

        assert_eq!(ledger.balance(&acc), Amount::from_wei(10));
        assert_eq!(ledger.record(&acc), AccountRecord::default());
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn test_revert_removes_keys_created_in_transaction() {
        let mut ledger = Ledger::new();
        let acc = AccountId::new();

        let cp = ledger.checkpoint();
        ledger.set_record(acc, AccountRecord::default());
        ledger.set_balance(acc, Amount::from_wei(5));
        ledger.revert(cp);

        assert!(ledger.accounts().is_empty());
    }

    #[test]
    fn test_outer_revert_undoes_committed_inner() {
        let mut ledger = Ledger::new();
        let acc = AccountId::new();

        let outer = ledger.checkpoint();
        ledger.set_total_held(Amount::from_wei(1));

        let inner = ledger.checkpoint();
        ledger.set_balance(acc, Amount::from_wei(7));
        ledger.emit(deposited(acc, 7));
        ledger.commit(inner);
        assert!(ledger.in_transaction());

        ledger.revert(outer);
        assert_eq!(ledger.balance(&acc), Amount::ZERO);
        assert_eq!(ledger.total_held(), Amount::ZERO);
        assert!(ledger.events().is_empty());
        assert!(!ledger.in_transaction());
    }

    #[test]
    fn test_inner_revert_keeps_outer_writes() {
        let mut ledger = Ledger::new();
        let acc = AccountId::new();

        let outer = ledger.checkpoint();
        ledger.set_balance(acc, Amount::from_wei(4));

        let inner = ledger.checkpoint();
        ledger.set_balance(acc, Amount::from_wei(9));
        ledger.revert(inner);

        ledger.commit(outer);
        assert_eq!(ledger.balance(&acc), Amount::from_wei(4));
    }

    #[test]
    fn test_drain_inside_checkpoint_yields_nothing() {
        let mut ledger = Ledger::new();
        let acc = AccountId::new();

        let checkpoint = ledger.checkpoint();
        ledger.emit(deposited(acc, 5));
        assert!(ledger.drain_events().is_empty());
        ledger.revert(checkpoint);
        assert!(ledger.events().is_empty());

        let checkpoint = ledger.checkpoint();
        ledger.emit(deposited(acc, 7));
        ledger.commit(checkpoint);
        assert_eq!(ledger.drain_events(), vec![deposited(acc, 7)]);
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn test_sum_of_balances() {
        let mut ledger = Ledger::new();
        ledger.set_balance(AccountId::new(), Amount::from_wei(3));
        ledger.set_balance(AccountId::new(), Amount::from_wei(4));
        assert_eq!(ledger.sum_of_balances(), Some(Amount::from_wei(7)));

        ledger.set_balance(AccountId::new(), Amount::from_wei(u128::MAX));
        assert_eq!(ledger.sum_of_balances(), None);
        assert!(ledger.journal.is_empty());
    }
}
