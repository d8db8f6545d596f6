//! Contract-specific error types
//!
//! Every vault error aborts the whole call with no state change.

use thiserror::Error;
use vault_types::numeric::{Amount, AmountError};

/// Vault operation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Above limit: limit {limit}, attempted {attempted}")]
    AboveLimit { limit: Amount, attempted: Amount },

    #[error("No funds available for withdrawal")]
    NoFunds,

    #[error("Reentrancy detected")]
    ReentrancyDetected,

    #[error("Arithmetic underflow in balance calculation")]
    Underflow,

    #[error("Arithmetic overflow in balance calculation")]
    Overflow,

    #[error("Transfer failed: {0}")]
    TransferFailed(#[from] TransferError),
}

/// Failure reported by the recipient side of a value transfer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("recipient rejected value: {0}")]
    Rejected(String),

    #[error("recipient call reverted: {0}")]
    Reverted(String),
}

impl From<VaultError> for TransferError {
    fn from(err: VaultError) -> Self {
        TransferError::Reverted(err.to_string())
    }
}

/// Configuration loading errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid amount in config: {0}")]
    Amount(#[from] AmountError),

    #[error("Invalid vault policy: {0}")]
    Invalid(#[from] VaultError),
}

/// Snapshot export / restore errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unsupported snapshot version: {0}")]
    UnsupportedVersion(u32),

    #[error("Integrity check failed: expected {expected}, got {actual}")]
    IntegrityFailure { expected: String, actual: String },

    #[error("Snapshot bank cap {found} does not match compiled cap {expected}")]
    PolicyMismatch { expected: Amount, found: Amount },

    #[error("Invalid vault policy: {0}")]
    Invalid(#[from] VaultError),

    #[error("Account {account_id} appears more than once")]
    DuplicateAccount { account_id: String },

    #[error("Account {account_id} deposited {total_deposited}, above cap")]
    CapExceeded {
        account_id: String,
        total_deposited: Amount,
    },

    #[error("Account {account_id} is inconsistent: {reason}")]
    InconsistentAccount { account_id: String, reason: String },

    #[error("Balances sum to {balances}, vault holds {held}")]
    ConservationViolated { balances: Amount, held: Amount },

    #[error("Cannot snapshot while an operation is in progress")]
    InTransaction,
}
