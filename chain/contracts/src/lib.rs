//! Capped Native-Asset Vault
//!
//! A single-contract vault that accepts native-asset deposits up to a
//! per-account cap, pays out withdrawals bounded by a fixed per-call limit,
//! and keeps per-account activity counters.
//!
//! # Modules
//! - `errors`: Contract error taxonomy
//! - `events`: `Deposited` / `Withdrawn` notifications
//! - `security`: Reentrancy guard
//! - `ledger`: Journaled account store with checkpoint / revert
//! - `transfer`: External value-transfer seam (the only reentry point)
//! - `vault`: Deposit, withdraw and stats operations
//! - `config`: JSON vault configuration
//! - `snapshot`: Verifiable export and restore of persisted state

pub mod errors;
pub mod events;
pub mod security;
pub mod ledger;
pub mod transfer;
pub mod vault;
pub mod config;
pub mod snapshot;

pub use vault::{UserStats, Vault, BANK_CAP};
