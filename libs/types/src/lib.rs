//! Types library for the capped native-asset vault
//!
//! Shared, frozen type definitions used by the vault contract and any host
//! that drives it.
//!
//! # Modules
//! - `ids`: Account principal identifiers
//! - `numeric`: Native-asset amounts with checked arithmetic

pub mod ids;
pub mod numeric;

pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
}
