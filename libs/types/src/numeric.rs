//! Native-asset amounts
//!
//! Amounts are unsigned integers in the asset's base unit (wei). Every
//! arithmetic operation is checked and reports failure instead of wrapping.
//! `rust_decimal` is only used at the edges, to convert between base units
//! and human-readable ether without floating-point error.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of fractional digits in one ether.
pub const ETHER_DECIMALS: u32 = 18;

/// Errors converting between base units and ether.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount cannot be negative: {0}")]
    Negative(String),

    #[error("Amount has more than 18 fractional digits: {0}")]
    TooPrecise(String),

    #[error("Amount out of range: {0}")]
    OutOfRange(String),

    #[error("Invalid decimal amount: {0}")]
    Parse(String),
}

/// Unsigned amount of the native asset, in base units.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// 10^18 base units.
    pub const ONE_ETHER: Amount = Amount(1_000_000_000_000_000_000);

    pub const fn from_wei(wei: u128) -> Self {
        Self(wei)
    }

    pub const fn as_wei(&self) -> u128 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition. `None` on overflow.
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    /// Addition clamped at `u128::MAX` wei. Only for reporting; ledger
    /// arithmetic stays checked.
    pub fn saturating_add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }

    /// Checked subtraction. `None` if `rhs > self`.
    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    /// Convert an ether-denominated decimal into base units.
    ///
    /// The conversion is exact: negative values and values with more than
    /// 18 significant fractional digits are rejected rather than rounded.
    pub fn from_ether(ether: Decimal) -> Result<Self, AmountError> {
        if ether.is_sign_negative() && !ether.is_zero() {
            return Err(AmountError::Negative(ether.to_string()));
        }

        let ether = ether.normalize();
        let scale = ether.scale();
        if scale > ETHER_DECIMALS {
            return Err(AmountError::TooPrecise(ether.to_string()));
        }

        let mantissa = ether.mantissa().unsigned_abs();
        let factor = 10u128.pow(ETHER_DECIMALS - scale);

        mantissa
            .checked_mul(factor)
            .map(Amount)
            .ok_or_else(|| AmountError::OutOfRange(ether.to_string()))
    }

    /// Parse an ether-denominated decimal string, e.g. `"0.25"`.
    pub fn parse_ether(s: &str) -> Result<Self, AmountError> {
        let ether = Decimal::from_str(s.trim()).map_err(|e| AmountError::Parse(e.to_string()))?;
        Self::from_ether(ether)
    }

    /// Express this amount in ether.
    ///
    /// Fails only for amounts beyond the 96-bit decimal mantissa.
    pub fn to_ether(&self) -> Result<Decimal, AmountError> {
        let wei = i128::try_from(self.0).map_err(|_| AmountError::OutOfRange(self.to_string()))?;
        Decimal::try_from_i128_with_scale(wei, ETHER_DECIMALS)
            .map(|d| d.normalize())
            .map_err(|_| AmountError::OutOfRange(self.to_string()))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} wei", self.0)
    }
}

impl From<u128> for Amount {
    fn from(wei: u128) -> Self {
        Self(wei)
    }
}

impl From<Amount> for u128 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_one_ether_constant() {
        assert_eq!(Amount::parse_ether("1").unwrap(), Amount::ONE_ETHER);
        assert_eq!(Amount::ONE_ETHER.as_wei(), 10u128.pow(18));
    }

    #[test]
    fn test_saturating_add_clamps() {
        let max = Amount::from_wei(u128::MAX);
        assert_eq!(max.saturating_add(Amount::ONE_ETHER), max);
        assert_eq!(
            Amount::from_wei(2).saturating_add(Amount::from_wei(3)),
            Amount::from_wei(5)
        );
    }

    #[test]
    fn test_from_ether_fractional() {
        let amount = Amount::from_ether(Decimal::new(9, 1)).unwrap(); // 0.9
        assert_eq!(amount.as_wei(), 900_000_000_000_000_000);
    }

    #[test]
    fn test_from_ether_smallest_unit() {
        let amount = Amount::parse_ether("0.000000000000000001").unwrap();
        assert_eq!(amount, Amount::from_wei(1));
    }

    #[test]
    fn test_from_ether_trailing_zeros_beyond_precision() {
        // Normalization drops the zeros, so this is still exactly 1 wei.
        let amount = Amount::parse_ether("0.00000000000000000100").unwrap();
        assert_eq!(amount, Amount::from_wei(1));
    }

    #[test]
    fn test_from_ether_too_precise() {
        let result = Amount::parse_ether("0.0000000000000000001");
        assert!(matches!(result, Err(AmountError::TooPrecise(_))));
    }

    #[test]
    fn test_from_ether_negative() {
        let result = Amount::from_ether(Decimal::new(-1, 0));
        assert!(matches!(result, Err(AmountError::Negative(_))));
    }

    #[test]
    fn test_parse_ether_garbage() {
        assert!(matches!(
            Amount::parse_ether("one ether"),
            Err(AmountError::Parse(_))
        ));
    }

    #[test]
    fn test_to_ether() {
        let amount = Amount::from_wei(50_000_000_000_000_000);
        assert_eq!(amount.to_ether().unwrap(), Decimal::new(5, 2));
    }

    #[test]
    fn test_to_ether_out_of_range() {
        let result = Amount::from_wei(u128::MAX).to_ether();
        assert!(matches!(result, Err(AmountError::OutOfRange(_))));
    }

    #[test]
    fn test_checked_arithmetic() {
        let max = Amount::from_wei(u128::MAX);
        assert_eq!(max.checked_add(Amount::from_wei(1)), None);
        assert_eq!(Amount::ZERO.checked_sub(Amount::from_wei(1)), None);
        assert_eq!(
            Amount::from_wei(5).checked_sub(Amount::from_wei(3)),
            Some(Amount::from_wei(2))
        );
    }

    #[test]
    fn test_amount_serializes_as_integer() {
        let json = serde_json::to_string(&Amount::from_wei(42)).unwrap();
        assert_eq!(json, "42");
    }

    proptest! {
        /// Any wei amount inside the decimal mantissa survives a trip through ether.
        #[test]
        fn fuzz_ether_conversion_exact(wei in 0u128..(1u128 << 96)) {
            let amount = Amount::from_wei(wei);
            let ether = amount.to_ether().unwrap();
            prop_assert_eq!(Amount::from_ether(ether).unwrap(), amount);
        }
    }
}
