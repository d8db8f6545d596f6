//! Vault configuration
//!
//! Only the withdrawal limit is configurable; the bank cap is compiled in.
//! Limits are written in ether, e.g.
//!
//! ```json
//! { "withdraw_limit": "0.1" }
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;
use vault_types::numeric::Amount;

use crate::errors::ConfigError;
use crate::vault::{validate_withdraw_limit, Vault};

/// Construction parameters for a vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Maximum amount per withdrawal call, in ether.
    pub withdraw_limit: Decimal,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            withdraw_limit: Decimal::new(1, 1), // 0.1 ether
        }
    }
}

impl VaultConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_json_str(&contents)?;
        info!(path = %path.display(), "Loaded vault config");
        Ok(config)
    }

    /// Withdrawal limit in base units, validated against the vault policy.
    pub fn withdraw_limit_amount(&self) -> Result<Amount, ConfigError> {
        let limit = Amount::from_ether(self.withdraw_limit)?;
        validate_withdraw_limit(limit)?;
        Ok(limit)
    }

    /// Construct the vault described by this config.
    pub fn build(&self) -> Result<Vault, ConfigError> {
        let limit = self.withdraw_limit_amount()?;
        Ok(Vault::new(limit)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::VaultError;
    use std::io::Write;

    #[test]
    fn test_default_config_builds() {
        let vault = VaultConfig::default().build().unwrap();
        assert_eq!(vault.withdraw_limit(), Amount::parse_ether("0.1").unwrap());
    }

    #[test]
    fn test_from_json_str() {
        let config = VaultConfig::from_json_str(r#"{ "withdraw_limit": "0.25" }"#).unwrap();
        assert_eq!(config.withdraw_limit, Decimal::new(25, 2));
        assert_eq!(
            config.withdraw_limit_amount().unwrap(),
            Amount::from_wei(250_000_000_000_000_000)
        );
    }

    #[test]
    fn test_bank_cap_is_not_configurable() {
        let result =
            VaultConfig::from_json_str(r#"{ "withdraw_limit": "0.1", "bank_cap": "5" }"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let config = VaultConfig::from_json_str(r#"{ "withdraw_limit": "0" }"#).unwrap();
        assert_eq!(
            config.build().unwrap_err(),
            ConfigError::Invalid(VaultError::ZeroAmount)
        );
    }

    #[test]
    fn test_limit_above_cap_rejected() {
        let config = VaultConfig::from_json_str(r#"{ "withdraw_limit": "2" }"#).unwrap();
        assert!(matches!(
            config.build(),
            Err(ConfigError::Invalid(VaultError::AboveLimit { .. }))
        ));
    }

    #[test]
    fn test_negative_limit_rejected() {
        let config = VaultConfig::from_json_str(r#"{ "withdraw_limit": "-0.1" }"#).unwrap();
        assert!(matches!(config.build(), Err(ConfigError::Amount(_))));
    }

    #[test]
    fn test_from_json_file() {
        let path = std::env::temp_dir().join(format!("vault-config-{}.json", std::process::id()));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(br#"{ "withdraw_limit": "0.5" }"#).unwrap();
        drop(file);

        let config = VaultConfig::from_json_file(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(config.withdraw_limit, Decimal::new(5, 1));
    }

    #[test]
    fn test_from_json_file_missing() {
        let result = VaultConfig::from_json_file("/nonexistent/vault.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
