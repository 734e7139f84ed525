//! Configuration for the ledger

use crate::types::DEFAULT_GENESIS_PROOF;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Chain parameters
    pub ledger: LedgerConfig,

    /// Policy issuance parameters
    pub issuance: IssuanceConfig,

    /// Actor configuration
    pub actor: ActorConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "policy-ledger".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            ledger: LedgerConfig::default(),
            issuance: IssuanceConfig::default(),
            actor: ActorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Chain parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Proof recorded on the genesis block
    pub genesis_proof: u64,

    /// Proof recorded on blocks sealed for issued policies
    pub seal_proof: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            genesis_proof: DEFAULT_GENESIS_PROOF,
            seal_proof: 200,
        }
    }
}

/// Policy issuance parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuanceConfig {
    /// Account premiums are recorded against
    pub vault_account: String,

    /// Smallest accepted premium
    pub min_premium: Decimal,
}

impl Default for IssuanceConfig {
    fn default() -> Self {
        Self {
            vault_account: "Insurance_Vault".to_string(),
            min_premium: Decimal::TEN,
        }
    }
}

impl IssuanceConfig {
    /// Check a policy request before it reaches the ledger
    pub fn check(&self, holder: &str, premium: Decimal) -> crate::Result<()> {
        if holder.trim().is_empty() {
            return Err(crate::Error::Validation(
                "Please enter a client name.".to_string(),
            ));
        }
        if premium < self.min_premium {
            return Err(crate::Error::Validation(format!(
                "Premium must be at least {}.",
                self.min_premium
            )));
        }
        Ok(())
    }
}

/// Actor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Bounded mailbox size (backpressure)
    pub mailbox_capacity: usize,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1000,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load from an optional file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        match path {
            Some(path) => {
                let mut config = Config::from_file(path)?;
                config.apply_overrides(|key| std::env::var(key).ok())?;
                Ok(config)
            }
            None => Config::from_env(),
        }
    }

    /// Apply `LEDGER_*` overrides from a variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> crate::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("LEDGER_GENESIS_PROOF") {
            self.ledger.genesis_proof = parse_var("LEDGER_GENESIS_PROOF", &value)?;
        }

        if let Some(value) = lookup("LEDGER_SEAL_PROOF") {
            self.ledger.seal_proof = parse_var("LEDGER_SEAL_PROOF", &value)?;
        }

        if let Some(value) = lookup("LEDGER_VAULT_ACCOUNT") {
            self.issuance.vault_account = value;
        }

        if let Some(value) = lookup("LEDGER_MIN_PREMIUM") {
            self.issuance.min_premium = parse_var("LEDGER_MIN_PREMIUM", &value)?;
        }

        if let Some(value) = lookup("LEDGER_MAILBOX_CAPACITY") {
            self.actor.mailbox_capacity = parse_var("LEDGER_MAILBOX_CAPACITY", &value)?;
        }

        self.validate()
    }

    /// Reject settings the ledger cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.issuance.vault_account.trim().is_empty() {
            return Err(crate::Error::Config(
                "issuance.vault_account must not be empty".to_string(),
            ));
        }
        if self.issuance.min_premium < Decimal::ZERO {
            return Err(crate::Error::Config(
                "issuance.min_premium must be non-negative".to_string(),
            ));
        }
        if self.actor.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "actor.mailbox_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T>(name: &str, value: &str) -> crate::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| crate::Error::Config(format!("Invalid {}={:?}: {}", name, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "policy-ledger");
        assert_eq!(config.ledger.genesis_proof, 100);
        assert_eq!(config.ledger.seal_proof, 200);
        assert_eq!(config.issuance.vault_account, "Insurance_Vault");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[ledger]
seal_proof = 42

[issuance]
min_premium = "25.50"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.ledger.seal_proof, 42);
        assert_eq!(config.ledger.genesis_proof, 100);
        assert_eq!(config.issuance.min_premium, Decimal::new(2550, 2));
        assert_eq!(config.issuance.vault_account, "Insurance_Vault");
    }

    #[test]
    fn test_issuance_check() {
        let issuance = IssuanceConfig::default();

        assert!(issuance.check("Alice", Decimal::TEN).is_ok());
        assert!(issuance.check("Alice", Decimal::new(12050, 2)).is_ok());

        let err = issuance.check("Alice", Decimal::new(999, 2)).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("at least 10"));

        let err = issuance.check("   ", Decimal::ONE_HUNDRED).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("client name"));
    }

    #[test]
    fn test_from_file_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ledger = [").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("LEDGER_GENESIS_PROOF", "1"),
            ("LEDGER_VAULT_ACCOUNT", "Reinsurer"),
            ("LEDGER_MAILBOX_CAPACITY", "8"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.ledger.genesis_proof, 1);
        assert_eq!(config.issuance.vault_account, "Reinsurer");
        assert_eq!(config.actor.mailbox_capacity, 8);
    }

    #[test]
    fn test_from_env_reads_process_environment() {
        std::env::set_var("LEDGER_SEAL_PROOF", "77");
        let from_env = Config::from_env();
        let loaded = Config::load(None);
        std::env::remove_var("LEDGER_SEAL_PROOF");

        assert_eq!(from_env.unwrap().ledger.seal_proof, 77);
        assert_eq!(loaded.unwrap().ledger.seal_proof, 77);
    }

    #[test]
    fn test_invalid_env_override() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(|key| (key == "LEDGER_SEAL_PROOF").then(|| "many".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("LEDGER_SEAL_PROOF"));

        let mut config = Config::default();
        let err = config
            .apply_overrides(|key| (key == "LEDGER_MAILBOX_CAPACITY").then(|| "0".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("mailbox_capacity"));
    }
}
