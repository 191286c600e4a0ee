//! Client configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use megavote_types::{Address, ChainId, ChainParams, NativeCurrency};

use crate::error::AppError;

/// Configuration for the MegaVote client.
///
/// Can be loaded from a TOML file via [`AppConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default, so
/// an empty file is a valid config targeting the MEGA test network.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Numeric id of the single required chain.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// Display name used when registering the chain with a wallet.
    #[serde(default = "default_chain_name")]
    pub chain_name: String,

    /// Native currency name.
    #[serde(default = "default_currency_name")]
    pub currency_name: String,

    /// Native currency ticker symbol.
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    /// Native currency decimals.
    #[serde(default = "default_currency_decimals")]
    pub currency_decimals: u8,

    /// Public read-only RPC endpoint, used when no wallet is connected.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Block-explorer base URL for transaction links.
    #[serde(default = "default_explorer_url")]
    pub explorer_url: String,

    /// Deployment address of the voting contract.
    #[serde(default = "default_contract_address")]
    pub contract_address: String,

    /// Wallet bridge endpoint.
    #[serde(default = "default_wallet_url")]
    pub wallet_url: String,

    /// Data directory for the reconnect marker.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_chain_id() -> u64 {
    6342
}

fn default_chain_name() -> String {
    "MEGA Testnet".to_string()
}

fn default_currency_name() -> String {
    "ETH".to_string()
}

fn default_currency_symbol() -> String {
    "ETH".to_string()
}

fn default_currency_decimals() -> u8 {
    18
}

fn default_rpc_url() -> String {
    "https://carrot.megaeth.com/rpc".to_string()
}

fn default_explorer_url() -> String {
    "https://www.megaexplorer.xyz".to_string()
}

fn default_contract_address() -> String {
    "0x59b670e9fA9D0A427751Af201D676719a970857b".to_string()
}

fn default_wallet_url() -> String {
    "http://127.0.0.1:1248".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./megavote_data")
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &std::path::Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, AppError> {
        toml::from_str(s).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("AppConfig is always serializable to TOML")
    }

    /// Assemble the required network's registration parameters.
    pub fn chain_params(&self) -> ChainParams {
        ChainParams {
            chain_id: ChainId(self.chain_id),
            chain_name: self.chain_name.clone(),
            currency: NativeCurrency {
                name: self.currency_name.clone(),
                symbol: self.currency_symbol.clone(),
                decimals: self.currency_decimals,
            },
            rpc_url: self.rpc_url.clone(),
            explorer_url: self.explorer_url.clone(),
        }
    }

    /// The validated contract deployment address.
    pub fn contract(&self) -> Result<Address, AppError> {
        Address::parse(self.contract_address.clone()).map_err(|e| AppError::Config(e.to_string()))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            chain_name: default_chain_name(),
            currency_name: default_currency_name(),
            currency_symbol: default_currency_symbol(),
            currency_decimals: default_currency_decimals(),
            rpc_url: default_rpc_url(),
            explorer_url: default_explorer_url(),
            contract_address: default_contract_address(),
            wallet_url: default_wallet_url(),
            data_dir: default_data_dir(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = AppConfig::default();
        let toml_str = config.to_toml_string();
        let parsed = AppConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.chain_id, config.chain_id);
        assert_eq!(parsed.rpc_url, config.rpc_url);
    }

    #[test]
    fn empty_toml_uses_mega_testnet_defaults() {
        let config = AppConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.chain_id, 6342);
        assert_eq!(config.chain_name, "MEGA Testnet");
        assert_eq!(config.wallet_url, "http://127.0.0.1:1248");
        assert_eq!(config.log_format, "human");
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            chain_id = 31337
            rpc_url = "http://127.0.0.1:8545"
        "#;
        let config = AppConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.chain_id, 31337);
        assert_eq!(config.rpc_url, "http://127.0.0.1:8545");
        assert_eq!(config.chain_name, "MEGA Testnet"); // default
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = AppConfig::from_toml_file(std::path::Path::new("/nonexistent/megavote.toml"));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn contract_address_is_validated() {
        let mut config = AppConfig::default();
        assert!(config.contract().is_ok());
        config.contract_address = "0xnope".to_string();
        assert!(matches!(config.contract(), Err(AppError::Config(_))));
    }

    #[test]
    fn chain_params_carry_all_registration_fields() {
        let params = AppConfig::default().chain_params();
        assert_eq!(params.chain_id, ChainId(6342));
        assert_eq!(params.currency.symbol, "ETH");
        assert!(!params.explorer_url.is_empty());
    }
}
