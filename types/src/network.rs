//! Chain identity and registration parameters.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::hash::TxHash;

/// Numeric chain identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl ChainId {
    /// Hex form used by wallet switch and registration requests.
    pub fn as_hex(&self) -> String {
        format!("0x{:x}", self.0)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Native currency of a chain, as wallets display it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Everything a wallet needs to register a network it does not know yet,
/// plus the endpoints the client itself uses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParams {
    pub chain_id: ChainId,
    pub chain_name: String,
    pub currency: NativeCurrency,
    pub rpc_url: String,
    pub explorer_url: String,
}

impl ChainParams {
    /// Parameters of the MEGA test network, the single required chain.
    pub fn mega_testnet() -> Self {
        Self {
            chain_id: ChainId(6342),
            chain_name: "MEGA Testnet".to_string(),
            currency: NativeCurrency {
                name: "ETH".to_string(),
                symbol: "ETH".to_string(),
                decimals: 18,
            },
            rpc_url: "https://carrot.megaeth.com/rpc".to_string(),
            explorer_url: "https://www.megaexplorer.xyz".to_string(),
        }
    }

    /// Block-explorer link for a transaction.
    pub fn tx_url(&self, hash: &TxHash) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_id_hex_form() {
        assert_eq!(ChainId(6342).as_hex(), "0x18c6");
        assert_eq!(ChainId(1).as_hex(), "0x1");
    }

    #[test]
    fn mega_testnet_defaults() {
        let params = ChainParams::mega_testnet();
        assert_eq!(params.chain_id, ChainId(6342));
        assert_eq!(params.currency.decimals, 18);
        assert!(params.rpc_url.starts_with("https://"));
    }

    #[test]
    fn tx_url_joins_cleanly() {
        let mut params = ChainParams::mega_testnet();
        params.explorer_url = "https://example.org/".to_string();
        let hash = TxHash::parse(format!("0x{}", "00".repeat(32))).unwrap();
        assert_eq!(
            params.tx_url(&hash),
            format!("https://example.org/tx/{hash}")
        );
    }
}
