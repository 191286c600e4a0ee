//! Change notifications delivered by the wallet.

use megavote_types::{Address, ChainId};
use serde::{Deserialize, Serialize};

/// Externally triggered wallet changes the application must react to.
///
/// Delivered over the bridge's event stream as tagged JSON objects, e.g.
/// `{"type": "accounts_changed", "accounts": [...]}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WalletEvent {
    /// The authorized account list changed. An empty list means the user
    /// revoked the application's access.
    AccountsChanged { accounts: Vec<Address> },

    /// The wallet moved to a different chain.
    ChainChanged { chain_id: ChainId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_accounts_changed() {
        let json = r#"{"type": "accounts_changed", "accounts": ["0x04E70e1f2f35334aB4b691D85ff8a32Ab5b1571e"]}"#;
        let event: WalletEvent = serde_json::from_str(json).unwrap();
        match event {
            WalletEvent::AccountsChanged { accounts } => assert_eq!(accounts.len(), 1),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn decodes_chain_changed() {
        let json = r#"{"type": "chain_changed", "chain_id": 6342}"#;
        let event: WalletEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            WalletEvent::ChainChanged {
                chain_id: ChainId(6342)
            }
        );
    }

    #[test]
    fn rejects_malformed_account_entries() {
        let json = r#"{"type": "accounts_changed", "accounts": ["nonsense"]}"#;
        assert!(serde_json::from_str::<WalletEvent>(json).is_err());
    }
}
