//! The wallet-injection seam.

use megavote_types::{Address, ChainId, ChainParams};

use crate::contract::ProposalContract;
use crate::error::ProviderError;
use crate::event::WalletEvent;

/// Interface to a user-controlled wallet.
///
/// Mirrors what a key-holding wallet exposes to applications: account
/// access, the current chain, chain switching and registration, change
/// notifications, and the construction of signer-backed contract handles.
/// Production implementation: [`crate::HttpWalletBridge`]; tests swap in a
/// nullable.
#[allow(async_fn_in_trait)]
pub trait WalletProvider: Send + Sync {
    /// Contract handle type whose writes are signed by the wallet.
    type Contract: ProposalContract + Clone + Send + Sync;

    /// Prompt the user for account access. Returns the authorized
    /// accounts, primary first.
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// Accounts already authorized for this application, without any
    /// prompt. Empty when the user has never granted (or has revoked)
    /// access.
    async fn authorized_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// The chain the wallet is currently on.
    async fn chain_id(&self) -> Result<ChainId, ProviderError>;

    /// Ask the wallet to move to `chain_id`. Fails with
    /// [`ProviderError::UnknownChain`] when the wallet has no entry for
    /// that chain; register one via [`add_chain`](Self::add_chain) first.
    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ProviderError>;

    /// Register a network the wallet does not know yet.
    async fn add_chain(&self, params: &ChainParams) -> Result<(), ProviderError>;

    /// Wait for the next wallet change notification. Resolves to `None`
    /// when the wallet stops delivering events.
    async fn next_event(&self) -> Option<WalletEvent>;

    /// Build a contract handle bound to the wallet's active signer.
    fn bind_contract(&self, contract: &Address) -> Self::Contract;
}
