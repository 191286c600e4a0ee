//! Chain access layer for the MegaVote client.
//!
//! Defines the two seams to the outside world:
//! - [`WalletProvider`]: the wallet-injection API (account access, network
//!   switching, change notifications)
//! - [`ProposalContract`]: the deployed voting contract's interface
//!
//! Production implementations speak action-based JSON over HTTP:
//! [`HttpWalletBridge`] against a local key-holding wallet bridge, and
//! [`RpcContract`] against either the bridge (signer-backed writes) or a
//! public read-only endpoint.

pub mod bridge;
pub mod contract;
pub mod error;
pub mod event;
pub mod provider;
pub mod rpc;

pub use bridge::HttpWalletBridge;
pub use contract::{ProposalContract, ProposalRecord, ALREADY_VOTED_MARKER};
pub use error::{ContractError, ProviderError};
pub use event::WalletEvent;
pub use provider::WalletProvider;
pub use rpc::RpcContract;
