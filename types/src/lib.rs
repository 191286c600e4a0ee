//! Fundamental types for the MegaVote client.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: account addresses, transaction hashes, proposal identifiers,
//! proposals, vote types, and chain parameters.

pub mod address;
pub mod error;
pub mod hash;
pub mod network;
pub mod proposal;

pub use address::Address;
pub use error::TypeError;
pub use hash::TxHash;
pub use network::{ChainId, ChainParams, NativeCurrency};
pub use proposal::{Proposal, ProposalId, VoteType, DESCRIPTION_MAX_LEN, TITLE_MAX_LEN};
