//! Application core for the MegaVote client.
//!
//! Two components own all client state:
//! - [`ConnectionManager`]: the wallet/chain binding lifecycle (connect,
//!   silent reconnect, network switching, account-change reactions)
//! - [`ProposalStore`]: the local snapshot of on-chain proposals, with
//!   optimistic updates for the local signer's own confirmed votes
//!
//! A [`Session`] owns one of each, wires them to wallet change
//! notifications, and is the single entry point for front ends.

pub mod config;
pub mod connection;
pub mod error;
pub mod session;
pub mod store;

pub use config::AppConfig;
pub use connection::{ConnectionManager, ConnectionSnapshot, ReconnectFlag};
pub use error::AppError;
pub use session::{Session, ShutdownController};
pub use store::ProposalStore;
