//! Nullable infrastructure for deterministic testing.
//!
//! The chain layer's external dependencies (the wallet and the voting
//! contract) sit behind traits. This crate provides in-memory
//! implementations that:
//! - Return programmable values
//! - Record every call for assertions
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod contract;
pub mod provider;

pub use contract::NullContract;
pub use provider::{NullWalletProvider, RequestBehavior, SwitchBehavior};
