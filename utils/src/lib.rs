//! Shared utilities for the MegaVote workspace.

pub mod fmt;
pub mod logging;

pub use fmt::ellipsize;
pub use logging::{init_logging, LogFormat};
