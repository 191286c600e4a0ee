use megavote_types::ChainId;
use thiserror::Error;

/// Errors from the wallet-injection side.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No wallet is reachable at all (bridge not running, nothing injected).
    #[error("no wallet available")]
    Unavailable,

    /// The user declined the request (EIP-1193 code 4001).
    #[error("request rejected by user")]
    Rejected,

    /// The wallet does not recognize the requested chain (EIP-3085 code 4902).
    #[error("chain {0} is unknown to the wallet")]
    UnknownChain(ChainId),

    #[error("wallet error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid wallet response: {0}")]
    Decode(String),
}

/// Errors from the contract client.
#[derive(Debug, Error)]
pub enum ContractError {
    /// The transaction was included and rejected by contract logic.
    #[error("transaction reverted: {reason}")]
    Reverted { reason: String },

    /// The transaction was submitted but never confirmed within the
    /// polling window.
    #[error("transaction {0} not confirmed in time")]
    ConfirmationTimeout(String),

    #[error("endpoint error: {0}")]
    Rpc(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid contract response: {0}")]
    Decode(String),
}
