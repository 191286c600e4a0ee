use thiserror::Error;

/// Everything that can go wrong at the application boundary.
///
/// Chain-layer errors never leak raw: the components convert them into
/// these variants, and every failure leaves state either fully rolled back
/// or untouched.
#[derive(Debug, Error)]
pub enum AppError {
    /// No wallet is present; write operations cannot proceed until one is
    /// installed and running.
    #[error("no wallet found; install or start a wallet and retry")]
    WalletNotFound,

    /// The wallet declined or failed the connection handshake.
    #[error("wallet connection rejected")]
    ConnectionRejected,

    /// The wallet could not switch to (or register) the required network.
    #[error("failed to switch to the required network: {0}")]
    NetworkSwitchFailed(String),

    /// A write operation was attempted with no active signer.
    #[error("wallet not connected")]
    NotConnected,

    #[error("proposal submission failed: {0}")]
    ProposalSubmissionFailed(String),

    #[error("vote failed: {0}")]
    VoteFailed(String),

    /// The signer already voted on this proposal. Not retryable.
    #[error("you have already voted on this proposal")]
    DuplicateVote,

    /// A vote for this proposal is still awaiting confirmation.
    #[error("a vote for this proposal is already pending")]
    VoteInFlight,

    /// A refresh could not reach the chain; the previous snapshot is kept.
    #[error("could not read proposals: {0}")]
    ReadFailure(String),

    #[error("invalid proposal: {0}")]
    InvalidProposal(String),

    #[error("config error: {0}")]
    Config(String),
}
