use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid transaction hash: {0}")]
    InvalidTxHash(String),

    #[error("invalid proposal id: {0}")]
    InvalidProposalId(String),

    #[error("invalid vote type: {0}")]
    InvalidVoteType(String),
}
