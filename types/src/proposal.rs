//! Governance proposals and their display identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::address::Address;
use crate::error::TypeError;

/// Maximum title length accepted for a new proposal.
pub const TITLE_MAX_LEN: usize = 100;

/// Maximum description length accepted for a new proposal.
pub const DESCRIPTION_MAX_LEN: usize = 300;

/// Display identifier for a proposal, derived from its on-chain index.
///
/// Rendered as `PIP-NNN` with the index zero-padded to three digits:
/// `PIP-007` for index 7, `PIP-123` for index 123, `PIP-1234` past 999.
/// The mapping is injective, so the index can always be recovered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProposalId(u64);

impl ProposalId {
    pub const PREFIX: &'static str = "PIP-";

    /// Derive the id for an on-chain index.
    pub fn from_index(index: u64) -> Self {
        Self(index)
    }

    /// The on-chain index this id was derived from.
    pub fn index(&self) -> u64 {
        self.0
    }

    /// Parse a rendered id back into its index.
    ///
    /// Only canonical forms are accepted: zero-padding applies up to three
    /// digits, so `PIP-0123` is rejected while `PIP-012` is not.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let digits = s
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| TypeError::InvalidProposalId(s.to_string()))?;
        let canonical = digits.len() >= 3
            && (digits.len() == 3 || !digits.starts_with('0'))
            && digits.chars().all(|c| c.is_ascii_digit());
        if !canonical {
            return Err(TypeError::InvalidProposalId(s.to_string()));
        }
        digits
            .parse::<u64>()
            .map(Self)
            .map_err(|_| TypeError::InvalidProposalId(s.to_string()))
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", Self::PREFIX, self.0)
    }
}

impl FromStr for ProposalId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProposalId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ProposalId> for String {
    fn from(id: ProposalId) -> Self {
        id.to_string()
    }
}

/// Direction of a vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Upvote,
    Downvote,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upvote => "upvote",
            Self::Downvote => "downvote",
        }
    }

    /// Whether this vote counts for the proposal.
    pub fn is_upvote(&self) -> bool {
        matches!(self, Self::Upvote)
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VoteType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" | "upvote" | "for" => Ok(Self::Upvote),
            "down" | "downvote" | "against" => Ok(Self::Downvote),
            other => Err(TypeError::InvalidVoteType(other.to_string())),
        }
    }
}

/// One governance proposal as displayed to the user.
///
/// Materialized from an on-chain record at refresh time; the counters may
/// additionally carry an optimistic increment for the local signer's own
/// confirmed vote until the next full refresh replaces the snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub title: String,
    pub description: String,
    pub proposer: Address,
    pub upvotes: u64,
    pub downvotes: u64,
}
