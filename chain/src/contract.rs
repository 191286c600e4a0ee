//! The voting contract's consumed interface.

use megavote_types::TxHash;
use serde::Deserialize;

use crate::error::ContractError;

/// Revert reason emitted by the deployed contract when a signer votes a
/// second time on the same proposal. Matching is by substring, so the
/// contract may decorate the message.
pub const ALREADY_VOTED_MARKER: &str = "You have already voted on this proposal";

/// One proposal record as the contract returns it, before display decoding.
///
/// All fields are required; a record missing any of them (or carrying a
/// negative counter) is a decode error, never silently defaulted.
#[derive(Clone, Debug, Deserialize)]
pub struct ProposalRecord {
    /// On-chain index of this proposal.
    pub id: u64,
    pub title: String,
    pub description: String,
    pub proposer: String,
    pub upvotes: u64,
    pub downvotes: u64,
}

/// Typed binding to the deployed voting contract.
///
/// Reads are plain queries. Writes submit a transaction and wait for
/// on-chain confirmation before returning, so a returned hash always
/// identifies a confirmed transaction; rejection by contract logic
/// surfaces as [`ContractError::Reverted`] with the revert reason.
#[allow(async_fn_in_trait)]
pub trait ProposalContract: Send + Sync {
    async fn proposal_count(&self) -> Result<u64, ContractError>;

    async fn proposal(&self, index: u64) -> Result<ProposalRecord, ContractError>;

    async fn create_proposal(
        &self,
        title: &str,
        description: &str,
    ) -> Result<TxHash, ContractError>;

    /// Cast a vote on the proposal at `index`; `support` selects
    /// upvote (`true`) or downvote (`false`).
    async fn vote(&self, index: u64, support: bool) -> Result<TxHash, ContractError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_decodes_complete_object() {
        let json = r#"{
            "id": 3,
            "title": "Launch a token",
            "description": "Yes or no",
            "proposer": "0x04E70e1f2f35334aB4b691D85ff8a32Ab5b1571e",
            "upvotes": 12,
            "downvotes": 4
        }"#;
        let record: ProposalRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, 3);
        assert_eq!(record.upvotes, 12);
    }

    #[test]
    fn record_rejects_missing_field() {
        let json = r#"{"id": 3, "title": "x", "description": "y", "proposer": "0x00"}"#;
        assert!(serde_json::from_str::<ProposalRecord>(json).is_err());
    }

    #[test]
    fn record_rejects_negative_counter() {
        let json = r#"{
            "id": 3,
            "title": "x",
            "description": "y",
            "proposer": "0x00",
            "upvotes": -1,
            "downvotes": 0
        }"#;
        assert!(serde_json::from_str::<ProposalRecord>(json).is_err());
    }
}
