//! Local proposal snapshot with optimistic vote updates.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, RwLock};

use megavote_chain::{
    ContractError, ProposalContract, ProposalRecord, ALREADY_VOTED_MARKER,
};
use megavote_types::{
    Address, Proposal, ProposalId, TxHash, VoteType, DESCRIPTION_MAX_LEN, TITLE_MAX_LEN,
};

use crate::error::AppError;

/// Owns the authoritative local view of all proposals.
///
/// `refresh` replaces the whole collection from the chain; a confirmed
/// local vote additionally bumps the matching counter immediately, so the
/// local actor sees their own vote without waiting for the next refresh.
/// The next refresh simply overwrites the optimistic value with the
/// chain's authoritative counts.
///
/// The store is usable with no wallet at all: reads go through the
/// `fallback` handle bound to a public endpoint, writes require the
/// caller to pass the signer-backed handle.
pub struct ProposalStore<C: ProposalContract> {
    fallback: C,
    proposals: RwLock<Vec<Proposal>>,
    loading: AtomicBool,
    /// Proposals with a vote submitted but not yet resolved. Guards
    /// against double submission from repeated triggers.
    votes_in_flight: Mutex<HashSet<ProposalId>>,
}

impl<C: ProposalContract> ProposalStore<C> {
    pub fn new(fallback: C) -> Self {
        Self {
            fallback,
            proposals: RwLock::new(Vec::new()),
            loading: AtomicBool::new(false),
            votes_in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Replace the collection with a fresh read of the chain.
    ///
    /// Uses the signer-backed `handle` when given, the read-only fallback
    /// otherwise. On any failure the previous collection stays as it was
    /// and the loading indicator is still cleared.
    pub async fn refresh(&self, handle: Option<&C>) -> Result<(), AppError> {
        let contract = handle.unwrap_or(&self.fallback);
        self.loading.store(true, Ordering::SeqCst);
        let result = read_all(contract).await;
        self.loading.store(false, Ordering::SeqCst);

        let fresh = result?;
        tracing::debug!(count = fresh.len(), "proposal snapshot refreshed");
        *self.proposals.write().await = fresh;
        Ok(())
    }

    /// Submit a new proposal and wait for its confirmation.
    ///
    /// Validation runs before any chain traffic. The new proposal is not
    /// inserted locally; the caller refreshes afterwards so the entry
    /// appears with its canonical chain-assigned index.
    pub async fn create_proposal(
        &self,
        handle: Option<&C>,
        title: &str,
        description: &str,
    ) -> Result<TxHash, AppError> {
        validate_content(title, description)?;
        let contract = handle.ok_or(AppError::NotConnected)?;
        contract
            .create_proposal(title, description)
            .await
            .map_err(|e| match e {
                ContractError::Reverted { reason } => AppError::ProposalSubmissionFailed(reason),
                other => AppError::ProposalSubmissionFailed(other.to_string()),
            })
    }

    /// Cast a vote and, once confirmed, bump the matching counter.
    ///
    /// At most one vote per proposal may be in flight; a second attempt
    /// while the first is pending fails fast without reaching the chain.
    /// A revert carrying the contract's already-voted marker is reported
    /// as [`AppError::DuplicateVote`]. Counters never move on failure.
    pub async fn cast_vote(
        &self,
        handle: Option<&C>,
        id: &ProposalId,
        vote: VoteType,
    ) -> Result<TxHash, AppError> {
        let contract = handle.ok_or(AppError::NotConnected)?;

        {
            let mut in_flight = self.votes_in_flight.lock().await;
            if !in_flight.insert(*id) {
                return Err(AppError::VoteInFlight);
            }
        }

        let result = contract.vote(id.index(), vote.is_upvote()).await;
        self.votes_in_flight.lock().await.remove(id);

        match result {
            Ok(hash) => {
                self.apply_vote(id, vote).await;
                Ok(hash)
            }
            Err(ContractError::Reverted { reason })
                if reason.contains(ALREADY_VOTED_MARKER) =>
            {
                Err(AppError::DuplicateVote)
            }
            Err(ContractError::Reverted { reason }) => Err(AppError::VoteFailed(reason)),
            Err(other) => Err(AppError::VoteFailed(other.to_string())),
        }
    }

    /// Optimistic increment after a confirmed vote.
    async fn apply_vote(&self, id: &ProposalId, vote: VoteType) {
        let mut proposals = self.proposals.write().await;
        if let Some(proposal) = proposals.iter_mut().find(|p| p.id == *id) {
            match vote {
                VoteType::Upvote => proposal.upvotes += 1,
                VoteType::Downvote => proposal.downvotes += 1,
            }
        }
    }

    /// Owned snapshot of the current collection, newest first.
    pub async fn proposals(&self) -> Vec<Proposal> {
        self.proposals.read().await.clone()
    }

    /// One proposal by id, if present in the current snapshot.
    pub async fn get(&self, id: &ProposalId) -> Option<Proposal> {
        self.proposals
            .read()
            .await
            .iter()
            .find(|p| p.id == *id)
            .cloned()
    }

    /// Whether a refresh is currently running.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }
}

/// Read the full proposal set, ascending by index, newest-first on return.
async fn read_all<C: ProposalContract>(contract: &C) -> Result<Vec<Proposal>, AppError> {
    let count = contract.proposal_count().await.map_err(read_error)?;
    let mut proposals = Vec::with_capacity(count as usize);
    for index in 0..count {
        let record = contract.proposal(index).await.map_err(read_error)?;
        proposals.push(decode_record(record)?);
    }
    proposals.reverse();
    Ok(proposals)
}

/// Decode one wire record into a display proposal, strictly.
fn decode_record(record: ProposalRecord) -> Result<Proposal, AppError> {
    let proposer = Address::parse(record.proposer)
        .map_err(|e| AppError::ReadFailure(format!("bad proposal record {}: {e}", record.id)))?;
    Ok(Proposal {
        id: ProposalId::from_index(record.id),
        title: record.title,
        description: record.description,
        proposer,
        upvotes: record.upvotes,
        downvotes: record.downvotes,
    })
}

fn read_error(e: ContractError) -> AppError {
    AppError::ReadFailure(e.to_string())
}

/// Reject out-of-range titles and descriptions before any chain traffic.
fn validate_content(title: &str, description: &str) -> Result<(), AppError> {
    if title.is_empty() {
        return Err(AppError::InvalidProposal("title is required".into()));
    }
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(AppError::InvalidProposal(format!(
            "title cannot be longer than {TITLE_MAX_LEN} characters"
        )));
    }
    if description.is_empty() {
        return Err(AppError::InvalidProposal("description is required".into()));
    }
    if description.chars().count() > DESCRIPTION_MAX_LEN {
        return Err(AppError::InvalidProposal(format!(
            "description cannot be longer than {DESCRIPTION_MAX_LEN} characters"
        )));
    }
    Ok(())
}
