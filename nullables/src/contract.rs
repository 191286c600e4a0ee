//! Nullable voting contract: in-memory state enforcing the same rules the
//! deployed contract does, including one-vote-per-signer.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use megavote_chain::{ContractError, ProposalContract, ProposalRecord, ALREADY_VOTED_MARKER};
use megavote_types::{Address, TxHash};

#[derive(Clone, Debug)]
struct StoredProposal {
    title: String,
    description: String,
    proposer: String,
    upvotes: u64,
    downvotes: u64,
}

#[derive(Default)]
struct Inner {
    proposals: Vec<StoredProposal>,
    /// (voter address, proposal index) pairs that already voted.
    votes: HashSet<(String, u64)>,
    /// Signer identity used for duplicate-vote tracking; set by
    /// `NullWalletProvider::bind_contract`.
    signer: Option<Address>,
    fail_reads: Option<String>,
    fail_writes: Option<String>,
    /// Index at which `proposal` serves a record with a mangled proposer.
    malformed_at: Option<u64>,
    /// Artificial latency before writes, for overlap tests.
    write_delay: Option<Duration>,
    next_tx: u64,
    calls: Vec<String>,
}

/// In-memory [`ProposalContract`] with programmable failures.
///
/// Clones share state, mirroring several handles bound to one deployment.
#[derive(Clone, Default)]
pub struct NullContract {
    inner: Arc<Mutex<Inner>>,
}

impl NullContract {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the signing identity used for duplicate-vote tracking.
    pub fn set_signer(&self, signer: Address) {
        self.inner.lock().unwrap().signer = Some(signer);
    }

    /// Append a proposal directly, bypassing the transaction path.
    pub fn seed_proposal(
        &self,
        title: &str,
        description: &str,
        proposer: &Address,
        upvotes: u64,
        downvotes: u64,
    ) {
        self.inner.lock().unwrap().proposals.push(StoredProposal {
            title: title.to_string(),
            description: description.to_string(),
            proposer: proposer.as_str().to_string(),
            upvotes,
            downvotes,
        });
    }

    /// Make every read fail with the given endpoint error.
    pub fn fail_reads_with(&self, message: &str) {
        self.inner.lock().unwrap().fail_reads = Some(message.to_string());
    }

    /// Make every write fail with the given endpoint error.
    pub fn fail_writes_with(&self, message: &str) {
        self.inner.lock().unwrap().fail_writes = Some(message.to_string());
    }

    pub fn clear_failures(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_reads = None;
        inner.fail_writes = None;
        inner.malformed_at = None;
    }

    /// Serve a record with an unparseable proposer at the given index.
    pub fn serve_malformed_at(&self, index: u64) {
        self.inner.lock().unwrap().malformed_at = Some(index);
    }

    /// Delay writes, so tests can overlap two in-flight transactions.
    pub fn delay_writes(&self, delay: Duration) {
        self.inner.lock().unwrap().write_delay = Some(delay);
    }

    /// All calls made so far, in order (for assertions).
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Whether `voter` has a recorded vote on the proposal at `index`.
    pub fn has_vote(&self, voter: &Address, index: u64) -> bool {
        self.inner
            .lock()
            .unwrap()
            .votes
            .contains(&(voter.as_str().to_string(), index))
    }

    /// Raw counters for the proposal at `index`.
    pub fn counters(&self, index: u64) -> Option<(u64, u64)> {
        self.inner
            .lock()
            .unwrap()
            .proposals
            .get(index as usize)
            .map(|p| (p.upvotes, p.downvotes))
    }

    async fn apply_write_delay(&self) {
        let delay = self.inner.lock().unwrap().write_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn next_hash(inner: &mut Inner) -> TxHash {
        inner.next_tx += 1;
        TxHash::parse(format!("0x{:064x}", inner.next_tx)).expect("synthetic hash is well-formed")
    }
}

impl ProposalContract for NullContract {
    async fn proposal_count(&self) -> Result<u64, ContractError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("proposal_count".to_string());
        if let Some(message) = &inner.fail_reads {
            return Err(ContractError::Rpc(message.clone()));
        }
        Ok(inner.proposals.len() as u64)
    }

    async fn proposal(&self, index: u64) -> Result<ProposalRecord, ContractError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(format!("proposal:{index}"));
        if let Some(message) = &inner.fail_reads {
            return Err(ContractError::Rpc(message.clone()));
        }
        let stored = inner
            .proposals
            .get(index as usize)
            .ok_or_else(|| ContractError::Rpc(format!("no proposal at index {index}")))?;
        let proposer = if inner.malformed_at == Some(index) {
            "not-an-address".to_string()
        } else {
            stored.proposer.clone()
        };
        Ok(ProposalRecord {
            id: index,
            title: stored.title.clone(),
            description: stored.description.clone(),
            proposer,
            upvotes: stored.upvotes,
            downvotes: stored.downvotes,
        })
    }

    async fn create_proposal(
        &self,
        title: &str,
        description: &str,
    ) -> Result<TxHash, ContractError> {
        self.apply_write_delay().await;
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(format!("create_proposal:{title}"));
        if let Some(message) = &inner.fail_writes {
            return Err(ContractError::Rpc(message.clone()));
        }
        let proposer = inner
            .signer
            .as_ref()
            .map(|a| a.as_str().to_string())
            .unwrap_or_else(|| format!("0x{}", "0".repeat(40)));
        inner.proposals.push(StoredProposal {
            title: title.to_string(),
            description: description.to_string(),
            proposer,
            upvotes: 0,
            downvotes: 0,
        });
        Ok(Self::next_hash(&mut inner))
    }

    async fn vote(&self, index: u64, support: bool) -> Result<TxHash, ContractError> {
        self.apply_write_delay().await;
        let mut inner = self.inner.lock().unwrap();
        inner
            .calls
            .push(format!("vote:{index}:{}", if support { "up" } else { "down" }));
        if let Some(message) = &inner.fail_writes {
            return Err(ContractError::Rpc(message.clone()));
        }
        if index as usize >= inner.proposals.len() {
            return Err(ContractError::Rpc(format!("no proposal at index {index}")));
        }
        let voter = inner
            .signer
            .as_ref()
            .map(|a| a.as_str().to_string())
            .unwrap_or_else(|| format!("0x{}", "0".repeat(40)));
        if !inner.votes.insert((voter, index)) {
            return Err(ContractError::Reverted {
                reason: ALREADY_VOTED_MARKER.to_string(),
            });
        }
        let stored = &mut inner.proposals[index as usize];
        if support {
            stored.upvotes += 1;
        } else {
            stored.downvotes += 1;
        }
        Ok(Self::next_hash(&mut inner))
    }
}
