//! Nullable wallet: programmable accounts, chain state, and a scripted
//! event inbox.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use megavote_chain::{ProviderError, WalletEvent, WalletProvider};
use megavote_types::{Address, ChainId, ChainParams};

use crate::contract::NullContract;

/// How account requests behave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestBehavior {
    /// Grant access to the configured accounts.
    Grant,
    /// The user declines the prompt.
    Reject,
    /// No wallet is present at all.
    Unavailable,
}

/// How chain-switch requests behave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwitchBehavior {
    /// Switch to whatever chain is requested.
    Succeed,
    /// The user declines the switch prompt.
    Reject,
    /// The wallet only switches to chains registered via `add_chain`.
    UnknownChain,
}

struct Inner {
    accounts: Vec<Address>,
    chain_id: ChainId,
    request_behavior: RequestBehavior,
    switch_behavior: SwitchBehavior,
    known_chains: Vec<ChainId>,
    add_chain_fails: bool,
    events: VecDeque<WalletEvent>,
    calls: Vec<String>,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            chain_id: ChainId(6342),
            request_behavior: RequestBehavior::Grant,
            switch_behavior: SwitchBehavior::Succeed,
            known_chains: Vec::new(),
            add_chain_fails: false,
            events: VecDeque::new(),
            calls: Vec::new(),
        }
    }
}

/// A test wallet that grants whatever it was configured with and records
/// every call.
///
/// Defaults: one empty account list, already on chain 6342, all requests
/// granted. [`bind_contract`](WalletProvider::bind_contract) hands out a
/// shared [`NullContract`] and stamps it with the primary account as the
/// signing identity.
#[derive(Clone, Default)]
pub struct NullWalletProvider {
    inner: Arc<Mutex<Inner>>,
    contract: NullContract,
}

impl NullWalletProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider with one granted account, already on the required chain.
    pub fn with_account(account: Address) -> Self {
        let provider = Self::new();
        provider.set_accounts(vec![account]);
        provider
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.inner.lock().unwrap().accounts = accounts;
    }

    pub fn set_chain_id(&self, chain_id: ChainId) {
        self.inner.lock().unwrap().chain_id = chain_id;
    }

    pub fn current_chain_id(&self) -> ChainId {
        self.inner.lock().unwrap().chain_id
    }

    pub fn set_request_behavior(&self, behavior: RequestBehavior) {
        self.inner.lock().unwrap().request_behavior = behavior;
    }

    pub fn set_switch_behavior(&self, behavior: SwitchBehavior) {
        self.inner.lock().unwrap().switch_behavior = behavior;
    }

    /// Make `add_chain` fail as if the user declined the registration.
    pub fn fail_add_chain(&self) {
        self.inner.lock().unwrap().add_chain_fails = true;
    }

    /// Enqueue an event for [`WalletProvider::next_event`] to deliver.
    pub fn push_event(&self, event: WalletEvent) {
        self.inner.lock().unwrap().events.push_back(event);
    }

    /// The shared contract handle, for seeding and assertions.
    pub fn contract(&self) -> NullContract {
        self.contract.clone()
    }

    /// All calls made so far, in order (for assertions).
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    fn check_available(inner: &Inner) -> Result<(), ProviderError> {
        if inner.request_behavior == RequestBehavior::Unavailable {
            return Err(ProviderError::Unavailable);
        }
        Ok(())
    }
}

impl WalletProvider for NullWalletProvider {
    type Contract = NullContract;

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("request_accounts".to_string());
        match inner.request_behavior {
            RequestBehavior::Unavailable => Err(ProviderError::Unavailable),
            RequestBehavior::Reject => Err(ProviderError::Rejected),
            RequestBehavior::Grant => Ok(inner.accounts.clone()),
        }
    }

    async fn authorized_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("authorized_accounts".to_string());
        Self::check_available(&inner)?;
        // No prompt here, so a rejecting user still has their granted list.
        Ok(inner.accounts.clone())
    }

    async fn chain_id(&self) -> Result<ChainId, ProviderError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push("chain_id".to_string());
        Self::check_available(&inner)?;
        Ok(inner.chain_id)
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ProviderError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(format!("switch_chain:{chain_id}"));
        Self::check_available(&inner)?;
        match inner.switch_behavior {
            SwitchBehavior::Succeed => {
                inner.chain_id = chain_id;
                Ok(())
            }
            SwitchBehavior::Reject => Err(ProviderError::Rejected),
            SwitchBehavior::UnknownChain => {
                if inner.known_chains.contains(&chain_id) {
                    inner.chain_id = chain_id;
                    Ok(())
                } else {
                    Err(ProviderError::UnknownChain(chain_id))
                }
            }
        }
    }

    async fn add_chain(&self, params: &ChainParams) -> Result<(), ProviderError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .calls
            .push(format!("add_chain:{}", params.chain_id));
        Self::check_available(&inner)?;
        if inner.add_chain_fails {
            return Err(ProviderError::Rejected);
        }
        inner.known_chains.push(params.chain_id);
        Ok(())
    }

    async fn next_event(&self) -> Option<WalletEvent> {
        {
            let mut inner = self.inner.lock().unwrap();
            if let Some(event) = inner.events.pop_front() {
                return Some(event);
            }
        }
        // No scripted events left: stay pending, like a quiet wallet.
        std::future::pending().await
    }

    fn bind_contract(&self, _contract: &Address) -> NullContract {
        let inner = self.inner.lock().unwrap();
        if let Some(account) = inner.accounts.first() {
            self.contract.set_signer(account.clone());
        }
        self.contract.clone()
    }
}
