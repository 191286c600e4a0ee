//! Wallet connection lifecycle.
//!
//! [`ConnectionManager`] owns the binding between the application and one
//! signing identity on the single required network. The binding is all or
//! nothing: consumers either see a complete connection (address, chain,
//! signer-backed contract handle) or none at all; no partially populated
//! state is ever observable, and every failure path rolls back to empty.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;

use megavote_chain::{ProviderError, WalletProvider};
use megavote_types::{Address, ChainId, ChainParams};

use crate::error::AppError;

// ── Reconnect flag ─────────────────────────────────────────────────────

/// Durable "was previously connected" marker.
///
/// A zero-length file in the data directory. It only gates the silent
/// reconnect attempt at startup and is never a source of truth for chain
/// data.
#[derive(Clone, Debug)]
pub struct ReconnectFlag {
    path: PathBuf,
}

impl ReconnectFlag {
    pub const FILE_NAME: &'static str = "wallet_connected";

    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(Self::FILE_NAME),
        }
    }

    pub fn is_set(&self) -> bool {
        self.path.exists()
    }

    pub fn set(&self) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Config(e.to_string()))?;
        }
        std::fs::write(&self.path, b"").map_err(|e| AppError::Config(e.to_string()))
    }

    /// Removal failures are ignored: a stale marker only costs one extra
    /// silent reconnect attempt at the next startup.
    pub fn clear(&self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

// ── Connection state ───────────────────────────────────────────────────

/// A fully established wallet binding.
struct Connection<C> {
    address: Address,
    chain_id: ChainId,
    contract: C,
}

/// Read-only view of the current connection state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionSnapshot {
    pub address: Option<Address>,
    pub chain_id: Option<ChainId>,
}

impl ConnectionSnapshot {
    pub fn disconnected() -> Self {
        Self {
            address: None,
            chain_id: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }
}

// ── ConnectionManager ──────────────────────────────────────────────────

/// Owns the wallet/chain binding lifecycle.
pub struct ConnectionManager<P: WalletProvider> {
    provider: Arc<P>,
    params: ChainParams,
    contract_address: Address,
    flag: ReconnectFlag,
    state: RwLock<Option<Connection<P::Contract>>>,
}

impl<P: WalletProvider> ConnectionManager<P> {
    pub fn new(
        provider: Arc<P>,
        params: ChainParams,
        contract_address: Address,
        flag: ReconnectFlag,
    ) -> Self {
        Self {
            provider,
            params,
            contract_address,
            flag,
            state: RwLock::new(None),
        }
    }

    /// Parameters of the required network.
    pub fn chain_params(&self) -> &ChainParams {
        &self.params
    }

    /// Prompt the user for account access and establish the binding.
    ///
    /// Runs the network check (and switch/registration, if needed) before
    /// any contract handle exists. On success the reconnect flag is set so
    /// the next startup reconnects silently. On failure the state is left
    /// empty; a missing wallet changes nothing at all.
    pub async fn connect(&self) -> Result<ConnectionSnapshot, AppError> {
        match self.try_connect().await {
            Ok(snapshot) => Ok(snapshot),
            Err(AppError::WalletNotFound) => Err(AppError::WalletNotFound),
            Err(e) => {
                self.clear_state().await;
                self.flag.clear();
                Err(e)
            }
        }
    }

    async fn try_connect(&self) -> Result<ConnectionSnapshot, AppError> {
        let accounts = self
            .provider
            .request_accounts()
            .await
            .map_err(handshake_error)?;
        let address = accounts
            .into_iter()
            .next()
            .ok_or(AppError::ConnectionRejected)?;
        self.ensure_required_network().await?;
        self.install(address).await
    }

    /// Tear the binding down and forget it across restarts.
    pub async fn disconnect(&self) {
        self.clear_state().await;
        self.flag.clear();
    }

    /// Drop the current binding without touching the reconnect flag.
    ///
    /// Used when the environment invalidates the binding (the wallet moved
    /// to another chain) and a silent reconnect follows immediately.
    pub async fn reset(&self) {
        self.clear_state().await;
    }

    /// Startup-only silent reconnect.
    ///
    /// A no-op when the reconnect flag is unset or no wallet is present.
    /// Otherwise re-derives the binding from the wallet's already
    /// authorized accounts, with no user prompt; a wallet that reports
    /// zero authorized accounts clears the flag. Failures are swallowed
    /// (logged) because nobody asked for this connection explicitly.
    pub async fn reconnect_if_previously_connected(&self) -> ConnectionSnapshot {
        if !self.flag.is_set() {
            return self.snapshot().await;
        }
        match self.try_reconnect().await {
            Ok(snapshot) => snapshot,
            Err(AppError::WalletNotFound) => {
                // Wallet not running right now; keep the flag for next time.
                self.snapshot().await
            }
            Err(e) => {
                tracing::warn!(error = %e, "silent reconnect failed");
                self.clear_state().await;
                self.flag.clear();
                self.snapshot().await
            }
        }
    }

    async fn try_reconnect(&self) -> Result<ConnectionSnapshot, AppError> {
        let accounts = self
            .provider
            .authorized_accounts()
            .await
            .map_err(handshake_error)?;
        let Some(address) = accounts.into_iter().next() else {
            self.flag.clear();
            return Ok(self.snapshot().await);
        };
        self.ensure_required_network().await?;
        self.install(address).await
    }

    /// Bring the wallet onto the required network if it is elsewhere.
    ///
    /// A wallet that does not know the network gets a registration request
    /// with the full [`ChainParams`], then one switch retry. Failure here
    /// never tears down an existing valid binding; callers in the middle
    /// of a handshake handle their own rollback.
    pub async fn ensure_required_network(&self) -> Result<(), AppError> {
        let required = self.params.chain_id;
        let current = self
            .provider
            .chain_id()
            .await
            .map_err(|e| AppError::NetworkSwitchFailed(e.to_string()))?;
        if current == required {
            return Ok(());
        }

        tracing::info!(%current, %required, "switching wallet network");
        match self.provider.switch_chain(required).await {
            Ok(()) => {}
            Err(ProviderError::UnknownChain(_)) => {
                self.provider
                    .add_chain(&self.params)
                    .await
                    .map_err(|e| AppError::NetworkSwitchFailed(e.to_string()))?;
                self.provider
                    .switch_chain(required)
                    .await
                    .map_err(|e| AppError::NetworkSwitchFailed(e.to_string()))?;
            }
            Err(e) => return Err(AppError::NetworkSwitchFailed(e.to_string())),
        }

        // Trust but verify: some wallets acknowledge a switch they then
        // fail to perform.
        let now = self
            .provider
            .chain_id()
            .await
            .map_err(|e| AppError::NetworkSwitchFailed(e.to_string()))?;
        if now != required {
            return Err(AppError::NetworkSwitchFailed(format!(
                "wallet still on chain {now}"
            )));
        }
        Ok(())
    }

    /// React to the wallet's account-list notification.
    ///
    /// An empty list is a revocation and tears the binding down; anything
    /// else re-derives the binding for the new primary account, with the
    /// same network check a fresh connect runs.
    pub async fn handle_accounts_changed(
        &self,
        accounts: Vec<Address>,
    ) -> Result<ConnectionSnapshot, AppError> {
        let Some(address) = accounts.into_iter().next() else {
            self.disconnect().await;
            return Ok(ConnectionSnapshot::disconnected());
        };
        match self.rederive(address).await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                self.clear_state().await;
                self.flag.clear();
                Err(e)
            }
        }
    }

    async fn rederive(&self, address: Address) -> Result<ConnectionSnapshot, AppError> {
        self.ensure_required_network().await?;
        self.install(address).await
    }

    /// Build the complete binding off to the side, then swap it in whole.
    async fn install(&self, address: Address) -> Result<ConnectionSnapshot, AppError> {
        let contract = self.provider.bind_contract(&self.contract_address);
        let connection = Connection {
            address: address.clone(),
            chain_id: self.params.chain_id,
            contract,
        };
        *self.state.write().await = Some(connection);

        if let Err(e) = self.flag.set() {
            tracing::warn!(error = %e, "could not persist reconnect marker");
        }
        tracing::info!(address = %address.short(), "wallet connected");
        Ok(self.snapshot().await)
    }

    async fn clear_state(&self) {
        *self.state.write().await = None;
    }

    /// Current state as an owned snapshot.
    pub async fn snapshot(&self) -> ConnectionSnapshot {
        match &*self.state.read().await {
            Some(connection) => ConnectionSnapshot {
                address: Some(connection.address.clone()),
                chain_id: Some(connection.chain_id),
            },
            None => ConnectionSnapshot::disconnected(),
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.state.read().await.is_some()
    }

    /// The signer-backed contract handle, when connected.
    pub async fn contract(&self) -> Option<P::Contract> {
        self.state
            .read()
            .await
            .as_ref()
            .map(|connection| connection.contract.clone())
    }
}

/// Map handshake-stage provider errors into the application taxonomy.
///
/// Anything that is not "no wallet" collapses to a rejected handshake:
/// the user-facing recovery (retry the connect) is the same.
fn handshake_error(e: ProviderError) -> AppError {
    match e {
        ProviderError::Unavailable => AppError::WalletNotFound,
        ProviderError::Rejected => AppError::ConnectionRejected,
        other => {
            tracing::warn!(error = %other, "wallet handshake failed");
            AppError::ConnectionRejected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use megavote_nullables::{NullWalletProvider, RequestBehavior, SwitchBehavior};

    fn test_address() -> Address {
        Address::new("0x04E70e1f2f35334aB4b691D85ff8a32Ab5b1571e")
    }

    fn contract_address() -> Address {
        Address::new("0x59b670e9fA9D0A427751Af201D676719a970857b")
    }

    fn manager_with(
        provider: &NullWalletProvider,
        data_dir: &Path,
    ) -> ConnectionManager<NullWalletProvider> {
        ConnectionManager::new(
            Arc::new(provider.clone()),
            ChainParams::mega_testnet(),
            contract_address(),
            ReconnectFlag::new(data_dir),
        )
    }

    #[test]
    fn reconnect_flag_set_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let flag = ReconnectFlag::new(dir.path());
        assert!(!flag.is_set());
        flag.set().unwrap();
        assert!(flag.is_set());
        flag.clear();
        assert!(!flag.is_set());
        // Clearing an unset flag is fine.
        flag.clear();
    }

    #[tokio::test]
    async fn connect_establishes_full_binding_and_sets_flag() {
        let dir = tempfile::tempdir().unwrap();
        let provider = NullWalletProvider::with_account(test_address());
        let manager = manager_with(&provider, dir.path());

        let snapshot = manager.connect().await.unwrap();
        assert_eq!(snapshot.address, Some(test_address()));
        assert_eq!(snapshot.chain_id, Some(ChainId(6342)));
        assert!(manager.contract().await.is_some());
        assert!(ReconnectFlag::new(dir.path()).is_set());
    }

    #[tokio::test]
    async fn connect_without_wallet_reports_not_found_and_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let provider = NullWalletProvider::new();
        provider.set_request_behavior(RequestBehavior::Unavailable);
        let manager = manager_with(&provider, dir.path());

        let err = manager.connect().await.unwrap_err();
        assert!(matches!(err, AppError::WalletNotFound));
        assert!(!manager.is_connected().await);
        assert!(!ReconnectFlag::new(dir.path()).is_set());
    }

    #[tokio::test]
    async fn rejected_connect_leaves_state_empty() {
        let dir = tempfile::tempdir().unwrap();
        let provider = NullWalletProvider::with_account(test_address());
        provider.set_request_behavior(RequestBehavior::Reject);
        let manager = manager_with(&provider, dir.path());

        let err = manager.connect().await.unwrap_err();
        assert!(matches!(err, AppError::ConnectionRejected));
        assert!(!manager.is_connected().await);
        assert!(manager.contract().await.is_none());
    }

    #[tokio::test]
    async fn connect_switches_wrong_network_before_binding() {
        let dir = tempfile::tempdir().unwrap();
        let provider = NullWalletProvider::with_account(test_address());
        provider.set_chain_id(ChainId(1));
        let manager = manager_with(&provider, dir.path());

        manager.connect().await.unwrap();
        assert_eq!(provider.current_chain_id(), ChainId(6342));
        assert!(provider
            .calls()
            .contains(&"switch_chain:6342".to_string()));
    }

    #[tokio::test]
    async fn unknown_chain_is_registered_then_switched() {
        let dir = tempfile::tempdir().unwrap();
        let provider = NullWalletProvider::with_account(test_address());
        provider.set_chain_id(ChainId(1));
        provider.set_switch_behavior(SwitchBehavior::UnknownChain);
        let manager = manager_with(&provider, dir.path());

        manager.connect().await.unwrap();
        let calls = provider.calls();
        let add_pos = calls.iter().position(|c| c == "add_chain:6342").unwrap();
        let retry_pos = calls
            .iter()
            .rposition(|c| c == "switch_chain:6342")
            .unwrap();
        assert!(add_pos < retry_pos, "registration must precede the retry");
        assert!(manager.is_connected().await);
    }

    #[tokio::test]
    async fn failed_switch_yields_no_contract_handle() {
        let dir = tempfile::tempdir().unwrap();
        let provider = NullWalletProvider::with_account(test_address());
        provider.set_chain_id(ChainId(1));
        provider.set_switch_behavior(SwitchBehavior::Reject);
        let manager = manager_with(&provider, dir.path());

        let err = manager.connect().await.unwrap_err();
        assert!(matches!(err, AppError::NetworkSwitchFailed(_)));
        assert!(manager.contract().await.is_none());
    }

    #[tokio::test]
    async fn failed_registration_yields_no_contract_handle() {
        let dir = tempfile::tempdir().unwrap();
        let provider = NullWalletProvider::with_account(test_address());
        provider.set_chain_id(ChainId(1));
        provider.set_switch_behavior(SwitchBehavior::UnknownChain);
        provider.fail_add_chain();
        let manager = manager_with(&provider, dir.path());

        let err = manager.connect().await.unwrap_err();
        assert!(matches!(err, AppError::NetworkSwitchFailed(_)));
        assert!(!manager.is_connected().await);
    }

    #[tokio::test]
    async fn ensure_required_network_keeps_existing_binding_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let provider = NullWalletProvider::with_account(test_address());
        let manager = manager_with(&provider, dir.path());
        manager.connect().await.unwrap();

        // The wallet wanders off and refuses to come back.
        provider.set_chain_id(ChainId(1));
        provider.set_switch_behavior(SwitchBehavior::Reject);
        let err = manager.ensure_required_network().await.unwrap_err();
        assert!(matches!(err, AppError::NetworkSwitchFailed(_)));
        assert!(manager.is_connected().await);
    }

    #[tokio::test]
    async fn disconnect_always_empties_state() {
        let dir = tempfile::tempdir().unwrap();
        let provider = NullWalletProvider::with_account(test_address());
        let manager = manager_with(&provider, dir.path());

        manager.connect().await.unwrap();
        manager.disconnect().await;
        assert_eq!(manager.snapshot().await, ConnectionSnapshot::disconnected());
        assert!(manager.contract().await.is_none());
        assert!(!ReconnectFlag::new(dir.path()).is_set());

        // Disconnecting while already disconnected is fine too.
        manager.disconnect().await;
        assert!(!manager.is_connected().await);
    }

    #[tokio::test]
    async fn reconnect_is_noop_without_flag() {
        let dir = tempfile::tempdir().unwrap();
        let provider = NullWalletProvider::with_account(test_address());
        let manager = manager_with(&provider, dir.path());

        let snapshot = manager.reconnect_if_previously_connected().await;
        assert!(!snapshot.is_connected());
        assert!(provider.calls().is_empty(), "must not touch the wallet");
    }

    #[tokio::test]
    async fn reconnect_restores_binding_silently() {
        let dir = tempfile::tempdir().unwrap();
        let provider = NullWalletProvider::with_account(test_address());
        let manager = manager_with(&provider, dir.path());
        ReconnectFlag::new(dir.path()).set().unwrap();

        let snapshot = manager.reconnect_if_previously_connected().await;
        assert!(snapshot.is_connected());
        let calls = provider.calls();
        assert!(calls.contains(&"authorized_accounts".to_string()));
        assert!(
            !calls.contains(&"request_accounts".to_string()),
            "silent reconnect must not prompt"
        );
    }

    #[tokio::test]
    async fn reconnect_with_no_authorized_accounts_clears_flag() {
        let dir = tempfile::tempdir().unwrap();
        let provider = NullWalletProvider::new(); // no accounts granted
        let manager = manager_with(&provider, dir.path());
        ReconnectFlag::new(dir.path()).set().unwrap();

        let snapshot = manager.reconnect_if_previously_connected().await;
        assert!(!snapshot.is_connected());
        assert!(!ReconnectFlag::new(dir.path()).is_set());
    }

    #[tokio::test]
    async fn reconnect_with_absent_wallet_keeps_flag() {
        let dir = tempfile::tempdir().unwrap();
        let provider = NullWalletProvider::new();
        provider.set_request_behavior(RequestBehavior::Unavailable);
        let manager = manager_with(&provider, dir.path());
        ReconnectFlag::new(dir.path()).set().unwrap();

        let snapshot = manager.reconnect_if_previously_connected().await;
        assert!(!snapshot.is_connected());
        assert!(ReconnectFlag::new(dir.path()).is_set());
    }

    #[tokio::test]
    async fn empty_account_list_event_disconnects() {
        let dir = tempfile::tempdir().unwrap();
        let provider = NullWalletProvider::with_account(test_address());
        let manager = manager_with(&provider, dir.path());
        manager.connect().await.unwrap();

        let snapshot = manager.handle_accounts_changed(Vec::new()).await.unwrap();
        assert!(!snapshot.is_connected());
        assert!(!ReconnectFlag::new(dir.path()).is_set());
    }

    #[tokio::test]
    async fn account_change_rebinds_to_new_primary() {
        let dir = tempfile::tempdir().unwrap();
        let provider = NullWalletProvider::with_account(test_address());
        let manager = manager_with(&provider, dir.path());
        manager.connect().await.unwrap();

        let replacement = Address::new("0xAb5801a7D398351b8bE11C439e05C5B3259aeC9B");
        provider.set_accounts(vec![replacement.clone()]);
        let snapshot = manager
            .handle_accounts_changed(vec![replacement.clone()])
            .await
            .unwrap();
        assert_eq!(snapshot.address, Some(replacement));
    }
}
