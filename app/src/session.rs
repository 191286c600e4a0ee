//! Session: owns the core components and reacts to wallet notifications.

use std::path::Path;
use std::sync::Arc;

use tokio::signal;
use tokio::sync::broadcast;

use megavote_chain::{HttpWalletBridge, RpcContract, WalletEvent, WalletProvider};
use megavote_types::{Address, ChainParams, ProposalId, TxHash, VoteType};

use crate::config::AppConfig;
use crate::connection::{ConnectionManager, ConnectionSnapshot, ReconnectFlag};
use crate::error::AppError;
use crate::store::ProposalStore;

/// One running instance of the client.
///
/// Owns the [`ConnectionManager`] and [`ProposalStore`], and is the only
/// consumer of the provider's event stream. Front ends go through the
/// session for everything; they never touch the components' state
/// directly.
pub struct Session<P: WalletProvider> {
    provider: Arc<P>,
    manager: ConnectionManager<P>,
    store: ProposalStore<P::Contract>,
}

impl Session<HttpWalletBridge> {
    /// Wire up a production session from configuration: wallet bridge for
    /// signing, public RPC endpoint for read-only access.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let contract_address = config.contract()?;
        let provider = HttpWalletBridge::new(&config.wallet_url)
            .map_err(|e| AppError::Config(e.to_string()))?;
        let fallback = RpcContract::new(&config.rpc_url, contract_address.clone())
            .map_err(|e| AppError::Config(e.to_string()))?;
        Ok(Self::new(
            Arc::new(provider),
            fallback,
            config.chain_params(),
            contract_address,
            &config.data_dir,
        ))
    }
}

impl<P: WalletProvider> Session<P> {
    pub fn new(
        provider: Arc<P>,
        fallback: P::Contract,
        params: ChainParams,
        contract_address: Address,
        data_dir: &Path,
    ) -> Self {
        let manager = ConnectionManager::new(
            Arc::clone(&provider),
            params,
            contract_address,
            ReconnectFlag::new(data_dir),
        );
        let store = ProposalStore::new(fallback);
        Self {
            provider,
            manager,
            store,
        }
    }

    /// Startup path: silent reconnect, then an initial refresh.
    ///
    /// The refresh must work with no wallet at all (read-only mode), so
    /// its failure is reported in the log rather than aborting startup.
    pub async fn init(&self) -> ConnectionSnapshot {
        let snapshot = self.manager.reconnect_if_previously_connected().await;
        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "initial proposal refresh failed");
        }
        snapshot
    }

    pub fn manager(&self) -> &ConnectionManager<P> {
        &self.manager
    }

    pub fn store(&self) -> &ProposalStore<P::Contract> {
        &self.store
    }

    pub async fn connect(&self) -> Result<ConnectionSnapshot, AppError> {
        self.manager.connect().await
    }

    pub async fn disconnect(&self) {
        self.manager.disconnect().await
    }

    pub async fn status(&self) -> ConnectionSnapshot {
        self.manager.snapshot().await
    }

    /// Refresh the proposal snapshot through the best available handle.
    pub async fn refresh(&self) -> Result<(), AppError> {
        let handle = self.manager.contract().await;
        self.store.refresh(handle.as_ref()).await
    }

    /// Submit a proposal, then refresh so it appears with its canonical
    /// chain-assigned index.
    pub async fn create_proposal(
        &self,
        title: &str,
        description: &str,
    ) -> Result<TxHash, AppError> {
        let handle = self.manager.contract().await;
        let hash = self
            .store
            .create_proposal(handle.as_ref(), title, description)
            .await?;
        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "refresh after proposal creation failed");
        }
        Ok(hash)
    }

    pub async fn cast_vote(&self, id: &ProposalId, vote: VoteType) -> Result<TxHash, AppError> {
        let handle = self.manager.contract().await;
        self.store.cast_vote(handle.as_ref(), id, vote).await
    }

    /// React to one wallet notification.
    pub async fn handle_event(&self, event: WalletEvent) {
        match event {
            WalletEvent::AccountsChanged { accounts } => {
                tracing::info!(count = accounts.len(), "wallet account list changed");
                match self.manager.handle_accounts_changed(accounts).await {
                    Ok(_) => {
                        if let Err(e) = self.refresh().await {
                            tracing::warn!(error = %e, "refresh after account change failed");
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "account change handling failed"),
                }
            }
            WalletEvent::ChainChanged { chain_id } => {
                tracing::info!(%chain_id, "wallet chain changed, reinitializing");
                self.reinitialize().await;
            }
        }
    }

    /// Full reset: a signer and contract handle built against a previous
    /// chain hold silently wrong assumptions, so nothing survives. The
    /// reconnect flag does survive, and the silent reconnect inside
    /// [`init`](Self::init) restores the binding when the wallet allows.
    pub async fn reinitialize(&self) {
        self.manager.reset().await;
        self.init().await;
    }

    /// Consume wallet notifications until `shutdown` fires or the stream
    /// ends.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        loop {
            tokio::select! {
                event = self.provider.next_event() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        tracing::info!("wallet event stream ended");
                        break;
                    }
                },
                _ = shutdown.recv() => break,
            }
        }
    }
}

// ── Shutdown ───────────────────────────────────────────────────────────

/// Coordinates shutdown of the event loop in watch mode.
///
/// Subscribers `select!` on their receiver alongside their main loop;
/// triggering shutdown (programmatically or via OS signal) notifies every
/// receiver.
pub struct ShutdownController {
    tx: broadcast::Sender<()>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Get a receiver that will be notified on shutdown.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger shutdown programmatically.
    pub fn shutdown(&self) {
        let _ = self.tx.send(());
    }

    /// Wait for SIGINT or SIGTERM, then trigger shutdown.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
            _ = terminate => tracing::info!("received SIGTERM, shutting down"),
        }

        self.shutdown();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn programmatic_shutdown_notifies_subscribers() {
        let controller = ShutdownController::new();
        let mut rx = controller.subscribe();
        controller.shutdown();
        assert!(rx.recv().await.is_ok());
    }

    #[tokio::test]
    async fn multiple_subscribers_all_notified() {
        let controller = ShutdownController::new();
        let mut rx1 = controller.subscribe();
        let mut rx2 = controller.subscribe();
        controller.shutdown();
        assert!(rx1.recv().await.is_ok());
        assert!(rx2.recv().await.is_ok());
    }
}
