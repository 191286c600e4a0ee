//! Integration tests exercising the full client pipeline:
//! startup → reconnect → refresh → create/vote → wallet event reactions.
//!
//! These tests wire together components that are normally only connected
//! inside a front end, verifying the session works end-to-end rather than
//! just in isolation.

use std::sync::Arc;
use std::time::Duration;

use megavote_app::{AppError, ReconnectFlag, Session, ShutdownController};
use megavote_chain::WalletEvent;
use megavote_nullables::{NullContract, NullWalletProvider, RequestBehavior};
use megavote_types::{Address, ChainId, ChainParams, ProposalId, VoteType};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn user() -> Address {
    Address::new("0x04E70e1f2f35334aB4b691D85ff8a32Ab5b1571e")
}

fn contract_address() -> Address {
    Address::new("0x59b670e9fA9D0A427751Af201D676719a970857b")
}

fn seed(contract: &NullContract, count: usize) {
    for i in 0..count {
        contract.seed_proposal(
            &format!("Proposal {i}"),
            &format!("Description {i}"),
            &user(),
            0,
            0,
        );
    }
}

/// Build a session whose read-only fallback and signer-backed handle hit
/// the same in-memory contract, like both endpoints of one deployment.
fn session_with(
    provider: &NullWalletProvider,
    data_dir: &std::path::Path,
) -> Session<NullWalletProvider> {
    Session::new(
        Arc::new(provider.clone()),
        provider.contract(),
        ChainParams::mega_testnet(),
        contract_address(),
        data_dir,
    )
}

// ---------------------------------------------------------------------------
// 1. Read-only startup
// ---------------------------------------------------------------------------

#[tokio::test]
async fn init_refreshes_without_any_wallet() {
    let dir = tempfile::tempdir().unwrap();
    let provider = NullWalletProvider::new();
    provider.set_request_behavior(RequestBehavior::Unavailable);
    seed(&provider.contract(), 2);

    let session = session_with(&provider, dir.path());
    let snapshot = session.init().await;

    assert!(!snapshot.is_connected());
    assert_eq!(session.store().proposals().await.len(), 2);
}

#[tokio::test]
async fn writes_require_connection_and_hint_at_connect() {
    let dir = tempfile::tempdir().unwrap();
    let provider = NullWalletProvider::new();
    seed(&provider.contract(), 1);
    let session = session_with(&provider, dir.path());
    session.init().await;

    let err = session
        .create_proposal("A title", "A description")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotConnected));

    let err = session
        .cast_vote(&ProposalId::from_index(0), VoteType::Upvote)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotConnected));
}

// ---------------------------------------------------------------------------
// 2. Connected lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn connect_create_vote_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let provider = NullWalletProvider::with_account(user());
    seed(&provider.contract(), 1);
    let session = session_with(&provider, dir.path());
    session.init().await;

    session.connect().await.unwrap();
    session
        .create_proposal("Launch a token", "Yes or no")
        .await
        .unwrap();

    // create_proposal refreshes internally; the new entry leads.
    let proposals = session.store().proposals().await;
    assert_eq!(proposals.len(), 2);
    assert_eq!(proposals[0].id, ProposalId::from_index(1));
    assert_eq!(proposals[0].title, "Launch a token");
    assert_eq!(proposals[0].proposer, user());

    let id = proposals[0].id;
    session.cast_vote(&id, VoteType::Upvote).await.unwrap();
    let voted = session.store().get(&id).await.unwrap();
    assert_eq!((voted.upvotes, voted.downvotes), (1, 0));

    // The optimistic count survives the next authoritative refresh,
    // because the contract agrees.
    session.refresh().await.unwrap();
    let after = session.store().get(&id).await.unwrap();
    assert_eq!((after.upvotes, after.downvotes), (1, 0));
}

#[tokio::test]
async fn duplicate_vote_is_terminal_for_that_proposal() {
    let dir = tempfile::tempdir().unwrap();
    let provider = NullWalletProvider::with_account(user());
    seed(&provider.contract(), 1);
    let session = session_with(&provider, dir.path());
    session.init().await;
    session.connect().await.unwrap();

    let id = ProposalId::from_index(0);
    session.cast_vote(&id, VoteType::Downvote).await.unwrap();
    let err = session.cast_vote(&id, VoteType::Downvote).await.unwrap_err();
    assert!(matches!(err, AppError::DuplicateVote));

    let proposal = session.store().get(&id).await.unwrap();
    assert_eq!((proposal.upvotes, proposal.downvotes), (0, 1));
}

#[tokio::test]
async fn disconnect_then_write_yields_not_connected() {
    let dir = tempfile::tempdir().unwrap();
    let provider = NullWalletProvider::with_account(user());
    seed(&provider.contract(), 1);
    let session = session_with(&provider, dir.path());
    session.init().await;
    session.connect().await.unwrap();

    session.disconnect().await;
    assert!(!session.status().await.is_connected());

    let err = session
        .cast_vote(&ProposalId::from_index(0), VoteType::Upvote)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotConnected));
}

#[tokio::test]
async fn reconnect_flag_survives_process_restart() {
    let dir = tempfile::tempdir().unwrap();
    let provider = NullWalletProvider::with_account(user());
    seed(&provider.contract(), 1);

    // First "process": connect explicitly.
    {
        let session = session_with(&provider, dir.path());
        session.init().await;
        session.connect().await.unwrap();
    }
    assert!(ReconnectFlag::new(dir.path()).is_set());

    // Second "process": init alone restores the binding silently.
    let session = session_with(&provider, dir.path());
    let snapshot = session.init().await;
    assert_eq!(snapshot.address, Some(user()));
    session
        .cast_vote(&ProposalId::from_index(0), VoteType::Upvote)
        .await
        .unwrap();
}

// ---------------------------------------------------------------------------
// 3. Wallet event reactions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn revoked_accounts_event_disconnects() {
    let dir = tempfile::tempdir().unwrap();
    let provider = NullWalletProvider::with_account(user());
    seed(&provider.contract(), 1);
    let session = session_with(&provider, dir.path());
    session.init().await;
    session.connect().await.unwrap();

    session
        .handle_event(WalletEvent::AccountsChanged {
            accounts: Vec::new(),
        })
        .await;

    assert!(!session.status().await.is_connected());
    assert!(!ReconnectFlag::new(dir.path()).is_set());
}

#[tokio::test]
async fn account_switch_event_rebinds() {
    let dir = tempfile::tempdir().unwrap();
    let provider = NullWalletProvider::with_account(user());
    seed(&provider.contract(), 1);
    let session = session_with(&provider, dir.path());
    session.init().await;
    session.connect().await.unwrap();

    let replacement = Address::new("0xAb5801a7D398351b8bE11C439e05C5B3259aeC9B");
    provider.set_accounts(vec![replacement.clone()]);
    session
        .handle_event(WalletEvent::AccountsChanged {
            accounts: vec![replacement.clone()],
        })
        .await;

    assert_eq!(session.status().await.address, Some(replacement));
}

#[tokio::test]
async fn chain_change_event_forces_full_reinitialization() {
    let dir = tempfile::tempdir().unwrap();
    let provider = NullWalletProvider::with_account(user());
    seed(&provider.contract(), 1);
    let session = session_with(&provider, dir.path());
    session.init().await;
    session.connect().await.unwrap();

    // The wallet wanders to another chain and announces it.
    provider.set_chain_id(ChainId(1));
    session
        .handle_event(WalletEvent::ChainChanged {
            chain_id: ChainId(1),
        })
        .await;

    // Reinit reconnects silently (flag was kept) and the network check
    // drags the wallet back to the required chain.
    assert!(session.status().await.is_connected());
    assert_eq!(provider.current_chain_id(), ChainId(6342));
    assert_eq!(session.store().proposals().await.len(), 1);
}

// ---------------------------------------------------------------------------
// 4. Event loop
// ---------------------------------------------------------------------------

#[tokio::test]
async fn run_processes_scripted_events_then_stops_on_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let provider = NullWalletProvider::with_account(user());
    seed(&provider.contract(), 1);
    let session = Arc::new(session_with(&provider, dir.path()));
    session.init().await;
    session.connect().await.unwrap();

    provider.push_event(WalletEvent::AccountsChanged {
        accounts: Vec::new(),
    });

    let controller = ShutdownController::new();
    let rx = controller.subscribe();
    let runner = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.run(rx).await })
    };

    // Give the loop a moment to drain the scripted event.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!session.status().await.is_connected());

    controller.shutdown();
    tokio::time::timeout(Duration::from_secs(1), runner)
        .await
        .expect("run must stop on shutdown")
        .unwrap();
}
