//! MegaVote CLI: wallet lifecycle and proposal voting from the terminal.

use clap::Parser;
use std::path::PathBuf;

use megavote_app::{AppConfig, AppError, Session, ShutdownController};
use megavote_types::{Proposal, ProposalId, VoteType};
use megavote_utils::{ellipsize, init_logging, LogFormat};

#[derive(Parser)]
#[command(name = "megavote", about = "Decentralized voting client for the MEGA network")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "MEGAVOTE_CONFIG")]
    config: Option<PathBuf>,

    /// Wallet bridge endpoint.
    #[arg(long, env = "MEGAVOTE_WALLET_URL")]
    wallet_url: Option<String>,

    /// Read-only RPC endpoint used when no wallet is connected.
    #[arg(long, env = "MEGAVOTE_RPC_URL")]
    rpc_url: Option<String>,

    /// Voting contract deployment address.
    #[arg(long, env = "MEGAVOTE_CONTRACT")]
    contract: Option<String>,

    /// Data directory for the reconnect marker.
    #[arg(long, env = "MEGAVOTE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, default_value = "info", env = "MEGAVOTE_LOG_LEVEL")]
    log_level: String,

    /// Log format: "human" or "json".
    #[arg(long, env = "MEGAVOTE_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Wallet connection lifecycle.
    Wallet {
        #[command(subcommand)]
        action: WalletAction,
    },
    /// Read and write governance proposals.
    Proposals {
        #[command(subcommand)]
        action: ProposalAction,
    },
    /// Follow wallet notifications until interrupted.
    Watch,
}

#[derive(clap::Subcommand)]
enum WalletAction {
    /// Prompt the wallet for account access and bind to the required network.
    Connect,
    /// Drop the connection and forget it across restarts.
    Disconnect,
    /// Show the current connection state.
    Status,
}

#[derive(clap::Subcommand)]
enum ProposalAction {
    /// List all proposals, newest first.
    List,
    /// Show one proposal in full.
    Show {
        /// Proposal id (`PIP-007`) or bare index (`7`).
        id: String,
    },
    /// Submit a new proposal.
    Create {
        /// Proposal title, a yes/no question (at most 100 characters).
        #[arg(long)]
        title: String,
        /// Short context to help members decide (at most 300 characters).
        #[arg(long)]
        description: String,
    },
    /// Cast a vote.
    Vote {
        /// Proposal id (`PIP-007`) or bare index (`7`).
        id: String,
        /// "up" or "down".
        vote: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli);
    init_logging(LogFormat::from_config(&config.log_format), &config.log_level);

    let session = Session::from_config(&config)?;

    match cli.command {
        Command::Wallet { action } => match action {
            WalletAction::Connect => {
                let snapshot = match session.connect().await {
                    Ok(snapshot) => snapshot,
                    Err(e) => return Err(connect_hint(e)),
                };
                println!(
                    "Connected: {} on {} (chain {})",
                    snapshot.address.expect("connected snapshot has an address"),
                    config.chain_name,
                    config.chain_id,
                );
            }
            WalletAction::Disconnect => {
                session.disconnect().await;
                println!("Disconnected.");
            }
            WalletAction::Status => {
                let snapshot = session.init().await;
                match snapshot.address {
                    Some(address) => println!(
                        "Connected: {address} (chain {})",
                        snapshot.chain_id.expect("connected snapshot has a chain"),
                    ),
                    None => println!("Not connected (read-only mode)."),
                }
            }
        },
        Command::Proposals { action } => match action {
            ProposalAction::List => {
                session.init().await;
                let proposals = session.store().proposals().await;
                if proposals.is_empty() {
                    println!("No proposals yet.");
                }
                for proposal in proposals {
                    print_row(&proposal);
                }
            }
            ProposalAction::Show { id } => {
                session.init().await;
                let id = parse_id(&id)?;
                match session.store().get(&id).await {
                    Some(proposal) => print_full(&proposal),
                    None => anyhow::bail!("no proposal {id}"),
                }
            }
            ProposalAction::Create { title, description } => {
                session.init().await;
                let hash = session
                    .create_proposal(&title, &description)
                    .await
                    .map_err(connect_hint)?;
                println!("Proposal created and live for voting.");
                println!("  {}", config.chain_params().tx_url(&hash));
            }
            ProposalAction::Vote { id, vote } => {
                session.init().await;
                let id = parse_id(&id)?;
                let vote: VoteType = vote.parse()?;
                let hash = session
                    .cast_vote(&id, vote)
                    .await
                    .map_err(connect_hint)?;
                println!("Your {vote} on {id} has been recorded on-chain.");
                println!("  {}", config.chain_params().tx_url(&hash));
            }
        },
        Command::Watch => {
            let snapshot = session.init().await;
            match &snapshot.address {
                Some(address) => tracing::info!(%address, "watching wallet events"),
                None => tracing::info!("watching wallet events (read-only)"),
            }
            let controller = ShutdownController::new();
            let rx = controller.subscribe();
            tokio::select! {
                _ = session.run(rx) => {}
                _ = controller.wait_for_signal() => {}
            }
        }
    }

    Ok(())
}

/// File config (when given) as the base, CLI flags and env vars on top.
fn load_config(cli: &Cli) -> AppConfig {
    // Logging is not up yet at this point, hence eprintln for the warning.
    let mut config = match &cli.config {
        Some(path) => match AppConfig::from_toml_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("warning: {e}, using defaults");
                AppConfig::default()
            }
        },
        None => AppConfig::default(),
    };

    if let Some(wallet_url) = &cli.wallet_url {
        config.wallet_url = wallet_url.clone();
    }
    if let Some(rpc_url) = &cli.rpc_url {
        config.rpc_url = rpc_url.clone();
    }
    if let Some(contract) = &cli.contract {
        config.contract_address = contract.clone();
    }
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(log_format) = &cli.log_format {
        config.log_format = log_format.clone();
    }
    config.log_level = cli.log_level.clone();
    config
}

/// Accept canonical ids and bare indices from the command line.
fn parse_id(raw: &str) -> anyhow::Result<ProposalId> {
    if let Ok(index) = raw.parse::<u64>() {
        return Ok(ProposalId::from_index(index));
    }
    Ok(ProposalId::parse(raw)?)
}

/// Attach a next-step hint to connection-shaped failures.
fn connect_hint(e: AppError) -> anyhow::Error {
    match e {
        AppError::NotConnected => {
            anyhow::anyhow!("{e}; run `megavote wallet connect` first")
        }
        AppError::WalletNotFound => {
            anyhow::anyhow!("{e}; reads still work via `megavote proposals list`")
        }
        other => other.into(),
    }
}

fn print_row(proposal: &Proposal) {
    println!(
        "{}  +{:<5} -{:<5} {}  (by {})",
        proposal.id,
        proposal.upvotes,
        proposal.downvotes,
        ellipsize(&proposal.title, 60),
        proposal.proposer.short(),
    );
}

fn print_full(proposal: &Proposal) {
    println!("{}: {}", proposal.id, proposal.title);
    println!("  proposer:  {}", proposal.proposer);
    println!("  upvotes:   {}", proposal.upvotes);
    println!("  downvotes: {}", proposal.downvotes);
    println!();
    println!("  {}", proposal.description);
}
