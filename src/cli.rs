use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand, ValueEnum};
use donations_sdk::{format_amount, ClauseId, ClauseStore, DonationInput, EventId, EventStore};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::commands::{self, SharedState};
use crate::config::{AppConfig, DATA_DIR_ENV};
use crate::poller::spawn_refresh_poller;
use crate::state::AppStateManager;
use crate::views::donation_form::NO_PENDING_EVENTS;
use crate::views::event_option_label;
use crate::Network;

#[derive(Parser, Debug)]
#[command(
    name = "responsive-donations",
    version,
    about = "Conditional donations on oracle-resolved events"
)]
pub struct Cli {
    /// Network to use (localnet, testnet, mainnet). Falls back to
    /// DONATIONS_NETWORK, then the saved choice, then localnet.
    #[arg(long, global = true, value_name = "NETWORK")]
    pub network: Option<String>,

    /// Sets a custom data directory
    #[arg(long, global = true, value_name = "DATADIR", env = DATA_DIR_ENV)]
    pub data_dir: Option<PathBuf>,

    /// Overrides the node endpoint for the selected network
    #[arg(long, global = true, value_name = "URL")]
    pub node_url: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List events
    Events {
        /// Only events still awaiting resolution
        #[arg(long)]
        pending: bool,
    },
    /// Show one event and the donations attached to it
    Event { id: String },
    /// Create a conditional donation from the connected wallet
    Donate {
        #[arg(long, value_name = "EVENT_ID")]
        event: String,
        /// Recipient paid when the event resolves true
        #[arg(long, value_name = "ADDRESS")]
        recipient_yes: String,
        /// Recipient paid when the event resolves false (defaults to your address)
        #[arg(long, value_name = "ADDRESS")]
        recipient_no: Option<String>,
        /// Amount in whole units, e.g. 2.5
        #[arg(long)]
        amount: String,
    },
    /// Create an event with the connected wallet as its oracle
    CreateEvent { description: String },
    /// Resolve an event (oracle only)
    Resolve {
        id: EventId,
        #[arg(value_enum)]
        outcome: Outcome,
    },
    /// Pay out a clause of a resolved event
    Release { clause_id: ClauseId },
    /// List payouts made so far
    Releases,
    /// Connect a wallet (kmd on localnet)
    Connect { wallet: String },
    /// Switch the active account of the connected wallet
    UseAccount { address: String },
    /// Disconnect the active wallet
    Disconnect,
    /// Save the network choice for later runs
    SetNetwork {
        #[arg(value_name = "NETWORK")]
        name: String,
    },
    /// Show network, wallet and notification state
    Status,
    /// Remove a notification shown by `status`
    Dismiss { id: u64 },
    /// Aggregate figures over events and clauses
    Metrics,
    /// Poll the contract and print metrics until interrupted
    Watch {
        /// Seconds between refreshes
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Outcome {
    Yes,
    No,
}

impl Outcome {
    fn as_bool(self) -> bool {
        matches!(self, Outcome::Yes)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}

pub async fn execute(cli: Cli) -> Result<(), String> {
    let poll_secs = match &cli.command {
        Command::Watch { interval } => *interval,
        _ => None,
    };
    let config = AppConfig::from_sources(
        cli.network.as_deref(),
        cli.data_dir.clone(),
        cli.node_url.clone(),
        poll_secs,
    )
    .map_err(|e| e.to_string())?;
    log::debug!("data dir: {}", config.data_dir.display());

    let state: SharedState = Arc::new(Mutex::new(AppStateManager::from_config(&config)));
    let json = cli.json;

    match cli.command {
        Command::Events { pending } => {
            let events = if pending {
                commands::list_pending_events(&state).await?
            } else {
                commands::list_events(&state).await?
            };
            if json {
                return print_json(&events);
            }
            if events.is_empty() {
                println!("{}", if pending { NO_PENDING_EVENTS } else { "No events found." });
            }
            for (id, event) in &events {
                let status = match event.outcome() {
                    None => "pending",
                    Some(true) => "resolved: true",
                    Some(false) => "resolved: false",
                };
                println!("{} [{status}]", event_option_label(*id, event));
            }
        }
        Command::Event { id } => {
            let detail = commands::get_event_detail(&state, &id).await?;
            if json {
                return print_json(&detail);
            }
            for line in &detail.lines {
                println!("{line}");
            }
        }
        Command::Donate {
            event,
            recipient_yes,
            recipient_no,
            amount,
        } => {
            let input = DonationInput {
                event_id: event,
                recipient_yes,
                recipient_no: recipient_no.unwrap_or_default(),
                amount,
            };
            let receipt = commands::submit_donation(&state, input).await?;
            if json {
                return print_json(&receipt);
            }
            println!("{}", receipt.message);
            println!(
                "clauses: {}, committed: {} ALGO",
                receipt.metrics.total_clauses,
                format_amount(receipt.metrics.committed_amount)
            );
        }
        Command::CreateEvent { description } => {
            let id = commands::create_event(&state, description).await?;
            println!("Event created (event #{id})");
        }
        Command::Resolve { id, outcome } => {
            commands::resolve_event(&state, id, outcome.as_bool()).await?;
            println!("Event #{id} resolved: {}", outcome.as_bool());
        }
        Command::Release { clause_id } => {
            let release = commands::release_clause(&state, clause_id).await?;
            if json {
                return print_json(&release);
            }
            println!(
                "Released {} ALGO to {} (tx {})",
                format_amount(release.amount),
                release.payee,
                release.txid
            );
        }
        Command::Releases => {
            let releases = commands::list_releases(&state)?;
            if json {
                return print_json(&releases);
            }
            if releases.is_empty() {
                println!("No releases yet.");
            }
            for release in &releases {
                println!(
                    "clause #{}: {} ALGO to {} (tx {})",
                    release.clause_id,
                    format_amount(release.amount),
                    release.payee,
                    release.txid
                );
            }
        }
        Command::Connect { wallet } => {
            let session = commands::connect_wallet(&state, &wallet)?;
            if json {
                return print_json(&session);
            }
            println!(
                "Connected: {}",
                session.active_address.unwrap_or_default()
            );
        }
        Command::UseAccount { address } => {
            commands::select_account(&state, &address)?;
            println!("Active account: {address}");
        }
        Command::Disconnect => {
            commands::disconnect_wallet(&state)?;
            println!("Wallet disconnected");
        }
        Command::SetNetwork { name } => {
            let network: Network = name.parse()?;
            let app = commands::set_network(&state, network)?;
            println!("Network set to {}", app.network_status.network);
        }
        Command::Status => print_json(&commands::get_app_state(&state)?)?,
        Command::Dismiss { id } => {
            let left = commands::dismiss_notification(&state, id)?;
            println!("Notification {id} dismissed ({} left)", left.len());
        }
        Command::Metrics => {
            let metrics = commands::metrics(&state).await?;
            if json {
                return print_json(&metrics);
            }
            println!(
                "events: {} ({} pending, {} resolved)",
                metrics.total_events, metrics.pending_events, metrics.resolved_events
            );
            println!(
                "clauses: {} ({} executed)",
                metrics.total_clauses, metrics.executed_clauses
            );
            println!(
                "committed: {} ALGO, released: {} ALGO",
                format_amount(metrics.committed_amount),
                format_amount(metrics.released_amount)
            );
        }
        Command::Watch { .. } => watch(&state, config).await?,
    }
    Ok(())
}

async fn watch(state: &SharedState, config: AppConfig) -> Result<(), String> {
    let client = state
        .lock()
        .map_err(|_| "state lock failed".to_string())?
        .client();
    if client.is_none() {
        return Err(crate::wallet::WalletError::NotConnected.to_string());
    }

    let events = Arc::new(EventStore::new(client.clone()));
    let clauses = Arc::new(ClauseStore::new(client));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = spawn_refresh_poller(events, clauses, config.poll_interval, Some(tx));

    loop {
        tokio::select! {
            Some(metrics) = rx.recv() => {
                println!(
                    "{} | events {} ({} pending) | clauses {} ({} executed) | committed {} ALGO",
                    chrono::Local::now().format("%H:%M:%S"),
                    metrics.total_events,
                    metrics.pending_events,
                    metrics.total_clauses,
                    metrics.executed_clauses,
                    format_amount(metrics.committed_amount),
                );
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("stopping refresh poller");
                break;
            }
        }
    }
    handle.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_donate_with_global_flags() {
        let cli = Cli::try_parse_from([
            "responsive-donations",
            "donate",
            "--event",
            "3",
            "--recipient-yes",
            "CHARITY",
            "--amount",
            "2.5",
            "--network",
            "localnet",
        ])
        .unwrap();
        assert_eq!(cli.network.as_deref(), Some("localnet"));
        match cli.command {
            Command::Donate {
                event,
                recipient_no,
                ..
            } => {
                assert_eq!(event, "3");
                assert!(recipient_no.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn resolve_takes_yes_or_no() {
        let cli = Cli::try_parse_from(["responsive-donations", "resolve", "4", "no"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Resolve {
                id: EventId(4),
                outcome: Outcome::No
            }
        ));
        assert!(Cli::try_parse_from(["responsive-donations", "resolve", "4", "maybe"]).is_err());
    }

    #[test]
    fn dismiss_takes_numeric_id() {
        let cli = Cli::try_parse_from(["responsive-donations", "dismiss", "7"]).unwrap();
        assert!(matches!(cli.command, Command::Dismiss { id: 7 }));
        assert!(Cli::try_parse_from(["responsive-donations", "dismiss", "latest"]).is_err());
    }
}
