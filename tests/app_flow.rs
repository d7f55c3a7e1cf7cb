use std::sync::{Arc, Mutex};

use donations_sdk::{DonationInput, EventId};
use responsive_donations_lib::commands::{self, SharedState};
use responsive_donations_lib::notifications::Severity;
use responsive_donations_lib::{AppStateManager, Network};

const CHARITY: &str = "CHARITYQK2M5XH3ZP4WAVNB6LJ2YRT8DFSCEGUMH3K5N2QW7Y4XBMADDRE";

fn open_state(dir: &std::path::Path) -> SharedState {
    let mut mgr = AppStateManager::new(dir.to_path_buf());
    mgr.initialize(None);
    Arc::new(Mutex::new(mgr))
}

fn donation(event_id: EventId, amount: &str) -> DonationInput {
    DonationInput {
        event_id: event_id.to_string(),
        recipient_yes: CHARITY.to_string(),
        recipient_no: String::new(),
        amount: amount.to_string(),
    }
}

#[tokio::test]
async fn donation_lifecycle_on_localnet() {
    let dir = tempfile::tempdir().unwrap();
    let state = open_state(dir.path());
    let session = commands::connect_wallet(&state, "kmd").unwrap();
    let donor = session.active_address.unwrap();

    let flood = commands::create_event(&state, "Flood warning issued in Dhaka".into())
        .await
        .unwrap();
    let drought = commands::create_event(&state, "Drought declared".into())
        .await
        .unwrap();
    commands::resolve_event(&state, drought, false).await.unwrap();

    let pending = commands::list_pending_events(&state).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].0, flood);
    assert_eq!(commands::list_events(&state).await.unwrap().len(), 2);

    let receipt = commands::submit_donation(&state, donation(flood, "2.5"))
        .await
        .unwrap();
    assert!(receipt
        .message
        .starts_with("Conditional donation created (clause #"));
    assert_eq!(receipt.metrics.total_clauses, 1);
    assert_eq!(receipt.metrics.committed_amount, 2_500_000);
    assert_eq!(receipt.metrics.pending_events, 1);

    let detail = commands::get_event_detail(&state, &flood.to_string())
        .await
        .unwrap();
    assert_eq!(detail.donations.len(), 1);
    let (clause_id, clause) = &detail.donations[0];
    assert_eq!(clause.donor_address, donor);
    assert_eq!(clause.recipient_no, donor);
    assert_eq!(clause.payout_amount, 2_500_000);
    assert!(detail.lines.contains(&"  Amount: 2.5 ALGO".to_string()));

    let early = commands::release_clause(&state, *clause_id).await;
    assert!(early.is_err());

    commands::resolve_event(&state, flood, true).await.unwrap();
    let release = commands::release_clause(&state, *clause_id).await.unwrap();
    assert_eq!(release.payee, CHARITY);
    assert_eq!(release.amount, 2_500_000);
    let releases = commands::list_releases(&state).unwrap();
    assert_eq!(releases, vec![release.clone()]);

    let metrics = commands::metrics(&state).await.unwrap();
    assert_eq!(metrics.total_events, 2);
    assert_eq!(metrics.pending_events, 0);
    assert_eq!(metrics.executed_clauses, 1);
    assert_eq!(metrics.released_amount, 2_500_000);
}

#[tokio::test]
async fn rejected_donation_is_reported_once() {
    let dir = tempfile::tempdir().unwrap();
    let state = open_state(dir.path());
    commands::connect_wallet(&state, "kmd").unwrap();
    let event = commands::create_event(&state, "Settled already".into())
        .await
        .unwrap();
    commands::resolve_event(&state, event, true).await.unwrap();

    let err = commands::submit_donation(&state, donation(event, "1"))
        .await
        .unwrap_err();
    assert!(err.starts_with("Failed to create donation: "));

    let app = commands::get_app_state(&state).unwrap();
    assert_eq!(app.notifications.len(), 1);
    assert_eq!(app.notifications[0].severity, Severity::Error);
}

#[tokio::test]
async fn ledger_and_session_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let event = {
        let state = open_state(dir.path());
        commands::connect_wallet(&state, "kmd").unwrap();
        commands::create_event(&state, "Persisted".into())
            .await
            .unwrap()
    };

    let state = open_state(dir.path());
    let events = commands::list_events(&state).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, event);

    commands::disconnect_wallet(&state).unwrap();
    let state = open_state(dir.path());
    assert!(commands::list_events(&state).await.is_err());
}

#[tokio::test]
async fn remote_networks_have_no_contract_client() {
    let dir = tempfile::tempdir().unwrap();
    let state = open_state(dir.path());
    let app = commands::set_network(&state, Network::TestNet).unwrap();
    assert!(!app.network_status.contract_available);
    assert!(app
        .wallet
        .available_wallets
        .iter()
        .all(|w| !w.installed));

    let err = commands::connect_wallet(&state, "pera").unwrap_err();
    assert_eq!(err, "Failed to connect to Pera Wallet. Please try again.");
}
