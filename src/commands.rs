//! Command layer shared by the CLI and tests.
//!
//! Every command returns `Result<_, String>` so callers can show the message
//! as-is. State lives behind one `Mutex<AppStateManager>`; the lock is never
//! held across a contract call.

use std::sync::{Arc, Mutex, MutexGuard};

use donations_sdk::{
    ClauseId, ClauseStore, Completion, ConditionalClause, DonationInput, Event, EventId,
    EventStore, LocalContract, Release,
};

use serde::Serialize;

use crate::notifications::{Notification, Notifier};
use crate::poller::{refresh_once, DonationMetrics};
use crate::state::{AppState, AppStateManager};
use crate::views::{DonationForm, EventDetail, EventDetailView};
use crate::wallet::types::SessionSnapshot;
use crate::wallet::{WalletError, WalletId};
use crate::Network;

pub type SharedState = Arc<Mutex<AppStateManager>>;

fn lock(state: &SharedState) -> Result<MutexGuard<'_, AppStateManager>, String> {
    state.lock().map_err(|_| "state lock failed".to_string())
}

fn settled(completion: Completion) -> Result<(), String> {
    match completion {
        Completion::Failed(e) => Err(e),
        Completion::Applied | Completion::Superseded => Ok(()),
    }
}

fn contract_for_oracle(state: &SharedState) -> Result<(Arc<LocalContract>, String), String> {
    let mgr = lock(state)?;
    let address = mgr
        .active_address()
        .ok_or_else(|| WalletError::NotConnected.to_string())?;
    let contract = mgr
        .contract()
        .ok_or_else(|| "No contract available on this network".to_string())?;
    Ok((contract, address))
}

// ============================================================================
// App state
// ============================================================================

pub fn get_app_state(state: &SharedState) -> Result<AppState, String> {
    let mgr = lock(state)?;
    if !mgr.is_initialized() {
        return Err("Not initialized - select a network first".to_string());
    }
    Ok(mgr.snapshot())
}

pub fn set_network(state: &SharedState, network: Network) -> Result<AppState, String> {
    let mut mgr = lock(state)?;
    Ok(mgr.set_network(network))
}

/// Remove one notification from the queue and return what is left.
pub fn dismiss_notification(state: &SharedState, id: u64) -> Result<Vec<Notification>, String> {
    let mut mgr = lock(state)?;
    if !mgr.update_notifications(|n| n.dismiss(id)) {
        return Err(format!("No notification with id {id}"));
    }
    mgr.bump_revision();
    Ok(mgr.snapshot().notifications)
}

// ============================================================================
// Events & donations (read side)
// ============================================================================

pub async fn list_events(state: &SharedState) -> Result<Vec<(EventId, Event)>, String> {
    let store = EventStore::new(lock(state)?.client());
    settled(store.fetch_events().await.map_err(|e| e.to_string())?)?;
    Ok(store.events())
}

pub async fn list_pending_events(state: &SharedState) -> Result<Vec<(EventId, Event)>, String> {
    let store = EventStore::new(lock(state)?.client());
    settled(store.fetch_events().await.map_err(|e| e.to_string())?)?;
    Ok(store.pending_events())
}

pub async fn list_clauses(
    state: &SharedState,
) -> Result<Vec<(ClauseId, ConditionalClause)>, String> {
    let store = ClauseStore::new(lock(state)?.client());
    settled(store.fetch_clauses().await.map_err(|e| e.to_string())?)?;
    Ok(store.clauses())
}

/// Load one event page. Contract errors are reported inside the detail,
/// not as `Err`.
pub async fn get_event_detail(state: &SharedState, event_id: &str) -> Result<EventDetail, String> {
    let mut view = EventDetailView::new(lock(state)?.client(), event_id);
    view.load().await;
    Ok(view.detail())
}

pub async fn metrics(state: &SharedState) -> Result<DonationMetrics, String> {
    let client = lock(state)?.client();
    let events = EventStore::new(client.clone());
    let clauses = ClauseStore::new(client);
    refresh_once(&events, &clauses).await;
    if let Some(e) = events.error().or_else(|| clauses.error()) {
        return Err(e);
    }
    Ok(DonationMetrics::from_stores(&events, &clauses))
}

// ============================================================================
// Donation creation
// ============================================================================

/// A created donation and the figures re-fetched right after it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationReceipt {
    pub clause_id: ClauseId,
    pub message: String,
    pub metrics: DonationMetrics,
}

/// Submit a conditional donation from the connected wallet.
///
/// An empty `recipient_no` defaults to the active address. The outcome is
/// also pushed to the app's notification queue.
pub async fn submit_donation(
    state: &SharedState,
    input: DonationInput,
) -> Result<DonationReceipt, String> {
    let (client, address) = {
        let mgr = lock(state)?;
        (mgr.client(), mgr.active_address())
    };

    let mut form = DonationForm::new(address.as_deref());
    form.input = input;
    form.focus_recipient_no();

    let events = EventStore::new(client.clone());
    let clauses = ClauseStore::new(client.clone());
    let mut notifier = Notifier::new();
    let created = form
        .submit_and_refresh(client.as_ref(), &events, &clauses, &mut notifier)
        .await;
    let outcome = notifier.visible().last().map(|n| n.message.clone());

    let mut mgr = lock(state)?;
    mgr.update_notifications(|n| n.extend(notifier.drain()));
    mgr.bump_revision();

    match (created, outcome) {
        (Some(clause_id), message) => Ok(DonationReceipt {
            clause_id,
            message: message.unwrap_or_else(|| donations_sdk::success_message(clause_id)),
            metrics: DonationMetrics::from_stores(&events, &clauses),
        }),
        (None, Some(message)) => Err(message),
        (None, None) => Err("Donation was not submitted".to_string()),
    }
}

// ============================================================================
// Wallet
// ============================================================================

pub fn connect_wallet(state: &SharedState, wallet: &str) -> Result<SessionSnapshot, String> {
    let id: WalletId = wallet.parse()?;
    let mut mgr = lock(state)?;
    let result = mgr
        .session_mut()
        .ok_or("Not initialized - select a network first")?
        .connect(id)
        .map(|_| ());
    finish_wallet_change(&mut mgr, result)
}

pub fn select_account(state: &SharedState, address: &str) -> Result<SessionSnapshot, String> {
    let mut mgr = lock(state)?;
    let result = mgr
        .session_mut()
        .ok_or("Not initialized - select a network first")?
        .set_active_account(address);
    finish_wallet_change(&mut mgr, result)
}

pub fn disconnect_wallet(state: &SharedState) -> Result<SessionSnapshot, String> {
    let mut mgr = lock(state)?;
    let result = mgr
        .session_mut()
        .ok_or("Not initialized - select a network first")?
        .disconnect();
    finish_wallet_change(&mut mgr, result)
}

fn finish_wallet_change(
    mgr: &mut AppStateManager,
    result: Result<(), WalletError>,
) -> Result<SessionSnapshot, String> {
    if let Err(e) = result {
        let message = e.to_string();
        mgr.update_notifications(|n| n.error(message.clone()));
        return Err(message);
    }
    mgr.bump_revision();
    Ok(mgr.snapshot().wallet)
}

// ============================================================================
// Oracle operations (localnet contract)
// ============================================================================

pub async fn create_event(state: &SharedState, description: String) -> Result<EventId, String> {
    let (contract, oracle) = contract_for_oracle(state)?;
    if description.trim().is_empty() {
        return Err("Event description is required".to_string());
    }
    let id = tokio::task::spawn_blocking(move || contract.create_event(&oracle, description.trim()))
        .await
        .map_err(|e| format!("create_event task failed: {e}"))?
        .map_err(|e| e.to_string())?;
    lock(state)?.bump_revision();
    Ok(id)
}

pub async fn resolve_event(
    state: &SharedState,
    event_id: EventId,
    resolution: bool,
) -> Result<(), String> {
    let (contract, oracle) = contract_for_oracle(state)?;
    tokio::task::spawn_blocking(move || contract.resolve_event(&oracle, event_id, resolution))
        .await
        .map_err(|e| format!("resolve_event task failed: {e}"))?
        .map_err(|e| e.to_string())?;
    lock(state)?.bump_revision();
    Ok(())
}

/// Payouts recorded by the contract, oldest first.
pub fn list_releases(state: &SharedState) -> Result<Vec<Release>, String> {
    let contract = lock(state)?
        .client()
        .ok_or_else(|| donations_sdk::Error::ClientUnavailable.to_string())?;
    Ok(contract.releases())
}

pub async fn release_clause(state: &SharedState, clause_id: ClauseId) -> Result<Release, String> {
    let (contract, _) = contract_for_oracle(state)?;
    let release = tokio::task::spawn_blocking(move || contract.release_clause(clause_id))
        .await
        .map_err(|e| format!("release_clause task failed: {e}"))?
        .map_err(|e| e.to_string())?;
    lock(state)?.bump_revision();
    Ok(release)
}
