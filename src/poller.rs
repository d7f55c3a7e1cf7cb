//! Periodic refresh of the event and clause caches.
//!
//! Each tick re-fetches both stores. Ticks are not de-duplicated: an
//! overlapping slow fetch is discarded by the stores' sequence check
//! when a newer one has already been issued.

use std::sync::Arc;
use std::time::Duration;

use donations_sdk::{
    ClauseId, ClauseStore, ConditionalClause, ContractClient, Event, EventId, EventStore,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Aggregate figures over the cached events and clauses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationMetrics {
    pub total_events: usize,
    pub pending_events: usize,
    pub resolved_events: usize,
    pub total_clauses: usize,
    pub executed_clauses: usize,
    /// Micro-units committed across all clauses.
    pub committed_amount: u64,
    /// Micro-units already paid out by executed clauses.
    pub released_amount: u64,
}

impl DonationMetrics {
    pub fn from_caches(
        events: &[(EventId, Event)],
        clauses: &[(ClauseId, ConditionalClause)],
    ) -> Self {
        let pending_events = events.iter().filter(|(_, e)| e.pending).count();
        let executed: Vec<_> = clauses.iter().filter(|(_, c)| c.executed).collect();
        Self {
            total_events: events.len(),
            pending_events,
            resolved_events: events.len() - pending_events,
            total_clauses: clauses.len(),
            executed_clauses: executed.len(),
            committed_amount: clauses
                .iter()
                .fold(0u64, |acc, (_, c)| acc.saturating_add(c.payout_amount)),
            released_amount: executed
                .iter()
                .fold(0u64, |acc, (_, c)| acc.saturating_add(c.payout_amount)),
        }
    }

    pub fn from_stores<C: ContractClient>(
        events: &EventStore<C>,
        clauses: &ClauseStore<C>,
    ) -> Self {
        Self::from_caches(&events.events(), &clauses.clauses())
    }
}

/// Refresh both stores once. Failures are recorded by the stores.
pub async fn refresh_once<C: ContractClient>(events: &EventStore<C>, clauses: &ClauseStore<C>) {
    let (e, c) = tokio::join!(events.fetch_events(), clauses.fetch_clauses());
    if let Err(e) = e {
        log::warn!("event refresh skipped: {e}");
    }
    if let Err(e) = c {
        log::warn!("clause refresh skipped: {e}");
    }
}

/// Spawn the refresh loop. The first tick fires immediately.
///
/// After every tick the current metrics are sent on `metrics_tx`, if given.
/// Abort the returned handle to stop polling.
pub fn spawn_refresh_poller<C: ContractClient>(
    events: Arc<EventStore<C>>,
    clauses: Arc<ClauseStore<C>>,
    interval: Duration,
    metrics_tx: Option<mpsc::UnboundedSender<DonationMetrics>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        log::info!("refresh poller started (every {}s)", interval.as_secs_f64());
        loop {
            ticker.tick().await;
            refresh_once(&events, &clauses).await;

            if let Some(tx) = &metrics_tx {
                let metrics = DonationMetrics::from_stores(&events, &clauses);
                if tx.send(metrics).is_err() {
                    log::debug!("metrics receiver dropped; poller continues");
                }
            }
        }
    })
}
