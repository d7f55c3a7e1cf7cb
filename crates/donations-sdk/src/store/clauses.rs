use std::sync::{Arc, Mutex};

use crate::client::{ContractClient, call_blocking};
use crate::error::{Error, Result};
use crate::fetch::{Completion, FetchState};
use crate::types::{ClauseId, ConditionalClause, EventId};

use super::lock;

/// In-memory, read-only cache of the contract's conditional clauses.
pub struct ClauseStore<C: ContractClient> {
    client: Option<Arc<C>>,
    list: Mutex<FetchState<Vec<(ClauseId, ConditionalClause)>>>,
}

impl<C: ContractClient> ClauseStore<C> {
    pub fn new(client: Option<Arc<C>>) -> Self {
        Self {
            client,
            list: Mutex::new(FetchState::default()),
        }
    }

    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    /// Replace the cached set with every clause in one pass.
    pub async fn fetch_clauses(&self) -> Result<Completion> {
        let client = self.client.as_ref().ok_or(Error::ClientUnavailable)?;
        let ticket = lock(&self.list)?.begin();

        let result = call_blocking(client, |c| c.list_clauses())
            .await
            .map_err(|e| e.to_string());
        let count = result.as_ref().map(Vec::len).unwrap_or(0);

        let completion = lock(&self.list)?.complete(ticket, result);
        match &completion {
            Completion::Applied => log::debug!("clauses refreshed: {count} cached"),
            Completion::Failed(e) => log::warn!("clause fetch failed: {e}"),
            Completion::Superseded => {}
        }
        Ok(completion)
    }

    pub fn clauses(&self) -> Vec<(ClauseId, ConditionalClause)> {
        self.list
            .lock()
            .map(|s| s.value().clone())
            .unwrap_or_default()
    }

    /// Cached clauses attached to `event_id`, in contract order.
    pub fn clauses_for_event(&self, event_id: EventId) -> Vec<(ClauseId, ConditionalClause)> {
        for_event(&self.clauses(), event_id)
    }

    /// Same as [`clauses_for_event`](Self::clauses_for_event) for a raw route
    /// parameter. The parameter must equal the id's decimal form exactly, so
    /// `"01"` or `" 1"` match nothing.
    pub fn clauses_for_event_str(&self, event_id: &str) -> Vec<(ClauseId, ConditionalClause)> {
        self.clauses()
            .into_iter()
            .filter(|(_, clause)| clause.event_id.to_string() == event_id)
            .collect()
    }

    pub fn loading(&self) -> bool {
        self.list.lock().map(|s| s.loading()).unwrap_or(false)
    }

    pub fn error(&self) -> Option<String> {
        self.list
            .lock()
            .ok()
            .and_then(|s| s.error().map(str::to_string))
    }
}

/// The clauses whose `event_id` matches, order preserved.
pub fn for_event(
    clauses: &[(ClauseId, ConditionalClause)],
    event_id: EventId,
) -> Vec<(ClauseId, ConditionalClause)> {
    clauses
        .iter()
        .filter(|(_, clause)| clause.event_id == event_id)
        .cloned()
        .collect()
}
