use std::sync::{Arc, Mutex};

use crate::client::{ContractClient, call_blocking};
use crate::error::{Error, Result};
use crate::fetch::{Completion, FetchState};
use crate::types::{Event, EventId};

use super::lock;

/// In-memory, read-only cache of the contract's events.
///
/// Fetches are caller-triggered and always replace the whole set. The
/// pending subset is derived from the cache on every call, never stored.
pub struct EventStore<C: ContractClient> {
    client: Option<Arc<C>>,
    list: Mutex<FetchState<Vec<(EventId, Event)>>>,
    lookup: Mutex<FetchState<Option<(EventId, Event)>>>,
}

impl<C: ContractClient> EventStore<C> {
    pub fn new(client: Option<Arc<C>>) -> Self {
        Self {
            client,
            list: Mutex::new(FetchState::default()),
            lookup: Mutex::new(FetchState::default()),
        }
    }

    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    fn client(&self) -> Result<&Arc<C>> {
        self.client.as_ref().ok_or(Error::ClientUnavailable)
    }

    /// Replace the cached set with the contract's current events.
    ///
    /// Errors from the contract are recorded in [`error`](Self::error) and
    /// reported as [`Completion::Failed`]; only a missing client or a
    /// poisoned lock surface as `Err`.
    pub async fn fetch_events(&self) -> Result<Completion> {
        let client = self.client()?;
        let ticket = lock(&self.list)?.begin();

        let result = call_blocking(client, |c| c.list_events())
            .await
            .map_err(|e| e.to_string());
        let count = result.as_ref().map(Vec::len).unwrap_or(0);

        let completion = lock(&self.list)?.complete(ticket, result);
        match &completion {
            Completion::Applied => {
                lock(&self.lookup)?.clear_error();
                log::debug!("events refreshed: {count} cached");
            }
            Completion::Failed(e) => log::warn!("event fetch failed: {e}"),
            Completion::Superseded => {}
        }
        Ok(completion)
    }

    /// Look up one event straight from the contract, bypassing the cache.
    pub async fn get_event_info(&self, id: EventId) -> Result<Option<Event>> {
        let client = self.client()?;
        let ticket = lock(&self.lookup)?.begin();

        let result = call_blocking(client, move |c| c.get_event(id)).await;
        let recorded = match &result {
            Ok(found) => Ok(found.clone().map(|event| (id, event))),
            Err(e) => Err(e.to_string()),
        };
        match lock(&self.lookup)?.complete(ticket, recorded) {
            Completion::Applied => lock(&self.list)?.clear_error(),
            Completion::Failed(e) => log::warn!("event {id} lookup failed: {e}"),
            Completion::Superseded => {}
        }
        result
    }

    /// Snapshot of the cached events in contract order.
    pub fn events(&self) -> Vec<(EventId, Event)> {
        self.list
            .lock()
            .map(|s| s.value().clone())
            .unwrap_or_default()
    }

    /// Cached events that are still awaiting resolution, in contract order.
    pub fn pending_events(&self) -> Vec<(EventId, Event)> {
        pending_only(&self.events())
    }

    /// Cached event by id.
    pub fn event(&self, id: EventId) -> Option<Event> {
        self.list.lock().ok().and_then(|s| {
            s.value()
                .iter()
                .find(|(event_id, _)| *event_id == id)
                .map(|(_, event)| event.clone())
        })
    }

    /// Result of the most recent [`get_event_info`](Self::get_event_info).
    pub fn last_lookup(&self) -> Option<(EventId, Event)> {
        self.lookup.lock().ok().and_then(|s| s.value().clone())
    }

    pub fn loading(&self) -> bool {
        let list = self.list.lock().map(|s| s.loading()).unwrap_or(false);
        let lookup = self.lookup.lock().map(|s| s.loading()).unwrap_or(false);
        list || lookup
    }

    /// Message of the last failed fetch or lookup. Any later success on
    /// either path clears it.
    pub fn error(&self) -> Option<String> {
        let list = self
            .list
            .lock()
            .ok()
            .and_then(|s| s.error().map(str::to_string));
        list.or_else(|| {
            self.lookup
                .lock()
                .ok()
                .and_then(|s| s.error().map(str::to_string))
        })
    }
}

/// The `pending == true` subset of `events`, order preserved.
pub fn pending_only(events: &[(EventId, Event)]) -> Vec<(EventId, Event)> {
    events
        .iter()
        .filter(|(_, event)| event.pending)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedClient, pending_event, resolved_event};

    fn store(client: ScriptedClient) -> (EventStore<ScriptedClient>, Arc<ScriptedClient>) {
        let client = Arc::new(client);
        (EventStore::new(Some(client.clone())), client)
    }

    #[test]
    fn pending_filter_keeps_order() {
        let events = vec![
            (EventId(3), pending_event("c")),
            (EventId(1), resolved_event("a", true)),
            (EventId(2), pending_event("b")),
        ];
        let pending = pending_only(&events);
        let ids: Vec<_> = pending.iter().map(|(id, _)| id.0).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[tokio::test]
    async fn fetch_replaces_cache_and_filters_pending() {
        let (store, client) = store(ScriptedClient::default());
        client.set_events(vec![
            (EventId(1), pending_event("rain")),
            (EventId(2), resolved_event("snow", false)),
        ]);

        assert_eq!(store.fetch_events().await.unwrap(), Completion::Applied);
        assert_eq!(store.events().len(), 2);
        let pending = store.pending_events();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].0, EventId(1));

        client.set_events(vec![(EventId(5), pending_event("sun"))]);
        store.fetch_events().await.unwrap();
        assert_eq!(store.events(), vec![(EventId(5), pending_event("sun"))]);
        assert!(store.event(EventId(1)).is_none());
    }

    #[tokio::test]
    async fn no_client_means_no_call() {
        let store: EventStore<ScriptedClient> = EventStore::new(None);
        assert!(matches!(
            store.fetch_events().await,
            Err(Error::ClientUnavailable)
        ));
        assert!(!store.loading());
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn failure_recorded_then_cleared() {
        let (store, client) = store(ScriptedClient::default());
        client.set_events(vec![(EventId(1), pending_event("rain"))]);
        store.fetch_events().await.unwrap();

        client.fail_reads("node unreachable");
        let outcome = store.fetch_events().await.unwrap();
        assert!(matches!(outcome, Completion::Failed(_)));
        assert!(store.error().unwrap().contains("node unreachable"));
        assert_eq!(store.events().len(), 1, "stale cache kept on failure");
        assert!(!store.loading());

        client.clear_failure();
        store.fetch_events().await.unwrap();
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn failed_lookup_cleared_by_full_refresh() {
        let (store, client) = store(ScriptedClient::default());
        client.set_events(vec![(EventId(1), pending_event("rain"))]);

        client.fail_reads("node unreachable");
        assert!(store.get_event_info(EventId(1)).await.is_err());
        assert!(store.error().unwrap().contains("node unreachable"));

        client.clear_failure();
        assert_eq!(store.fetch_events().await.unwrap(), Completion::Applied);
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn failed_refresh_cleared_by_lookup() {
        let (store, client) = store(ScriptedClient::default());
        client.set_events(vec![(EventId(1), pending_event("rain"))]);

        client.fail_reads("node unreachable");
        store.fetch_events().await.unwrap();
        assert!(store.error().is_some());

        client.clear_failure();
        store.get_event_info(EventId(1)).await.unwrap();
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn single_lookup_bypasses_cache() {
        let (store, client) = store(ScriptedClient::default());
        client.set_events(vec![(EventId(4), resolved_event("quake", true))]);

        let event = store.get_event_info(EventId(4)).await.unwrap().unwrap();
        assert_eq!(event.outcome(), Some(true));
        assert!(store.events().is_empty());
        assert_eq!(store.last_lookup().unwrap().0, EventId(4));
        assert!(store.get_event_info(EventId(9)).await.unwrap().is_none());
        assert_eq!(client.list_event_calls(), 0);
    }
}
