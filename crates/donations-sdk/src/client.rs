use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{ClauseId, ClauseRequest, ConditionalClause, Event, EventId};

/// Boundary to the donation contract's query and call methods.
///
/// Methods block on I/O; async callers dispatch them through
/// `tokio::task::spawn_blocking`.
pub trait ContractClient: Send + Sync + 'static {
    /// Every event known to the contract, in contract order.
    fn list_events(&self) -> Result<Vec<(EventId, Event)>>;

    /// A single event, or `None` if the id is unknown.
    fn get_event(&self, id: EventId) -> Result<Option<Event>>;

    /// Every conditional clause known to the contract, in contract order.
    fn list_clauses(&self) -> Result<Vec<(ClauseId, ConditionalClause)>>;

    /// Create a clause funded by `sender`. One atomic contract call.
    fn create_clause(&self, sender: &str, request: &ClauseRequest) -> Result<ClauseId>;
}

impl<C: ContractClient> ContractClient for Arc<C> {
    fn list_events(&self) -> Result<Vec<(EventId, Event)>> {
        (**self).list_events()
    }

    fn get_event(&self, id: EventId) -> Result<Option<Event>> {
        (**self).get_event(id)
    }

    fn list_clauses(&self) -> Result<Vec<(ClauseId, ConditionalClause)>> {
        (**self).list_clauses()
    }

    fn create_clause(&self, sender: &str, request: &ClauseRequest) -> Result<ClauseId> {
        (**self).create_clause(sender, request)
    }
}

/// Run a blocking client call on tokio's blocking pool.
pub async fn call_blocking<C, F, R>(client: &Arc<C>, f: F) -> Result<R>
where
    C: ContractClient,
    F: FnOnce(&C) -> Result<R> + Send + 'static,
    R: Send + 'static,
{
    let client = Arc::clone(client);
    tokio::task::spawn_blocking(move || f(&*client))
        .await
        .map_err(|e| Error::Task(e.to_string()))?
}
