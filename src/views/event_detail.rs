use std::sync::Arc;

use donations_sdk::{
    ClauseId, ClauseStore, ConditionalClause, ContractClient, Event, EventId, EventStore,
};
use serde::Serialize;

use super::format::{display_amount, resolution_label, yes_no};

pub const LOADING_EVENT: &str = "Loading event details...";
pub const LOADING_DONATIONS: &str = "Loading donations...";
pub const NO_EVENT: &str = "No event details found.";
pub const NO_DONATIONS: &str = "No donations found for this event.";

/// Serializable result of loading one event page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetail {
    pub event_id: String,
    pub event: Option<Event>,
    pub donations: Vec<(ClauseId, ConditionalClause)>,
    pub event_error: Option<String>,
    pub donations_error: Option<String>,
    /// Text rendering at the time of the snapshot.
    pub lines: Vec<String>,
}

/// Detail page for one event and the donations attached to it.
///
/// Owns its own stores; `event_id` is the raw route parameter.
pub struct EventDetailView<C: ContractClient> {
    event_id: String,
    events: EventStore<C>,
    clauses: ClauseStore<C>,
    parse_error: Option<String>,
}

impl<C: ContractClient> EventDetailView<C> {
    pub fn new(client: Option<Arc<C>>, event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            events: EventStore::new(client.clone()),
            clauses: ClauseStore::new(client),
            parse_error: None,
        }
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    /// Fetch the event and every clause. Does nothing without a client.
    pub async fn load(&mut self) {
        if !self.events.has_client() {
            log::debug!("event {} not loaded: no contract client", self.event_id);
            return;
        }
        match self.event_id.parse::<EventId>() {
            Ok(id) => {
                self.parse_error = None;
                if let Err(e) = self.events.get_event_info(id).await {
                    log::debug!("event {id} lookup error recorded: {e}");
                }
            }
            Err(e) => self.parse_error = Some(e.to_string()),
        }
        if let Err(e) = self.clauses.fetch_clauses().await {
            log::warn!("clause fetch for event {} failed: {e}", self.event_id);
        }
    }

    pub fn event(&self) -> Option<Event> {
        self.events.last_lookup().map(|(_, event)| event)
    }

    pub fn donations(&self) -> Vec<(ClauseId, ConditionalClause)> {
        self.clauses.clauses_for_event_str(&self.event_id)
    }

    fn event_error(&self) -> Option<String> {
        self.parse_error.clone().or_else(|| self.events.error())
    }

    pub fn detail(&self) -> EventDetail {
        EventDetail {
            event_id: self.event_id.clone(),
            event: self.event(),
            donations: self.donations(),
            event_error: self.event_error(),
            donations_error: self.clauses.error(),
            lines: self.render(),
        }
    }

    /// Text rendering of the page, one line per field.
    pub fn render(&self) -> Vec<String> {
        let mut lines = vec![format!("Event ID: {}", self.event_id)];

        if self.events.loading() {
            lines.push(LOADING_EVENT.to_string());
        } else if let Some(e) = self.event_error() {
            lines.push(format!("Error: {e}"));
        } else if let Some(event) = self.event() {
            lines.push(format!("Description: {}", event.description));
            lines.push(format!("Oracle: {}", event.oracle_address));
            lines.push(format!("Pending: {}", yes_no(event.pending)));
            lines.push(format!("Resolution: {}", resolution_label(&event)));
        } else {
            lines.push(NO_EVENT.to_string());
        }

        lines.push(String::new());
        lines.push("Donations for this Event".to_string());
        let donations = self.donations();
        if self.clauses.loading() {
            lines.push(LOADING_DONATIONS.to_string());
        } else if let Some(e) = self.clauses.error() {
            lines.push(format!("Error: {e}"));
        } else if donations.is_empty() {
            lines.push(NO_DONATIONS.to_string());
        } else {
            for (id, clause) in donations {
                lines.push(format!("Clause ID: {id}"));
                lines.push(format!("  Donor: {}", clause.donor_address));
                lines.push(format!("  Amount: {}", display_amount(clause.payout_amount)));
                lines.push(format!("  Recipient (Yes): {}", clause.recipient_yes));
                lines.push(format!("  Recipient (No): {}", clause.recipient_no));
                lines.push(format!("  Executed: {}", yes_no(clause.executed)));
            }
        }
        lines
    }
}
