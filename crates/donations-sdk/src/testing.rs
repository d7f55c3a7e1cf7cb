//! Test doubles shared by unit and integration tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::client::ContractClient;
use crate::error::{Error, Result};
use crate::types::{ClauseId, ClauseRequest, ConditionalClause, Event, EventId};

pub const TEST_ORACLE: &str = "ORACLE7QK2M5XH3ZP4WAVNB6LJ2YRT8DFSCEGUMH3K5N2QW";
pub const TEST_DONOR: &str = "DONORXF6VCJ3DWQ8LZP2N7M4KRB5YHTGA9SEUQ3W5N8KD";
pub const TEST_CHARITY: &str = "CHARITY2M8QXH4N7PLZR5K3WVT6BJ9YDGA3FESUC7Q2M";

pub fn pending_event(description: &str) -> Event {
    Event::new(description, TEST_ORACLE)
}

pub fn resolved_event(description: &str, resolution: bool) -> Event {
    Event {
        pending: false,
        resolution,
        ..Event::new(description, TEST_ORACLE)
    }
}

pub fn clause_for(event_id: EventId, payout_amount: u64) -> ConditionalClause {
    ConditionalClause {
        event_id,
        donor_address: TEST_DONOR.to_string(),
        payout_amount,
        recipient_yes: TEST_CHARITY.to_string(),
        recipient_no: TEST_DONOR.to_string(),
        executed: false,
    }
}

/// Contract client whose responses are set by the test.
///
/// Reads snapshot the scripted data before applying any queued delay, so a
/// delayed call returns the data that was current when it started.
#[derive(Default)]
pub struct ScriptedClient {
    events: Mutex<Vec<(EventId, Event)>>,
    clauses: Mutex<Vec<(ClauseId, ConditionalClause)>>,
    read_failure: Mutex<Option<String>>,
    write_failure: Mutex<Option<String>>,
    read_delays: Mutex<VecDeque<Duration>>,
    created: Mutex<Vec<(String, ClauseRequest)>>,
    list_event_calls: AtomicUsize,
    list_clause_calls: AtomicUsize,
    create_calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn set_events(&self, events: Vec<(EventId, Event)>) {
        *self.events.lock().unwrap() = events;
    }

    pub fn set_clauses(&self, clauses: Vec<(ClauseId, ConditionalClause)>) {
        *self.clauses.lock().unwrap() = clauses;
    }

    pub fn fail_reads(&self, message: &str) {
        *self.read_failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_writes(&self, message: &str) {
        *self.write_failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn clear_failure(&self) {
        *self.read_failure.lock().unwrap() = None;
        *self.write_failure.lock().unwrap() = None;
    }

    /// Delay the next list call (events or clauses) by `delay`.
    pub fn delay_next_read(&self, delay: Duration) {
        self.read_delays.lock().unwrap().push_back(delay);
    }

    pub fn created(&self) -> Vec<(String, ClauseRequest)> {
        self.created.lock().unwrap().clone()
    }

    pub fn list_event_calls(&self) -> usize {
        self.list_event_calls.load(Ordering::SeqCst)
    }

    pub fn list_clause_calls(&self) -> usize {
        self.list_clause_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    fn check_read(&self) -> Result<()> {
        match self.read_failure.lock().unwrap().as_ref() {
            Some(msg) => Err(Error::Read(msg.clone())),
            None => Ok(()),
        }
    }

    fn apply_delay(&self) {
        let delay = self.read_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
    }
}

impl ContractClient for ScriptedClient {
    fn list_events(&self) -> Result<Vec<(EventId, Event)>> {
        self.list_event_calls.fetch_add(1, Ordering::SeqCst);
        self.check_read()?;
        let snapshot = self.events.lock().unwrap().clone();
        self.apply_delay();
        Ok(snapshot)
    }

    fn get_event(&self, id: EventId) -> Result<Option<Event>> {
        self.check_read()?;
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .find(|(event_id, _)| *event_id == id)
            .map(|(_, event)| event.clone()))
    }

    fn list_clauses(&self) -> Result<Vec<(ClauseId, ConditionalClause)>> {
        self.list_clause_calls.fetch_add(1, Ordering::SeqCst);
        self.check_read()?;
        let snapshot = self.clauses.lock().unwrap().clone();
        self.apply_delay();
        Ok(snapshot)
    }

    fn create_clause(&self, sender: &str, request: &ClauseRequest) -> Result<ClauseId> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = self.write_failure.lock().unwrap().as_ref() {
            return Err(Error::Write(msg.clone()));
        }
        let mut clauses = self.clauses.lock().unwrap();
        let id = ClauseId(clauses.iter().map(|(id, _)| id.0 + 1).max().unwrap_or(1));
        clauses.push((
            id,
            ConditionalClause {
                event_id: request.event_id,
                donor_address: sender.to_string(),
                payout_amount: request.payout_amount,
                recipient_yes: request.recipient_yes.clone(),
                recipient_no: request.recipient_no.clone(),
                executed: false,
            },
        ));
        self.created
            .lock()
            .unwrap()
            .push((sender.to_string(), request.clone()));
        Ok(id)
    }
}
