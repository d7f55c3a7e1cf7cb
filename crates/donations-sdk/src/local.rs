//! `LocalContract`: in-process donation contract for localnet development.
//!
//! Enforces the same rules the deployed contract does (clauses only against
//! pending events, oracle-only resolution, single execution per clause) and
//! optionally persists its ledger to a JSON file so separate CLI invocations
//! share state.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::client::ContractClient;
use crate::error::{Error, Result};
use crate::types::{ClauseId, ClauseRequest, ConditionalClause, Event, EventId};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ledger {
    next_event_id: u64,
    next_clause_id: u64,
    events: Vec<(EventId, Event)>,
    clauses: Vec<(ClauseId, ConditionalClause)>,
    #[serde(default)]
    releases: Vec<Release>,
}

impl Ledger {
    fn event_mut(&mut self, id: EventId) -> Result<&mut Event> {
        self.events
            .iter_mut()
            .find(|(event_id, _)| *event_id == id)
            .map(|(_, event)| event)
            .ok_or(Error::EventNotFound(id))
    }

    fn event(&self, id: EventId) -> Option<&Event> {
        self.events
            .iter()
            .find(|(event_id, _)| *event_id == id)
            .map(|(_, event)| event)
    }
}

/// Funds paid out by [`LocalContract::release_clause`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub clause_id: ClauseId,
    pub payee: String,
    pub amount: u64,
    pub txid: String,
}

pub struct LocalContract {
    ledger: Mutex<Ledger>,
    path: Option<PathBuf>,
    injected_failure: Mutex<Option<String>>,
}

impl LocalContract {
    pub fn in_memory() -> Self {
        Self {
            ledger: Mutex::new(Ledger::default()),
            path: None,
            injected_failure: Mutex::new(None),
        }
    }

    /// Open (or start) a ledger file. A missing file is an empty ledger.
    pub fn open(path: &Path) -> Result<Self> {
        let ledger = if path.exists() {
            let contents = fs::read_to_string(path).map_err(|e| Error::Persist(e.to_string()))?;
            serde_json::from_str(&contents).map_err(|e| Error::Persist(e.to_string()))?
        } else {
            Ledger::default()
        };
        Ok(Self {
            ledger: Mutex::new(ledger),
            path: Some(path.to_path_buf()),
            injected_failure: Mutex::new(None),
        })
    }

    /// Make the next contract call fail with `message` (read or write).
    pub fn fail_next(&self, message: &str) {
        if let Ok(mut slot) = self.injected_failure.lock() {
            *slot = Some(message.to_string());
        }
    }

    fn take_failure(&self) -> Option<String> {
        self.injected_failure.lock().ok().and_then(|mut s| s.take())
    }

    fn ledger(&self) -> Result<MutexGuard<'_, Ledger>> {
        self.ledger.lock().map_err(|_| Error::MutexPoisoned)
    }

    fn save(&self, ledger: &Ledger) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::Persist(e.to_string()))?;
        }
        let json =
            serde_json::to_string_pretty(ledger).map_err(|e| Error::Persist(e.to_string()))?;
        fs::write(path, json).map_err(|e| Error::Persist(e.to_string()))
    }

    /// Apply `change` to a copy of the ledger and persist it. The live ledger
    /// is replaced only once the copy is saved.
    fn commit<T>(&self, change: impl FnOnce(&mut Ledger) -> Result<T>) -> Result<T> {
        let mut ledger = self.ledger()?;
        let mut next = ledger.clone();
        let out = change(&mut next)?;
        self.save(&next)?;
        *ledger = next;
        Ok(out)
    }

    // ── Oracle operations ───────────────────────────────────────────────

    pub fn create_event(&self, oracle: &str, description: &str) -> Result<EventId> {
        if let Some(msg) = self.take_failure() {
            return Err(Error::Write(msg));
        }
        if oracle.trim().is_empty() || description.trim().is_empty() {
            return Err(Error::InvalidInput(
                "event needs an oracle and a description".into(),
            ));
        }
        let id = self.commit(|ledger| {
            ledger.next_event_id += 1;
            let id = EventId(ledger.next_event_id);
            ledger
                .events
                .push((id, Event::new(description.trim(), oracle.trim())));
            Ok(id)
        })?;
        log::info!("event {id} created by oracle {oracle}");
        Ok(id)
    }

    /// Record the outcome of a pending event. Only its oracle may do this, once.
    pub fn resolve_event(&self, oracle: &str, id: EventId, resolution: bool) -> Result<()> {
        if let Some(msg) = self.take_failure() {
            return Err(Error::Write(msg));
        }
        self.commit(|ledger| {
            let event = ledger.event_mut(id)?;
            if event.oracle_address != oracle {
                return Err(Error::NotOracle(oracle.to_string()));
            }
            if !event.pending {
                return Err(Error::EventResolved(id));
            }
            event.pending = false;
            event.resolution = resolution;
            Ok(())
        })?;
        log::info!("event {id} resolved: {resolution}");
        Ok(())
    }

    /// Pay a clause out to the recipient its event's outcome selects.
    pub fn release_clause(&self, id: ClauseId) -> Result<Release> {
        if let Some(msg) = self.take_failure() {
            return Err(Error::Write(msg));
        }
        let release = self.commit(|ledger| {
            let (event_id, executed) = ledger
                .clauses
                .iter()
                .find(|(clause_id, _)| *clause_id == id)
                .map(|(_, c)| (c.event_id, c.executed))
                .ok_or(Error::ClauseNotFound(id))?;
            if executed {
                return Err(Error::ClauseExecuted(id));
            }
            let resolution = ledger
                .event(event_id)
                .ok_or(Error::EventNotFound(event_id))?
                .outcome()
                .ok_or(Error::EventPending(event_id))?;

            let clause = ledger
                .clauses
                .iter_mut()
                .find(|(clause_id, _)| *clause_id == id)
                .map(|(_, c)| c)
                .ok_or(Error::ClauseNotFound(id))?;
            clause.executed = true;
            let payee = clause.payee(resolution).to_string();
            let amount = clause.payout_amount;

            let release = Release {
                clause_id: id,
                txid: release_txid(id, &payee, amount),
                payee,
                amount,
            };
            ledger.releases.push(release.clone());
            Ok(release)
        })?;
        log::info!(
            "clause {id} released {} to {}",
            release.amount,
            release.payee
        );
        Ok(release)
    }

    /// Every payout made so far, oldest first.
    pub fn releases(&self) -> Vec<Release> {
        self.ledger
            .lock()
            .map(|l| l.releases.clone())
            .unwrap_or_default()
    }
}

/// SHA256(clause_id || payee || amount || nonce), hex encoded.
fn release_txid(id: ClauseId, payee: &str, amount: u64) -> String {
    let nonce: [u8; 16] = rand::random();
    let mut hasher = Sha256::new();
    hasher.update(id.as_u64().to_be_bytes());
    hasher.update(payee.as_bytes());
    hasher.update(amount.to_be_bytes());
    hasher.update(nonce);
    hex::encode(hasher.finalize())
}

impl ContractClient for LocalContract {
    fn list_events(&self) -> Result<Vec<(EventId, Event)>> {
        if let Some(msg) = self.take_failure() {
            return Err(Error::Read(msg));
        }
        Ok(self.ledger()?.events.clone())
    }

    fn get_event(&self, id: EventId) -> Result<Option<Event>> {
        if let Some(msg) = self.take_failure() {
            return Err(Error::Read(msg));
        }
        Ok(self.ledger()?.event(id).cloned())
    }

    fn list_clauses(&self) -> Result<Vec<(ClauseId, ConditionalClause)>> {
        if let Some(msg) = self.take_failure() {
            return Err(Error::Read(msg));
        }
        Ok(self.ledger()?.clauses.clone())
    }

    fn create_clause(&self, sender: &str, request: &ClauseRequest) -> Result<ClauseId> {
        if let Some(msg) = self.take_failure() {
            return Err(Error::Write(msg));
        }
        if request.payout_amount == 0 {
            return Err(Error::ZeroAmount);
        }
        if sender.is_empty() || request.recipient_yes.is_empty() || request.recipient_no.is_empty()
        {
            return Err(Error::MissingFields);
        }

        self.commit(|ledger| {
            let event = ledger
                .event(request.event_id)
                .ok_or(Error::EventNotFound(request.event_id))?;
            if !event.pending {
                return Err(Error::EventResolved(request.event_id));
            }

            ledger.next_clause_id += 1;
            let id = ClauseId(ledger.next_clause_id);
            ledger.clauses.push((
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
            Ok(id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORACLE: &str = "ORACLE";

    fn request(event_id: EventId, amount: u64) -> ClauseRequest {
        ClauseRequest {
            event_id,
            recipient_yes: "CHARITY".into(),
            recipient_no: "DONOR".into(),
            payout_amount: amount,
        }
    }

    #[test]
    fn lifecycle_pays_selected_recipient_once() {
        let contract = LocalContract::in_memory();
        let event = contract.create_event(ORACLE, "Hurricane hits Miami").unwrap();
        let clause = contract.create_clause("DONOR", &request(event, 5_000)).unwrap();

        assert!(matches!(
            contract.release_clause(clause),
            Err(Error::EventPending(_))
        ));
        contract.resolve_event(ORACLE, event, true).unwrap();

        let release = contract.release_clause(clause).unwrap();
        assert_eq!(release.payee, "CHARITY");
        assert_eq!(release.amount, 5_000);
        assert_eq!(release.txid.len(), 64);
        assert!(matches!(
            contract.release_clause(clause),
            Err(Error::ClauseExecuted(_))
        ));
        assert!(contract.list_clauses().unwrap()[0].1.executed);
    }

    #[test]
    fn resolution_is_oracle_only_and_final() {
        let contract = LocalContract::in_memory();
        let event = contract.create_event(ORACLE, "Rain in Lima").unwrap();
        assert!(matches!(
            contract.resolve_event("MALLORY", event, true),
            Err(Error::NotOracle(_))
        ));
        contract.resolve_event(ORACLE, event, false).unwrap();
        assert!(matches!(
            contract.resolve_event(ORACLE, event, true),
            Err(Error::EventResolved(_))
        ));
        let stored = contract.get_event(event).unwrap().unwrap();
        assert_eq!(stored.outcome(), Some(false));
    }

    #[test]
    fn clauses_rejected_for_resolved_or_unknown_events() {
        let contract = LocalContract::in_memory();
        let event = contract.create_event(ORACLE, "Rain in Lima").unwrap();
        contract.resolve_event(ORACLE, event, false).unwrap();
        assert!(matches!(
            contract.create_clause("DONOR", &request(event, 1)),
            Err(Error::EventResolved(_))
        ));
        assert!(matches!(
            contract.create_clause("DONOR", &request(EventId(99), 1)),
            Err(Error::EventNotFound(_))
        ));
        assert!(matches!(
            contract.create_clause("DONOR", &request(event, 0)),
            Err(Error::ZeroAmount)
        ));
    }

    #[test]
    fn injected_failure_hits_next_call_only() {
        let contract = LocalContract::in_memory();
        contract.fail_next("node offline");
        assert!(matches!(contract.list_events(), Err(Error::Read(_))));
        assert!(contract.list_events().unwrap().is_empty());
    }

    #[test]
    fn ledger_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        {
            let contract = LocalContract::open(&path).unwrap();
            let event = contract.create_event(ORACLE, "Flood in Dhaka").unwrap();
            contract.create_clause("DONOR", &request(event, 42)).unwrap();
        }
        let reopened = LocalContract::open(&path).unwrap();
        assert_eq!(reopened.list_events().unwrap().len(), 1);
        assert_eq!(reopened.list_clauses().unwrap()[0].1.payout_amount, 42);
        let next = reopened.create_event(ORACLE, "Second").unwrap();
        assert_eq!(next, EventId(2));
    }

    #[test]
    fn failed_save_leaves_ledger_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let contract = LocalContract::open(&path).unwrap();
        let event = contract.create_event(ORACLE, "Flood in Dhaka").unwrap();

        // A regular file where the ledger's parent directory should be.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let broken = LocalContract {
            ledger: Mutex::new(contract.ledger().unwrap().clone()),
            path: Some(blocker.join("ledger.json")),
            injected_failure: Mutex::new(None),
        };

        assert!(matches!(
            broken.create_event(ORACLE, "Never stored"),
            Err(Error::Persist(_))
        ));
        assert_eq!(broken.list_events().unwrap().len(), 1);

        assert!(matches!(
            broken.create_clause("DONOR", &request(event, 10)),
            Err(Error::Persist(_))
        ));
        assert!(broken.list_clauses().unwrap().is_empty());

        assert!(matches!(
            broken.resolve_event(ORACLE, event, true),
            Err(Error::Persist(_))
        ));
        assert_eq!(broken.get_event(event).unwrap().unwrap().outcome(), None);
    }

    #[test]
    fn failed_save_does_not_mark_release() {
        let dir = tempfile::tempdir().unwrap();
        let contract = LocalContract::in_memory();
        let event = contract.create_event(ORACLE, "Rain in Lima").unwrap();
        let clause = contract.create_clause("DONOR", &request(event, 7)).unwrap();
        contract.resolve_event(ORACLE, event, false).unwrap();

        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let broken = LocalContract {
            ledger: Mutex::new(contract.ledger().unwrap().clone()),
            path: Some(blocker.join("ledger.json")),
            injected_failure: Mutex::new(None),
        };

        assert!(matches!(
            broken.release_clause(clause),
            Err(Error::Persist(_))
        ));
        assert!(!broken.list_clauses().unwrap()[0].1.executed);
        assert!(broken.releases().is_empty());
    }
}
