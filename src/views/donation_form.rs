use std::sync::Arc;

use donations_sdk::{
    create_conditional_donation, failure_message, success_message, ClauseId, ClauseStore,
    ContractClient, DonationInput, Error, EventStore, SubmissionState,
};

use super::format::event_option_label;
use crate::notifications::Notifier;
use crate::poller::refresh_once;

pub const CONNECT_FIRST: &str = "Please connect your wallet first";
pub const NO_PENDING_EVENTS: &str =
    "No pending events available. Create an event in the Oracle tab first.";

/// Form state for creating one conditional donation.
#[derive(Debug)]
pub struct DonationForm {
    pub input: DonationInput,
    state: SubmissionState,
    active_address: Option<String>,
}

/// One submission accepted by [`DonationForm::begin_submit`].
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    pub sender: String,
    pub input: DonationInput,
}

impl DonationForm {
    pub fn new(active_address: Option<&str>) -> Self {
        let mut form = Self {
            input: DonationInput::default(),
            state: SubmissionState::Idle,
            active_address: None,
        };
        form.on_session_change(active_address);
        form
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn active_address(&self) -> Option<&str> {
        self.active_address.as_deref()
    }

    /// Track the connected address; an empty "No" recipient defaults to it.
    pub fn on_session_change(&mut self, active_address: Option<&str>) {
        self.active_address = active_address.map(str::to_string);
        self.focus_recipient_no();
    }

    pub fn focus_recipient_no(&mut self) {
        if self.input.recipient_no.is_empty() {
            if let Some(address) = &self.active_address {
                self.input.recipient_no = address.clone();
            }
        }
    }

    /// Selection entries for the event field: pending events only.
    pub fn event_options<C: ContractClient>(events: &EventStore<C>) -> Vec<(String, String)> {
        events
            .pending_events()
            .iter()
            .map(|(id, event)| (id.to_string(), event_option_label(*id, event)))
            .collect()
    }

    /// Gate a submission. Returns `None` and surfaces a warning when the
    /// session or the form is not ready; no contract call may follow.
    pub fn begin_submit(
        &mut self,
        has_client: bool,
        notifier: &mut Notifier,
    ) -> Option<PendingSubmission> {
        if self.state.is_submitting() {
            log::debug!("donation submit ignored: already submitting");
            return None;
        }
        let sender = match (&self.active_address, has_client) {
            (Some(address), true) => address.clone(),
            _ => {
                notifier.warning(CONNECT_FIRST);
                return None;
            }
        };
        if !self.input.has_all_fields() {
            notifier.warning(Error::MissingFields.to_string());
            return None;
        }
        self.state = SubmissionState::Submitting;
        Some(PendingSubmission {
            sender,
            input: self.input.clone(),
        })
    }

    /// Record the outcome of the contract call and surface exactly one
    /// notification for it.
    pub fn finish_submit(&mut self, result: &Result<ClauseId, Error>, notifier: &mut Notifier) {
        match result {
            Ok(id) => {
                let message = success_message(*id);
                notifier.success(message.clone());
                self.input.event_id.clear();
                self.input.recipient_yes.clear();
                self.input.amount.clear();
                self.input.recipient_no = self.active_address.clone().unwrap_or_default();
                self.state = SubmissionState::Succeeded(message);
            }
            Err(e) => {
                let message = failure_message(e);
                notifier.error(message.clone());
                self.state = SubmissionState::Failed(message);
            }
        }
    }

    /// Return to `Idle` once the outcome has been shown.
    pub fn acknowledge(&mut self) {
        if !self.state.is_submitting() {
            self.state = SubmissionState::Idle;
        }
    }

    /// Validate, call the contract and record the outcome. Returns the new
    /// clause id on success. Does not touch any cache; see
    /// [`submit_and_refresh`](Self::submit_and_refresh).
    pub async fn submit<C: ContractClient>(
        &mut self,
        client: Option<&Arc<C>>,
        notifier: &mut Notifier,
    ) -> Option<ClauseId> {
        let pending = self.begin_submit(client.is_some(), notifier)?;
        let client = client?;
        let result = create_conditional_donation(client, &pending.sender, &pending.input).await;
        self.finish_submit(&result, notifier);
        result.ok()
    }

    /// [`submit`](Self::submit), then re-fetch `events` and `clauses` once the
    /// clause exists. Nothing is re-fetched after a rejected or failed submit.
    pub async fn submit_and_refresh<C: ContractClient>(
        &mut self,
        client: Option<&Arc<C>>,
        events: &EventStore<C>,
        clauses: &ClauseStore<C>,
        notifier: &mut Notifier,
    ) -> Option<ClauseId> {
        let id = self.submit(client, notifier).await?;
        refresh_once(events, clauses).await;
        Some(id)
    }
}
