use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::client::{ContractClient, call_blocking};
use crate::error::{Error, Result};
use crate::types::{ClauseId, ClauseRequest, EventId, parse_amount};

/// Raw donation form fields as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationInput {
    pub event_id: String,
    pub recipient_yes: String,
    pub recipient_no: String,
    /// Whole currency units, e.g. "0.5".
    pub amount: String,
}

impl DonationInput {
    pub fn has_all_fields(&self) -> bool {
        [
            &self.event_id,
            &self.recipient_yes,
            &self.recipient_no,
            &self.amount,
        ]
        .iter()
        .all(|f| !f.trim().is_empty())
    }

    /// Turn the form into contract call arguments.
    ///
    /// A missing field is [`Error::MissingFields`]; a present but malformed one
    /// is [`Error::InvalidInput`] or [`Error::InvalidAmount`].
    pub fn validate(&self) -> Result<ClauseRequest> {
        if !self.has_all_fields() {
            return Err(Error::MissingFields);
        }
        let event_id: EventId = self.event_id.parse()?;
        let payout_amount = parse_amount(&self.amount)?;
        if payout_amount == 0 {
            return Err(Error::ZeroAmount);
        }
        Ok(ClauseRequest {
            event_id,
            recipient_yes: self.recipient_yes.trim().to_string(),
            recipient_no: self.recipient_no.trim().to_string(),
            payout_amount,
        })
    }
}

/// Where a donation submission currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum SubmissionState {
    Idle,
    Submitting,
    Succeeded(String),
    Failed(String),
}

impl SubmissionState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, SubmissionState::Submitting)
    }
}

/// Validate `input` and, only if it is complete, issue one `create_clause`.
///
/// Returns the new clause id. Validation failures never reach the client.
pub async fn create_conditional_donation<C: ContractClient>(
    client: &Arc<C>,
    sender: &str,
    input: &DonationInput,
) -> Result<ClauseId> {
    let request = input.validate()?;
    let sender = sender.to_string();
    log::info!(
        "creating conditional donation: event={} amount={} from {}",
        request.event_id,
        request.payout_amount,
        sender
    );
    call_blocking(client, move |c| c.create_clause(&sender, &request)).await
}

pub fn success_message(id: ClauseId) -> String {
    format!("Conditional donation created (clause #{id})")
}

pub fn failure_message(err: &Error) -> String {
    match err {
        Error::MissingFields => err.to_string(),
        _ => format!("Failed to create donation: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedClient, TEST_CHARITY, TEST_DONOR};

    fn complete_input() -> DonationInput {
        DonationInput {
            event_id: "1".into(),
            recipient_yes: TEST_CHARITY.into(),
            recipient_no: TEST_DONOR.into(),
            amount: "2.5".into(),
        }
    }

    #[test]
    fn each_missing_field_is_reported() {
        let blanks: [fn(&mut DonationInput); 4] = [
            |i| i.event_id.clear(),
            |i| i.recipient_yes.clear(),
            |i| i.recipient_no = "   ".into(),
            |i| i.amount.clear(),
        ];
        for blank in blanks {
            let mut input = complete_input();
            blank(&mut input);
            assert!(matches!(input.validate(), Err(Error::MissingFields)));
        }
    }

    #[test]
    fn validate_converts_amount() {
        let request = complete_input().validate().unwrap();
        assert_eq!(request.event_id, EventId(1));
        assert_eq!(request.payout_amount, 2_500_000);
    }

    #[test]
    fn malformed_fields_are_not_missing_fields() {
        let mut input = complete_input();
        input.amount = "0".into();
        assert!(matches!(input.validate(), Err(Error::ZeroAmount)));
        input.amount = "lots".into();
        assert!(matches!(input.validate(), Err(Error::InvalidAmount(_))));
        let mut input = complete_input();
        input.event_id = "first".into();
        assert!(matches!(input.validate(), Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn incomplete_form_issues_no_call() {
        let client = Arc::new(ScriptedClient::default());
        let mut input = complete_input();
        input.recipient_yes.clear();
        let err = create_conditional_donation(&client, TEST_DONOR, &input)
            .await
            .unwrap_err();
        assert_eq!(failure_message(&err), "Please fill in all fields");
        assert_eq!(client.create_calls(), 0);
    }

    #[tokio::test]
    async fn complete_form_issues_exactly_one_call() {
        let client = Arc::new(ScriptedClient::default());
        let id = create_conditional_donation(&client, TEST_DONOR, &complete_input())
            .await
            .unwrap();
        assert_eq!(client.create_calls(), 1);
        let created = client.created();
        assert_eq!(created[0].0, TEST_DONOR);
        assert_eq!(created[0].1.payout_amount, 2_500_000);
        assert_eq!(success_message(id), format!("Conditional donation created (clause #{id})"));
    }

    #[tokio::test]
    async fn backend_failure_is_wrapped() {
        let client = Arc::new(ScriptedClient::default());
        client.fail_writes("event already resolved");
        let err = create_conditional_donation(&client, TEST_DONOR, &complete_input())
            .await
            .unwrap_err();
        assert!(failure_message(&err).starts_with("Failed to create donation:"));
        assert!(failure_message(&err).contains("event already resolved"));
    }
}
