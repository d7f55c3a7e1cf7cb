pub mod client;
pub mod donation;
pub mod error;
pub mod fetch;
pub mod local;
pub mod network;
pub mod store;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;

// Core types
pub use client::{ContractClient, call_blocking};
pub use error::{Error, Result};
pub use network::Network;
pub use types::{
    ClauseId, ClauseRequest, ConditionalClause, Event, EventId, MICRO_UNITS, format_amount,
    parse_amount,
};

// Read model
pub use fetch::{Completion, FetchState, FetchTicket};
pub use store::{ClauseStore, EventStore, for_event, pending_only};

// Donation creation
pub use donation::{
    DonationInput, SubmissionState, create_conditional_donation, failure_message,
    success_message,
};

// Localnet contract
pub use local::{LocalContract, Release};
