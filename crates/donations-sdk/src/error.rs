use thiserror::Error;

use crate::types::{ClauseId, EventId};

#[derive(Debug, Error)]
pub enum Error {
    #[error("contract client not available (connect a wallet first)")]
    ClientUnavailable,

    #[error("Please fill in all fields")]
    MissingFields,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("event {0} not found")]
    EventNotFound(EventId),

    #[error("clause {0} not found")]
    ClauseNotFound(ClauseId),

    #[error("event {0} is already resolved")]
    EventResolved(EventId),

    #[error("event {0} is still pending")]
    EventPending(EventId),

    #[error("clause {0} was already executed")]
    ClauseExecuted(ClauseId),

    #[error("sender {0} is not the oracle for this event")]
    NotOracle(String),

    #[error("payout amount must be non-zero")]
    ZeroAmount,

    #[error("contract read error: {0}")]
    Read(String),

    #[error("contract write error: {0}")]
    Write(String),

    #[error("ledger persistence error: {0}")]
    Persist(String),

    #[error("internal mutex poisoned by a prior panic")]
    MutexPoisoned,

    #[error("task join error: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, Error>;
