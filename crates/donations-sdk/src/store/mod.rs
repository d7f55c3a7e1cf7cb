pub mod clauses;
pub mod events;

use std::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};

pub use clauses::{ClauseStore, for_event};
pub use events::{EventStore, pending_only};

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    m.lock().map_err(|_| Error::MutexPoisoned)
}
