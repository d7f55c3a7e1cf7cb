//! Sequence-numbered bookkeeping for full-refresh fetches.
//!
//! Every fetch takes a [`FetchTicket`] before it starts. Only the result of
//! the most recently issued ticket may touch the cache, so a slow request that
//! finishes after a newer one is dropped instead of overwriting fresher data.

/// Handle identifying one in-flight fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

/// What happened to a completed fetch result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The result replaced the cache.
    Applied,
    /// The fetch failed; the message is now the store's error.
    Failed(String),
    /// A newer fetch was started meanwhile; the result was discarded.
    Superseded,
}

#[derive(Debug)]
pub struct FetchState<T> {
    value: T,
    loading: bool,
    error: Option<String>,
    issued: u64,
}

impl<T: Default> Default for FetchState<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> FetchState<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: initial,
            loading: false,
            error: None,
            issued: 0,
        }
    }

    /// Start a fetch. Marks the state loading until the latest ticket completes.
    pub fn begin(&mut self) -> FetchTicket {
        self.issued += 1;
        self.loading = true;
        FetchTicket(self.issued)
    }

    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: std::result::Result<T, String>,
    ) -> Completion {
        if ticket.0 != self.issued {
            log::debug!(
                "dropping superseded fetch #{} (latest #{})",
                ticket.0,
                self.issued
            );
            return Completion::Superseded;
        }

        self.loading = false;
        match result {
            Ok(value) => {
                self.value = value;
                self.error = None;
                Completion::Applied
            }
            Err(message) => {
                self.error = Some(message.clone());
                Completion::Failed(message)
            }
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Drop a recorded error without touching the cached value.
    pub fn clear_error(&mut self) {
        self.error = None;
    }
}
