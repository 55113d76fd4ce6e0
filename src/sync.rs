//! Ordering of background fetches.
//!
//! A view may start a new fetch before the previous one has answered (the user
//! opens one client, then another). Each fetch takes a ticket; only the answer
//! carrying the newest ticket is applied, whatever order answers arrive in.

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

/// Hands out monotonically increasing tickets for one view.
#[derive(Debug, Default)]
pub struct FetchSequencer {
    latest: u64,
}

impl FetchSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch. Any ticket issued earlier becomes stale.
    pub fn begin(&mut self) -> FetchTicket {
        self.latest += 1;
        FetchTicket(self.latest)
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.latest
    }

    /// Unwraps a response if it belongs to the newest fetch.
    pub fn accept<T>(&self, ticket: FetchTicket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            debug!(ticket = ticket.0, latest = self.latest, "discarding stale fetch result");
            None
        }
    }

    /// Invalidate outstanding fetches without starting a new one.
    pub fn cancel(&mut self) {
        self.latest += 1;
    }
}
