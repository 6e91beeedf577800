//! Latest-request-wins gate for screens that reload on every period change
//!
//! Each load takes a ticket from a monotonic counter. When the load finishes,
//! its result is only used if no newer ticket was issued in the meantime. The
//! underlying storage call is not cancelled; its result is just dropped.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

/// Ticket for one in-flight request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTicket(u64);

#[derive(Debug, Default)]
pub struct LatestRequest {
    counter: AtomicU64,
}

impl LatestRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request, superseding all earlier ones
    pub fn begin(&self) -> RequestTicket {
        RequestTicket(self.counter.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_latest(&self, ticket: RequestTicket) -> bool {
        self.counter.load(Ordering::SeqCst) == ticket.0
    }

    /// Await `fut` and return its output only if no newer request started meanwhile
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        let ticket = self.begin();
        let output = fut.await;
        self.is_latest(ticket).then_some(output)
    }
}
