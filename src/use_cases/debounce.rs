// Trailing-edge debounce driven from inside a `tokio::select!` loop.

use std::time::Duration;
use tokio::time::{Instant, sleep_until};

/// Holds at most one pending deadline. Rescheduling replaces it, so only the last
/// request in a burst fires.
#[derive(Debug)]
pub struct Debounce {
    interval: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    pub fn schedule(&mut self) {
        self.deadline = Some(Instant::now() + self.interval);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolves once the pending deadline passes; never resolves when nothing is pending.
    /// Cancel safe: dropping the future keeps the deadline.
    pub async fn elapsed(&mut self) {
        match self.deadline {
            Some(deadline) => {
                sleep_until(deadline).await;
                self.deadline = None;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
