//! Per-operation deadline.
//!
//! Engine operations run their transactional body under [`Deadline::guard`]
//! and commit outside it. Expiry can therefore only drop an uncommitted
//! transaction; once COMMIT is issued the operation runs to completion.

use crate::error::EngineError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

// Budgets too large to add to `Instant::now()` are capped at roughly 30 years.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    /// A deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        let now = Instant::now();
        let at = now
            .checked_add(budget)
            .unwrap_or_else(|| now + FAR_FUTURE);
        Self { at, budget }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Run `work` until the deadline.
    ///
    /// On expiry `work` is dropped, and any transaction it owns rolls back.
    pub async fn guard<T, F>(&self, work: F) -> Result<T, EngineError>
    where
        F: Future<Output = Result<T, EngineError>>,
    {
        match tokio::time::timeout_at(self.at, work).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::DeadlineExceeded(self.budget)),
        }
    }
}
