//! Progress gate: an employee may only end the day after logging progress.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::EngineResult;
use crate::sources::ProgressTracker;

/// Checks the progress-tracking subsystem for a usable entry.
#[derive(Clone)]
pub struct ProgressGate {
    tracker: Arc<dyn ProgressTracker>,
}

impl ProgressGate {
    /// Creates a gate over the given tracker.
    pub fn new(tracker: Arc<dyn ProgressTracker>) -> Self {
        Self { tracker }
    }

    /// True iff at least one entry for the key has non-empty text.
    ///
    /// Entry timestamps are irrelevant; an entry logged before the day was
    /// started counts.
    pub async fn check(&self, employee_id: &str, date: NaiveDate) -> EngineResult<bool> {
        let entries = self.tracker.entries_for(employee_id, date).await?;
        Ok(entries.iter().any(|e| e.has_content()))
    }
}
