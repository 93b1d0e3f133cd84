//! Reconciliation service.
//!
//! Gathers the evidence for one key from the store and the leave source,
//! applies the pure rules in [`crate::calculation`], and writes the result
//! with optimistic versioning. A lost race is retried with exponential
//! backoff; only after the configured attempts is the conflict surfaced.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::calculation::{gather_evidence, resolve_record};
use crate::clock::Clock;
use crate::config::ReconciliationPolicy;
use crate::error::{EngineError, EngineResult};
use crate::events::EventSink;
use crate::models::{
    AttendanceSource, DailyAttendanceRecord, EventType, SessionStatus, StateChangeEvent,
};
use crate::sources::LeaveSource;
use crate::store::{AttendanceStore, WriteOutcome};

/// Merges session, punch and leave evidence into the daily record.
#[derive(Clone)]
pub struct ReconciliationEngine {
    store: Arc<dyn AttendanceStore>,
    leave: Arc<dyn LeaveSource>,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    policy: ReconciliationPolicy,
}

impl ReconciliationEngine {
    /// Creates a reconciliation engine.
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        leave: Arc<dyn LeaveSource>,
        events: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
        policy: ReconciliationPolicy,
    ) -> Self {
        Self {
            store,
            leave,
            events,
            clock,
            policy,
        }
    }

    /// Rebuilds and stores the daily record for `(employee_id, date)`.
    ///
    /// Idempotent: with unchanged inputs the stored record is returned
    /// untouched.
    pub async fn reconcile(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> EngineResult<DailyAttendanceRecord> {
        let max_attempts = self.policy.retry.max_attempts.max(1);
        let tolerance = self.policy.tolerance_hours();

        for attempt in 1..=max_attempts {
            let current = self.store.get_record(employee_id, date).await?;
            let session = self.store.get_session(employee_id, date).await?;
            let punches = self.store.punches_for(employee_id, date).await?;
            let leaves = self.leave.leaves_for(employee_id, date, date).await?;

            let evidence = gather_evidence(date, session.as_ref(), &punches, &leaves);
            let record = resolve_record(employee_id, date, &evidence, tolerance);

            if let Some(current) = &current {
                if current.record == record {
                    debug!(
                        employee_id = %employee_id,
                        date = %date,
                        version = current.version,
                        "Daily record unchanged"
                    );
                    return Ok(record);
                }
            }

            let expected_version = current.map(|c| c.version);
            match self.store.put_record(record.clone(), expected_version).await? {
                WriteOutcome::Written { version } => {
                    info!(
                        employee_id = %employee_id,
                        date = %date,
                        evidence = evidence.kind(),
                        source = ?record.source,
                        hours_worked = %record.hours_worked,
                        flags = record.discrepancy_flags.len(),
                        version,
                        "Reconciled daily record"
                    );
                    let new_status = match (&session, record.source) {
                        (_, AttendanceSource::Leave) => SessionStatus::OnLeave,
                        (Some(session), _) => session.status,
                        (None, _) => SessionStatus::NotStarted,
                    };
                    self.events
                        .publish(StateChangeEvent {
                            event_type: EventType::AttendanceReconciled,
                            employee_id: employee_id.to_string(),
                            date,
                            new_status,
                            occurred_at: self.clock.now(),
                        })
                        .await;
                    return Ok(record);
                }
                WriteOutcome::Conflict { current_version } => {
                    match self.retry_delay(attempt, max_attempts) {
                        Some(backoff) => {
                            warn!(
                                employee_id = %employee_id,
                                date = %date,
                                attempt,
                                ?expected_version,
                                ?current_version,
                                backoff_ms = backoff.as_millis() as u64,
                                "Reconciliation conflict, retrying"
                            );
                            tokio::time::sleep(backoff).await;
                        }
                        None => warn!(
                            employee_id = %employee_id,
                            date = %date,
                            attempt,
                            ?expected_version,
                            ?current_version,
                            "Reconciliation conflict, giving up"
                        ),
                    }
                }
            }
        }

        Err(EngineError::ReconciliationConflict {
            employee_id: employee_id.to_string(),
            date,
            attempts: max_attempts,
        })
    }

    /// Backoff before the next attempt, or `None` after the final one.
    fn retry_delay(&self, attempt: u32, max_attempts: u32) -> Option<Duration> {
        (attempt < max_attempts).then(|| self.backoff(attempt))
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.policy.retry.base_backoff_ms.saturating_mul(factor))
    }
}
