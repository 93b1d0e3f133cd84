//! Scheduled sweep that force-closes abandoned sessions.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::session::SessionStateMachine;
use crate::clock::Clock;
use crate::config::AutoClosePolicy;
use crate::error::EngineError;
use crate::store::AttendanceStore;

/// A session the sweep could not close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepFailure {
    /// The employee.
    pub employee_id: String,
    /// The session date.
    pub date: NaiveDate,
    /// The error, rendered.
    pub error: String,
}

/// What one sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Keys that were auto-closed.
    pub closed: Vec<(String, NaiveDate)>,
    /// Keys closed by someone else between selection and transition.
    pub skipped: Vec<(String, NaiveDate)>,
    /// Keys that failed.
    pub failures: Vec<SweepFailure>,
}

/// Force-terminates in-progress sessions dated before today.
#[derive(Clone)]
pub struct AutoCloser {
    machine: SessionStateMachine,
    store: Arc<dyn AttendanceStore>,
    clock: Arc<dyn Clock>,
    policy: AutoClosePolicy,
}

impl AutoCloser {
    /// Creates an auto-closer.
    pub fn new(
        machine: SessionStateMachine,
        store: Arc<dyn AttendanceStore>,
        clock: Arc<dyn Clock>,
        policy: AutoClosePolicy,
    ) -> Self {
        Self {
            machine,
            store,
            clock,
            policy,
        }
    }

    /// Runs one sweep. Safe to repeat: closed sessions are never selected.
    ///
    /// Per-session failures are logged and reported; the sweep continues.
    pub async fn sweep(&self) -> SweepReport {
        let today = self.clock.today();
        let mut report = SweepReport::default();

        let open = match self.store.open_sessions_before(today).await {
            Ok(open) => open,
            Err(err) => {
                warn!(error = %err, "Auto-close sweep could not list open sessions");
                return report;
            }
        };

        for session in open {
            let key = (session.employee_id.clone(), session.date);
            let cutoff = session.date.and_time(self.policy.cutoff_time);
            match self
                .machine
                .auto_close(&session.employee_id, session.date, cutoff)
                .await
            {
                Ok(_) => report.closed.push(key),
                Err(EngineError::InvalidTransition { .. }) => {
                    debug!(
                        employee_id = %key.0,
                        date = %key.1,
                        "Session closed before the sweep reached it"
                    );
                    report.skipped.push(key);
                }
                Err(err) => {
                    warn!(
                        employee_id = %key.0,
                        date = %key.1,
                        error = %err,
                        "Auto-close failed"
                    );
                    report.failures.push(SweepFailure {
                        employee_id: key.0,
                        date: key.1,
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            closed = report.closed.len(),
            skipped = report.skipped.len(),
            failures = report.failures.len(),
            "Auto-close sweep finished"
        );
        report
    }

    /// Sweeps on the configured interval until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker =
            tokio::time::interval(Duration::from_secs(self.policy.interval_secs.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep().await;
                }
                _ = cancel.cancelled() => {
                    info!("Auto-close loop shutting down");
                    break;
                }
            }
        }
    }
}
