//! Work session lifecycle.
//!
//! ```text
//! NotStarted ──start──▶ InProgress ──end──▶ Completed
//!     │                     │
//!     │                     └──auto_close──▶ AutoClosed
//!     └── (approved leave) ── OnLeave
//! ```
//!
//! Sessions are durable rows keyed by `(employee_id, date)`. Every
//! transition is a conditional write on the store, so concurrent callers
//! cannot both succeed.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::progress_gate::ProgressGate;
use super::reconcile::ReconciliationEngine;
use crate::calculation::{check_geofence, classify_work_location};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::events::EventSink;
use crate::models::{
    CheckedLocation, ClosedBy, Coordinate, DailyAttendanceRecord, DiscrepancyFlag, EventType,
    SessionStatus, StateChangeEvent, WorkLocationTag, WorkSession,
};
use crate::sources::LeaveSource;
use crate::store::AttendanceStore;

/// The session and record produced by a transition that closes a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedDay {
    /// The closed session.
    pub session: WorkSession,
    /// The reconciled daily record.
    pub record: DailyAttendanceRecord,
}

/// Drives sessions through their lifecycle.
#[derive(Clone)]
pub struct SessionStateMachine {
    store: Arc<dyn AttendanceStore>,
    leave: Arc<dyn LeaveSource>,
    gate: ProgressGate,
    reconciler: ReconciliationEngine,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    config: Arc<EngineConfig>,
}

impl SessionStateMachine {
    /// Creates a state machine.
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        leave: Arc<dyn LeaveSource>,
        gate: ProgressGate,
        reconciler: ReconciliationEngine,
        events: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            store,
            leave,
            gate,
            reconciler,
            events,
            clock,
            config,
        }
    }

    /// Checks a coordinate against the configured worksites.
    fn checked_location(&self, coordinate: Coordinate) -> EngineResult<CheckedLocation> {
        let geofence = check_geofence(
            &coordinate,
            self.config.worksites(),
            self.config.settings().geofence.default_radius_m,
        )?;
        Ok(CheckedLocation {
            coordinate,
            geofence,
        })
    }

    async fn on_leave(&self, employee_id: &str, date: NaiveDate) -> EngineResult<bool> {
        let leaves = self.leave.leaves_for(employee_id, date, date).await?;
        Ok(leaves.iter().any(|l| l.approved_on(date)))
    }

    async fn publish(&self, event_type: EventType, session: &WorkSession) {
        self.events
            .publish(StateChangeEvent {
                event_type,
                employee_id: session.employee_id.clone(),
                date: session.date,
                new_status: session.status,
                occurred_at: self.clock.now(),
            })
            .await;
    }

    /// The current state of a workday.
    pub async fn status(&self, employee_id: &str, date: NaiveDate) -> EngineResult<SessionStatus> {
        if let Some(session) = self.store.get_session(employee_id, date).await? {
            return Ok(session.status);
        }
        if self.on_leave(employee_id, date).await? {
            Ok(SessionStatus::OnLeave)
        } else {
            Ok(SessionStatus::NotStarted)
        }
    }

    /// NotStarted → InProgress.
    ///
    /// # Errors
    ///
    /// - [`EngineError::AlreadyStarted`] if a session exists for the key.
    /// - [`EngineError::OnLeave`] if approved leave covers the date.
    /// - [`EngineError::LocationRequired`] if outside every geofence without
    ///   a Home/Remote assertion.
    pub async fn start(
        &self,
        employee_id: &str,
        date: NaiveDate,
        coordinate: Coordinate,
        asserted: Option<WorkLocationTag>,
    ) -> EngineResult<WorkSession> {
        if self.store.get_session(employee_id, date).await?.is_some() {
            return Err(EngineError::AlreadyStarted {
                employee_id: employee_id.to_string(),
                date,
            });
        }
        if self.on_leave(employee_id, date).await? {
            return Err(EngineError::OnLeave {
                employee_id: employee_id.to_string(),
                date,
            });
        }

        let start_location = self.checked_location(coordinate)?;
        let work_location = classify_work_location(&start_location.geofence, asserted)?;

        let session = WorkSession {
            employee_id: employee_id.to_string(),
            date,
            start_time: Some(self.clock.now()),
            end_time: None,
            start_location,
            end_location: None,
            work_location,
            closed_by: None,
            status: SessionStatus::InProgress,
            flags: Vec::new(),
        };
        self.store.create_session(session.clone()).await?;

        info!(
            employee_id = %employee_id,
            date = %date,
            work_location = ?work_location,
            nearest_site = ?session.start_location.geofence.nearest_site_id,
            distance_m = ?session.start_location.geofence.distance_m,
            confidence = ?session.start_location.geofence.confidence,
            "Day started"
        );
        self.publish(EventType::DayStarted, &session).await;
        Ok(session)
    }

    /// InProgress → Completed, then reconcile.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotStarted`] if no session exists.
    /// - [`EngineError::InvalidTransition`] if the session is already closed.
    /// - [`EngineError::ProgressRequired`] if the progress gate is unmet.
    pub async fn end(
        &self,
        employee_id: &str,
        date: NaiveDate,
        coordinate: Option<Coordinate>,
    ) -> EngineResult<ClosedDay> {
        let Some(session) = self.store.get_session(employee_id, date).await? else {
            return Err(EngineError::NotStarted {
                employee_id: employee_id.to_string(),
                date,
            });
        };
        if session.status != SessionStatus::InProgress {
            return Err(EngineError::InvalidTransition {
                employee_id: employee_id.to_string(),
                date,
                from: session.status,
                to: SessionStatus::Completed,
            });
        }

        if !self.gate.check(employee_id, date).await? {
            warn!(employee_id = %employee_id, date = %date, "End of day blocked by progress gate");
            return Err(EngineError::ProgressRequired {
                employee_id: employee_id.to_string(),
                date,
            });
        }

        let end_location = coordinate.map(|c| self.checked_location(c)).transpose()?;
        let completed = WorkSession {
            end_time: Some(self.clock.now()),
            end_location,
            closed_by: Some(ClosedBy::User),
            status: SessionStatus::Completed,
            ..session
        };
        self.store
            .replace_session(completed.clone(), SessionStatus::InProgress)
            .await?;

        info!(
            employee_id = %employee_id,
            date = %date,
            session_hours = ?completed.session_hours(),
            "Day ended"
        );
        self.publish(EventType::DayEnded, &completed).await;

        let record = self.reconciler.reconcile(employee_id, date).await?;
        Ok(ClosedDay {
            session: completed,
            record,
        })
    }

    /// InProgress → AutoClosed at `cutoff`, then reconcile. System-only.
    ///
    /// Only sessions dated before today can be auto-closed; today's session
    /// is an [`EngineError::InvalidTransition`].
    pub async fn auto_close(
        &self,
        employee_id: &str,
        date: NaiveDate,
        cutoff: NaiveDateTime,
    ) -> EngineResult<ClosedDay> {
        let Some(session) = self.store.get_session(employee_id, date).await? else {
            return Err(EngineError::NotStarted {
                employee_id: employee_id.to_string(),
                date,
            });
        };
        if session.status != SessionStatus::InProgress || date >= self.clock.today() {
            return Err(EngineError::InvalidTransition {
                employee_id: employee_id.to_string(),
                date,
                from: session.status,
                to: SessionStatus::AutoClosed,
            });
        }

        let mut flags = session.flags.clone();
        if !flags.contains(&DiscrepancyFlag::AutoClosedNoExplicitEnd) {
            flags.push(DiscrepancyFlag::AutoClosedNoExplicitEnd);
        }
        let closed = WorkSession {
            end_time: Some(cutoff),
            closed_by: Some(ClosedBy::AutoCloser),
            status: SessionStatus::AutoClosed,
            flags,
            ..session
        };
        self.store
            .replace_session(closed.clone(), SessionStatus::InProgress)
            .await?;

        info!(
            employee_id = %employee_id,
            date = %date,
            cutoff = %cutoff,
            "Session auto-closed"
        );
        self.publish(EventType::DayAutoClosed, &closed).await;

        let record = self.reconciler.reconcile(employee_id, date).await?;
        Ok(ClosedDay {
            session: closed,
            record,
        })
    }
}
