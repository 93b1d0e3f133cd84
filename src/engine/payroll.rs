//! Payroll service: single and bulk salary runs.
//!
//! A bulk run fans out over a bounded worker pool (a semaphore sized from
//! the payroll policy feeding a `JoinSet`). Each employee's result is
//! independent; aggregation happens once every task has finished.
//! Cancellation is cooperative: tasks already running complete, employees
//! not yet scheduled are reported as not started.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::calculation::{SalaryInputs, compute_salary, working_days_in_period};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{BulkSalaryOutcome, PayPeriod, SalaryCalculation, SalaryFailure};
use crate::sources::RosterSource;
use crate::store::AttendanceStore;

/// Computes and persists salary results.
#[derive(Clone)]
pub struct SalaryCalculator {
    store: Arc<dyn AttendanceStore>,
    roster: Arc<dyn RosterSource>,
    clock: Arc<dyn Clock>,
    config: Arc<EngineConfig>,
}

impl SalaryCalculator {
    /// Creates a calculator.
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        roster: Arc<dyn RosterSource>,
        clock: Arc<dyn Clock>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            store,
            roster,
            clock,
            config,
        }
    }

    /// Working days used when the caller does not supply them.
    pub fn default_working_days(&self, period: &PayPeriod) -> u32 {
        working_days_in_period(period, &self.config.settings().payroll.public_holidays)
    }

    /// Calculates, stores and returns one employee's salary for a period.
    ///
    /// A stored result for the same employee and period is superseded.
    pub async fn calculate(
        &self,
        employee_id: &str,
        period: PayPeriod,
        working_days: Option<u32>,
    ) -> EngineResult<SalaryCalculation> {
        let employee = self
            .roster
            .employee(employee_id)
            .await?
            .ok_or_else(|| EngineError::EmployeeNotFound {
                employee_id: employee_id.to_string(),
            })?;
        let working_days = working_days.unwrap_or_else(|| self.default_working_days(&period));
        let records = self
            .store
            .records_between(employee_id, period.start_date(), period.end_date())
            .await?;

        let calculation = compute_salary(
            SalaryInputs {
                employee: &employee,
                period,
                working_days,
                records: &records,
                policy: &self.config.settings().payroll,
            },
            self.clock.now(),
        )?;

        self.store.put_salary(calculation.clone()).await?;
        info!(
            employee_id = %employee_id,
            period = %period,
            calculation_id = %calculation.calculation_id,
            present_days = calculation.present_days,
            working_days = calculation.working_days,
            net_pay = %calculation.net_pay,
            duration_us = calculation.audit_trace.duration_us,
            "Salary calculated"
        );
        Ok(calculation)
    }

    /// Calculates every active employee's salary for a period.
    ///
    /// Only batch-level problems (invalid working days, roster unavailable)
    /// fail the whole call; per-employee errors land in `failures`.
    pub async fn calculate_bulk(
        &self,
        period: PayPeriod,
        working_days: Option<u32>,
        cancel: CancellationToken,
    ) -> EngineResult<BulkSalaryOutcome> {
        let working_days = working_days.unwrap_or_else(|| self.default_working_days(&period));
        if working_days == 0 {
            return Err(EngineError::validation(
                "working_days",
                format!("must be greater than zero for {}", period),
            ));
        }
        let employees = self.roster.active_employees().await?;
        let pool_size = self.config.settings().payroll.worker_pool_size.max(1);
        let semaphore = Arc::new(Semaphore::new(pool_size));

        info!(
            period = %period,
            employees = employees.len(),
            working_days,
            pool_size,
            "Bulk salary run started"
        );

        let mut tasks = JoinSet::new();
        let mut scheduled: Vec<(usize, String)> = Vec::new();
        let mut not_started = Vec::new();

        let mut remaining = employees.into_iter().enumerate();
        for (index, employee) in remaining.by_ref() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                not_started.push(employee.id);
                break;
            };

            scheduled.push((index, employee.id.clone()));
            let calculator = self.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let result = calculator
                    .calculate(&employee.id, period, Some(working_days))
                    .await;
                (index, employee.id, result)
            });
        }
        not_started.extend(remaining.map(|(_, e)| e.id));

        let mut successes: Vec<(usize, SalaryCalculation)> = Vec::new();
        let mut failures: Vec<(usize, SalaryFailure)> = Vec::new();
        let mut finished: HashSet<usize> = HashSet::new();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, _, Ok(calculation))) => {
                    finished.insert(index);
                    successes.push((index, calculation));
                }
                Ok((index, employee_id, Err(err))) => {
                    warn!(
                        employee_id = %employee_id,
                        period = %period,
                        error = %err,
                        "Salary calculation failed"
                    );
                    finished.insert(index);
                    failures.push((
                        index,
                        SalaryFailure {
                            employee_id,
                            error: err.to_string(),
                        },
                    ));
                }
                Err(join_error) => {
                    warn!(period = %period, error = %join_error, "Salary worker task failed");
                }
            }
        }

        for (index, employee_id) in scheduled {
            if !finished.contains(&index) {
                failures.push((
                    index,
                    SalaryFailure {
                        employee_id,
                        error: "salary worker task did not complete".to_string(),
                    },
                ));
            }
        }

        successes.sort_by_key(|(index, _)| *index);
        failures.sort_by_key(|(index, _)| *index);

        let outcome = BulkSalaryOutcome {
            period,
            successes: successes.into_iter().map(|(_, c)| c).collect(),
            failures: failures.into_iter().map(|(_, f)| f).collect(),
            not_started,
            cancelled: cancel.is_cancelled(),
        };
        info!(
            period = %period,
            successes = outcome.successes.len(),
            failures = outcome.failures.len(),
            not_started = outcome.not_started.len(),
            cancelled = outcome.cancelled,
            "Bulk salary run finished"
        );
        Ok(outcome)
    }
}
