//! Biometric upload ingestion.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::reconcile::ReconciliationEngine;
use crate::calculation::group_punch_rows;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{BiometricPunch, RawPunchRow, SkippedRow};
use crate::store::AttendanceStore;

/// A key whose punches were parsed but could not be stored or reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyError {
    /// The employee.
    pub employee_id: String,
    /// The date.
    pub date: NaiveDate,
    /// The error, rendered.
    pub message: String,
}

/// Summary of one upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReport {
    /// Identifier stamped on every punch from this upload.
    pub source_file_id: String,
    /// Rows that contributed to a punch.
    pub processed: usize,
    /// Rows that were not used, with reasons.
    pub skipped: Vec<SkippedRow>,
    /// Keys that failed after parsing.
    pub errors: Vec<KeyError>,
    /// Distinct `(employee, date)` keys touched.
    pub keys: usize,
}

impl UploadReport {
    /// The skipped rows as per-row errors.
    pub fn row_errors(&self) -> Vec<EngineError> {
        self.skipped
            .iter()
            .map(|s| EngineError::IngestionRow {
                row: s.row,
                reason: s.reason.to_string(),
            })
            .collect()
    }
}

/// Normalizes punch uploads and reconciles the affected days.
#[derive(Clone)]
pub struct BiometricIngestor {
    store: Arc<dyn AttendanceStore>,
    reconciler: ReconciliationEngine,
    config: Arc<EngineConfig>,
}

impl BiometricIngestor {
    /// Creates an ingestor.
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        reconciler: ReconciliationEngine,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            store,
            reconciler,
            config,
        }
    }

    /// Ingests already-parsed rows.
    ///
    /// Each `(employee, date)` in the upload has its stored punches
    /// replaced, then is reconciled. Failures on one key do not stop the
    /// others.
    pub async fn upload(
        &self,
        rows: &[RawPunchRow],
        source_file_id: &str,
    ) -> EngineResult<UploadReport> {
        if source_file_id.trim().is_empty() {
            return Err(EngineError::validation(
                "source_file_id",
                "must not be empty",
            ));
        }

        let grouping = group_punch_rows(rows, self.config.devices(), source_file_id);

        let mut by_key: BTreeMap<(String, NaiveDate), Vec<BiometricPunch>> = BTreeMap::new();
        for punch in grouping.punches {
            by_key
                .entry((punch.employee_id.clone(), punch.date))
                .or_default()
                .push(punch);
        }

        let mut errors = Vec::new();
        let keys = by_key.len();
        for ((employee_id, date), punches) in by_key {
            let result = async {
                self.store
                    .replace_punches(&employee_id, date, punches)
                    .await?;
                self.reconciler.reconcile(&employee_id, date).await
            }
            .await;

            if let Err(err) = result {
                warn!(
                    employee_id = %employee_id,
                    date = %date,
                    error = %err,
                    "Failed to apply biometric punches"
                );
                errors.push(KeyError {
                    employee_id,
                    date,
                    message: err.to_string(),
                });
            }
        }

        for skipped in &grouping.skipped {
            warn!(
                source_file_id = %source_file_id,
                row = skipped.row,
                reason = %skipped.reason,
                "Skipped biometric row"
            );
        }

        let report = UploadReport {
            source_file_id: source_file_id.to_string(),
            processed: rows.len() - grouping.skipped.len(),
            skipped: grouping.skipped,
            errors,
            keys,
        };
        info!(
            source_file_id = %source_file_id,
            rows = rows.len(),
            processed = report.processed,
            skipped = report.skipped.len(),
            errors = report.errors.len(),
            keys = report.keys,
            "Biometric upload ingested"
        );
        Ok(report)
    }
}
