use std::path::Path;

use rusqlite::{params, Row};

use super::routing::{EntityKind, StoreTarget};
use super::Database;
use crate::workflows::reporting::domain::{ActivityEventReport, InsertOutcome};
use crate::workflows::reporting::repository::ReportingRepository;
use crate::workflows::sharing::repository::RepositoryError;

const REPORT_COLUMNS: &str = "source_event_id, campaign_id, cycle_id, field_rep_id, doctor_id, \
                              event_type, value, occurred_at";

/// SQLite reporting store holding append-only activity event reports.
pub struct SqliteReportingStore {
    db: Database,
}

impl SqliteReportingStore {
    pub fn open(path: &Path) -> Result<Self, RepositoryError> {
        Ok(Self {
            db: Database::open(path, StoreTarget::Reporting)?,
        })
    }

    pub fn open_in_memory() -> Result<Self, RepositoryError> {
        Ok(Self {
            db: Database::open_in_memory(StoreTarget::Reporting)?,
        })
    }
}

impl ReportingRepository for SqliteReportingStore {
    fn insert_or_skip(
        &self,
        report: &ActivityEventReport,
    ) -> Result<InsertOutcome, RepositoryError> {
        self.db
            .with_conn(&[EntityKind::ActivityEventReport], |conn| {
                let tx = conn.transaction()?;
                let inserted = tx.execute(
                    &format!(
                        "INSERT INTO activity_event_reports ({REPORT_COLUMNS})
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                         ON CONFLICT(source_event_id) DO NOTHING"
                    ),
                    params![
                        report.source_event_id,
                        report.campaign_id,
                        report.cycle_id,
                        report.field_rep_id,
                        report.doctor_id,
                        report.event_kind,
                        report.value,
                        report.occurred_at
                    ],
                )?;
                tx.commit()?;
                Ok(if inserted == 1 {
                    InsertOutcome::Inserted
                } else {
                    InsertOutcome::AlreadyPresent
                })
            })
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        self.db
            .with_conn(&[EntityKind::ActivityEventReport], |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM activity_event_reports",
                    [],
                    |row| row.get(0),
                )?;
                Ok(count as usize)
            })
    }

    fn recent(&self, limit: usize) -> Result<Vec<ActivityEventReport>, RepositoryError> {
        self.db
            .with_conn(&[EntityKind::ActivityEventReport], |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {REPORT_COLUMNS} FROM activity_event_reports
                     ORDER BY occurred_at DESC, source_event_id DESC
                     LIMIT ?1"
                ))?;
                let limit = i64::try_from(limit).unwrap_or(i64::MAX);
                let reports = stmt
                    .query_map([limit], report_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(reports)
            })
    }
}

fn report_from_row(row: &Row<'_>) -> rusqlite::Result<ActivityEventReport> {
    Ok(ActivityEventReport {
        source_event_id: row.get(0)?,
        campaign_id: row.get(1)?,
        cycle_id: row.get(2)?,
        field_rep_id: row.get(3)?,
        doctor_id: row.get(4)?,
        event_kind: row.get(5)?,
        value: row.get(6)?,
        occurred_at: row.get(7)?,
    })
}
