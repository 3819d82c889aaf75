use chrono::NaiveDate;
use inclinic::clock::Clock;
use inclinic::config::StorageConfig;
use inclinic::error::AppError;
use inclinic::storage::{SqliteReportingStore, SqliteTransactionalStore};
use inclinic::workflows::reporting::ReportingMigrator;
use inclinic::workflows::sharing::{LinkComposer, ShareService};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) type SqliteShareService = ShareService<SqliteTransactionalStore, SqliteTransactionalStore>;
pub(crate) type SqliteMigrator = ReportingMigrator<SqliteTransactionalStore, SqliteReportingStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// The two independent stores backing the service.
pub(crate) struct Stores {
    pub(crate) transactional: Arc<SqliteTransactionalStore>,
    pub(crate) reporting: Arc<SqliteReportingStore>,
}

impl Stores {
    pub(crate) fn open(config: &StorageConfig) -> Result<Self, AppError> {
        let transactional = SqliteTransactionalStore::open(&config.transactional_path)?;
        let reporting = SqliteReportingStore::open(&config.reporting_path)?;
        info!(
            transactional = %config.transactional_path.display(),
            reporting = %config.reporting_path.display(),
            "stores opened"
        );
        Ok(Self {
            transactional: Arc::new(transactional),
            reporting: Arc::new(reporting),
        })
    }

    pub(crate) fn in_memory() -> Result<Self, AppError> {
        Ok(Self {
            transactional: Arc::new(SqliteTransactionalStore::open_in_memory()?),
            reporting: Arc::new(SqliteReportingStore::open_in_memory()?),
        })
    }

    pub(crate) fn share_service(
        &self,
        clock: Arc<dyn Clock>,
        links: LinkComposer,
    ) -> Arc<SqliteShareService> {
        Arc::new(ShareService::new(
            self.transactional.clone(),
            self.transactional.clone(),
            clock,
            links,
        ))
    }

    pub(crate) fn migrator(&self) -> Arc<SqliteMigrator> {
        Arc::new(ReportingMigrator::new(
            self.transactional.clone(),
            self.reporting.clone(),
        ))
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_iso_dates_with_whitespace() {
        assert_eq!(
            parse_date(" 2025-03-14 "),
            Ok(NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date"))
        );
        assert!(parse_date("14/03/2025").is_err());
    }
}
