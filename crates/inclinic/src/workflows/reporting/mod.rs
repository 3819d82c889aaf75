//! Reporting store projection of the activity event log and the migrator that feeds it.

pub mod domain;
pub mod migrator;
pub mod repository;

pub use domain::{ActivityEventReport, InsertOutcome, PendingActivityEvent, ShareKeys};
pub use migrator::{MigrationError, ReportingMigrator, SyncOutcome};
pub use repository::{EventSource, ReportingRepository};
