use super::domain::{ActivityEventReport, InsertOutcome, PendingActivityEvent};
use crate::workflows::sharing::domain::EventId;
use crate::workflows::sharing::repository::RepositoryError;

/// Transactional side of the migration: the current event log and its batch delete.
pub trait EventSource: Send + Sync {
    fn pending_events(&self) -> Result<Vec<PendingActivityEvent>, RepositoryError>;
    /// Delete exactly `ids` in one transaction, returning the number of rows removed.
    fn delete_events(&self, ids: &[EventId]) -> Result<usize, RepositoryError>;
}

/// Append-only reporting store.
pub trait ReportingRepository: Send + Sync {
    /// Insert under its own transaction; an existing `source_event_id` is a silent no-op.
    fn insert_or_skip(&self, report: &ActivityEventReport)
        -> Result<InsertOutcome, RepositoryError>;
    fn count(&self) -> Result<usize, RepositoryError>;
    /// Most recent reports first.
    fn recent(&self, limit: usize) -> Result<Vec<ActivityEventReport>, RepositoryError>;
}
