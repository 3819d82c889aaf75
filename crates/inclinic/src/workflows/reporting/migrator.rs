use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use super::domain::{ActivityEventReport, InsertOutcome};
use super::repository::{EventSource, ReportingRepository};
use crate::storage::routing::{EntityKind, RoutingError, RoutingTable};
use crate::workflows::sharing::domain::EventId;
use crate::workflows::sharing::repository::RepositoryError;

/// Counters for one migration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub fetched: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub deleted: usize,
}

impl SyncOutcome {
    /// Events that left the transactional store during this run.
    pub fn moved(&self) -> usize {
        self.deleted
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("transactional store failed: {0}")]
    Transactional(#[source] RepositoryError),
    #[error("reporting store failed: {0}")]
    Reporting(#[source] RepositoryError),
    #[error("event {event_id} cannot be reported: {reason}")]
    Transform { event_id: EventId, reason: String },
    #[error("a reporting sync is already running")]
    AlreadyRunning,
    #[error(transparent)]
    Routing(#[from] RoutingError),
}

/// Moves raw activity events from the transactional store into the reporting store.
///
/// A run snapshots the pending events, writes every one of them to reporting with an
/// idempotent insert, and only then deletes exactly the snapshot from the transactional
/// store. Any failure before the delete leaves the transactional log untouched, so the
/// next run retries the whole snapshot and already-copied rows are skipped.
pub struct ReportingMigrator<S, R>
where
    S: EventSource,
    R: ReportingRepository,
{
    source: Arc<S>,
    reporting: Arc<R>,
    routes: RoutingTable,
    in_flight: AtomicBool,
}

struct Lease<'a>(&'a AtomicBool);

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S, R> ReportingMigrator<S, R>
where
    S: EventSource,
    R: ReportingRepository,
{
    pub fn new(source: Arc<S>, reporting: Arc<R>) -> Self {
        Self::with_routes(source, reporting, RoutingTable::standard())
    }

    pub fn with_routes(source: Arc<S>, reporting: Arc<R>, routes: RoutingTable) -> Self {
        Self {
            source,
            reporting,
            routes,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn reporting(&self) -> &Arc<R> {
        &self.reporting
    }

    pub fn sync(&self) -> Result<SyncOutcome, MigrationError> {
        let _lease = self.acquire()?;
        match self.run() {
            Ok(outcome) => {
                info!(
                    fetched = outcome.fetched,
                    inserted = outcome.inserted,
                    skipped = outcome.skipped,
                    deleted = outcome.deleted,
                    "reporting sync complete"
                );
                Ok(outcome)
            }
            Err(err) => {
                error!(error = %err, "reporting sync aborted; transactional events retained");
                Err(err)
            }
        }
    }

    fn acquire(&self) -> Result<Lease<'_>, MigrationError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| {
                warn!("reporting sync requested while another run is in flight");
                MigrationError::AlreadyRunning
            })?;
        Ok(Lease(&self.in_flight))
    }

    fn run(&self) -> Result<SyncOutcome, MigrationError> {
        self.routes
            .ensure_crossing(EntityKind::ActivityEvent, EntityKind::ActivityEventReport)?;

        let pending = self
            .source
            .pending_events()
            .map_err(MigrationError::Transactional)?;
        if pending.is_empty() {
            return Ok(SyncOutcome::default());
        }

        let reports = pending
            .iter()
            .map(|pending| {
                pending
                    .to_report()
                    .map_err(|reason| MigrationError::Transform {
                        event_id: pending.event.id,
                        reason,
                    })
            })
            .collect::<Result<Vec<ActivityEventReport>, _>>()?;

        let mut outcome = SyncOutcome {
            fetched: pending.len(),
            ..SyncOutcome::default()
        };
        for report in &reports {
            match self
                .reporting
                .insert_or_skip(report)
                .map_err(MigrationError::Reporting)?
            {
                InsertOutcome::Inserted => outcome.inserted += 1,
                InsertOutcome::AlreadyPresent => outcome.skipped += 1,
            }
        }

        let ids: Vec<EventId> = pending.iter().map(|pending| pending.event.id).collect();
        outcome.deleted = self
            .source
            .delete_events(&ids)
            .map_err(MigrationError::Transactional)?;
        Ok(outcome)
    }
}
