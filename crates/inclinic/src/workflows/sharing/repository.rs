use chrono::{DateTime, Utc};

use super::domain::{
    ActivityEvent, Campaign, CampaignCycle, CampaignId, CycleId, Doctor, DoctorId, FieldRepId,
    FieldRepresentative, NewActivityEvent, NewShareRecord, ShareId, ShareRecord, ShareToken,
};
use crate::storage::routing::RoutingError;

/// Read-only lookups into the publisher-managed campaign configuration.
pub trait CampaignDirectory: Send + Sync {
    fn campaign(&self, id: CampaignId) -> Result<Option<Campaign>, RepositoryError>;
    fn cycle(&self, id: CycleId) -> Result<Option<CampaignCycle>, RepositoryError>;
    fn field_rep(&self, id: FieldRepId) -> Result<Option<FieldRepresentative>, RepositoryError>;
}

/// Transactional storage for doctors, shares, and their activity log.
pub trait ShareRepository: Send + Sync {
    /// Return the doctor registered under `contact`, creating it on first contact.
    fn get_or_create_doctor(&self, contact: &str) -> Result<Doctor, RepositoryError>;
    fn doctor(&self, id: DoctorId) -> Result<Option<Doctor>, RepositoryError>;
    fn mark_doctor_verified(&self, id: DoctorId, at: DateTime<Utc>)
        -> Result<(), RepositoryError>;

    /// Fails with [`RepositoryError::Conflict`] when the token is already taken.
    fn insert_share(&self, share: NewShareRecord) -> Result<ShareRecord, RepositoryError>;
    fn share_by_token(&self, token: &ShareToken) -> Result<Option<ShareRecord>, RepositoryError>;
    /// Move a `sent` share to `read`. Returns `false` when the share was already read.
    fn mark_share_read(&self, id: ShareId, at: DateTime<Utc>) -> Result<bool, RepositoryError>;
    /// Shares sent by a field representative, newest first.
    fn shares_for_rep(&self, id: FieldRepId) -> Result<Vec<ShareRecord>, RepositoryError>;

    fn append_event(&self, event: NewActivityEvent) -> Result<ActivityEvent, RepositoryError>;
    fn events_for_share(&self, id: ShareId) -> Result<Vec<ActivityEvent>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("stored row is malformed: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Routing(#[from] RoutingError),
}
