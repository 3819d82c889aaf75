use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::sharing::domain::{
    ActivityEvent, ActivityEventKind, CampaignId, CycleId, DoctorId, EventId, FieldRepId,
};

/// Reporting-side projection of an activity event. `source_event_id` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEventReport {
    pub source_event_id: EventId,
    pub campaign_id: CampaignId,
    pub cycle_id: CycleId,
    pub field_rep_id: FieldRepId,
    pub doctor_id: DoctorId,
    pub event_kind: ActivityEventKind,
    pub value: f64,
    pub occurred_at: DateTime<Utc>,
}

/// Foreign keys of the share an event belongs to, joined in when the event is read for migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareKeys {
    pub campaign_id: CampaignId,
    pub cycle_id: CycleId,
    pub field_rep_id: FieldRepId,
}

/// Transactional event awaiting migration. `share` is `None` when the owning share row is gone.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingActivityEvent {
    pub event: ActivityEvent,
    pub share: Option<ShareKeys>,
}

impl PendingActivityEvent {
    pub fn to_report(&self) -> Result<ActivityEventReport, String> {
        let keys = self
            .share
            .ok_or_else(|| format!("share {} no longer exists", self.event.share_id))?;
        if !self.event.value.is_finite() {
            return Err(format!("value {} is not a finite number", self.event.value));
        }

        Ok(ActivityEventReport {
            source_event_id: self.event.id,
            campaign_id: keys.campaign_id,
            cycle_id: keys.cycle_id,
            field_rep_id: keys.field_rep_id,
            doctor_id: self.event.doctor_id,
            event_kind: self.event.kind,
            value: self.event.value,
            occurred_at: self.event.created_at,
        })
    }
}

/// Outcome of an idempotent reporting insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyPresent,
}
