use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::button::button_state;
use super::domain::{
    ActivityEvent, ActivityEventKind, ButtonState, CampaignCycle, CycleId, Doctor, FieldRepId,
    NewActivityEvent, NewShareRecord, ShareRecord, ShareStatus, ShareToken, UnknownEventKind,
};
use super::messaging::LinkComposer;
use super::repository::{CampaignDirectory, RepositoryError, ShareRepository};
use crate::clock::Clock;

/// Token collisions are astronomically unlikely; a couple of retries keeps the insert total.
const TOKEN_ATTEMPTS: usize = 3;

/// Default numeric payload of an activity event.
pub const DEFAULT_EVENT_VALUE: f64 = 1.0;

/// Request accepted by [`ShareService::issue_share`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueShareRequest {
    pub field_rep_id: FieldRepId,
    pub cycle_id: CycleId,
    pub doctor_contact: String,
    pub is_reminder: bool,
}

/// Result of issuing a share: the persisted record plus the outbound link.
#[derive(Debug, Clone)]
pub struct IssuedShare {
    pub share: ShareRecord,
    pub doctor: Doctor,
    pub verification_url: String,
    pub share_link: String,
}

/// Collateral rendered to a doctor after landing.
#[derive(Debug, Clone, Serialize)]
pub struct LandingView {
    pub token: ShareToken,
    pub status: ShareStatus,
    pub read_at: Option<DateTime<Utc>>,
    pub title: String,
    pub pdf_url: String,
    pub video_url: String,
}

/// Prompt shown when a doctor opens the link from the share message.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyPrompt {
    pub token: ShareToken,
    pub brand_name: String,
    pub title: String,
    pub verify_url: String,
    pub landing_url: String,
}

/// Dashboard row for a field representative's sent shares.
#[derive(Debug, Clone, Serialize)]
pub struct ShareStatusView {
    pub token: ShareToken,
    pub doctor_contact: String,
    pub cycle_id: CycleId,
    pub is_reminder: bool,
    pub status: ShareStatus,
    pub shared_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub button_state: ButtonState,
}

/// Service driving the share → verify → land lifecycle and recording engagement.
pub struct ShareService<D, R> {
    directory: Arc<D>,
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
    links: LinkComposer,
}

impl<D, R> ShareService<D, R>
where
    D: CampaignDirectory + 'static,
    R: ShareRepository + 'static,
{
    pub fn new(
        directory: Arc<D>,
        repository: Arc<R>,
        clock: Arc<dyn Clock>,
        links: LinkComposer,
    ) -> Self {
        Self {
            directory,
            repository,
            clock,
            links,
        }
    }

    /// Map a contact address to its doctor, creating the doctor on first contact.
    pub fn resolve_doctor(&self, contact: &str) -> Result<Doctor, SharingError> {
        let contact = contact.trim();
        if contact.is_empty() {
            return Err(SharingError::Validation(
                "doctor contact must not be empty".to_string(),
            ));
        }
        Ok(self.repository.get_or_create_doctor(contact)?)
    }

    /// Issue a new share of `cycle` from an active field representative to a doctor.
    pub fn issue_share(&self, request: IssueShareRequest) -> Result<IssuedShare, SharingError> {
        let IssueShareRequest {
            field_rep_id,
            cycle_id,
            doctor_contact,
            is_reminder,
        } = request;

        let rep = self
            .directory
            .field_rep(field_rep_id)?
            .ok_or_else(|| SharingError::not_found("field representative", field_rep_id))?;
        if !rep.is_active {
            return Err(SharingError::InactiveRep(field_rep_id));
        }

        // Cycles are only visible within the representative's own campaign.
        let cycle = self
            .directory
            .cycle(cycle_id)?
            .filter(|cycle| cycle.campaign_id == rep.campaign_id)
            .ok_or_else(|| SharingError::not_found("campaign cycle", cycle_id))?;

        let doctor = self.resolve_doctor(&doctor_contact)?;
        let share = self.insert_with_fresh_token(&cycle, rep.id, &doctor, is_reminder)?;

        info!(
            field_rep = %rep.id,
            cycle = %cycle.id,
            doctor = %doctor.id,
            is_reminder,
            "share issued"
        );

        let verification_url = self.links.verification_url(&share.token);
        let share_link =
            self.links
                .compose_share_link(&doctor.contact, &share.message, &share.token);

        Ok(IssuedShare {
            share,
            doctor,
            verification_url,
            share_link,
        })
    }

    fn insert_with_fresh_token(
        &self,
        cycle: &CampaignCycle,
        field_rep_id: FieldRepId,
        doctor: &Doctor,
        is_reminder: bool,
    ) -> Result<ShareRecord, SharingError> {
        let shared_at = self.clock.now();
        for _ in 0..TOKEN_ATTEMPTS {
            let candidate = NewShareRecord {
                token: ShareToken::generate(),
                campaign_id: cycle.campaign_id,
                cycle_id: cycle.id,
                field_rep_id,
                doctor_id: doctor.id,
                message: cycle.message_template.clone(),
                is_reminder,
                shared_at,
            };
            match self.repository.insert_share(candidate) {
                Ok(share) => return Ok(share),
                Err(RepositoryError::Conflict) => {
                    warn!("share token collision, drawing a new token");
                }
                Err(other) => return Err(other.into()),
            }
        }
        Err(RepositoryError::Conflict.into())
    }

    /// Open the shared link: records a link click and returns what the doctor must confirm.
    pub fn open_link(&self, token: &ShareToken) -> Result<VerifyPrompt, SharingError> {
        let share = self.share(token)?;
        self.record(&share, ActivityEventKind::LinkClick, DEFAULT_EVENT_VALUE)?;

        let cycle = self
            .directory
            .cycle(share.cycle_id)?
            .ok_or_else(|| SharingError::not_found("campaign cycle", share.cycle_id))?;
        let campaign = self
            .directory
            .campaign(share.campaign_id)?
            .ok_or_else(|| SharingError::not_found("campaign", share.campaign_id))?;

        Ok(VerifyPrompt {
            verify_url: self.links.verification_url(&share.token),
            landing_url: self.links.landing_url(&share.token),
            token: share.token,
            brand_name: campaign.brand_name,
            title: cycle.title,
        })
    }

    /// Confirm the doctor's identity for a share.
    ///
    /// A link-click event is appended before the contact comparison, so failed attempts are
    /// tracked too. On a match the doctor's verification timestamp is refreshed.
    pub fn verify(
        &self,
        token: &ShareToken,
        submitted_contact: &str,
    ) -> Result<Doctor, SharingError> {
        let share = self.share(token)?;
        self.record(&share, ActivityEventKind::LinkClick, DEFAULT_EVENT_VALUE)?;

        let doctor = self
            .repository
            .doctor(share.doctor_id)?
            .ok_or_else(|| SharingError::not_found("doctor", share.doctor_id))?;

        if submitted_contact != doctor.contact {
            warn!(share = %share.id, "verification contact mismatch");
            return Err(SharingError::Validation(
                "contact does not match the share recipient".to_string(),
            ));
        }

        let verified_at = self.clock.now();
        self.repository
            .mark_doctor_verified(doctor.id, verified_at)?;

        Ok(Doctor {
            verified_at: Some(verified_at),
            ..doctor
        })
    }

    /// Land on the shared collateral, moving the share from `sent` to `read` on first visit.
    ///
    /// Repeat visits leave the original `read_at` untouched but still append a landing-visit
    /// event.
    pub fn land(&self, token: &ShareToken) -> Result<LandingView, SharingError> {
        let mut share = self.share(token)?;
        self.record(&share, ActivityEventKind::LandingVisit, DEFAULT_EVENT_VALUE)?;

        if share.status == ShareStatus::Sent {
            let read_at = self.clock.now();
            if self.repository.mark_share_read(share.id, read_at)? {
                info!(share = %share.id, "share read for the first time");
            }
            // Re-read so a concurrent first landing's timestamp wins.
            share = self.share(token)?;
        }

        let cycle = self
            .directory
            .cycle(share.cycle_id)?
            .ok_or_else(|| SharingError::not_found("campaign cycle", share.cycle_id))?;

        Ok(LandingView {
            token: share.token,
            status: share.status,
            read_at: share.read_at,
            title: cycle.title,
            pdf_url: cycle.pdf_url,
            video_url: cycle.video_url,
        })
    }

    /// Tracking endpoint entry point: validates the raw kind then records it.
    pub fn track(
        &self,
        token: &ShareToken,
        kind: &str,
        value: Option<f64>,
    ) -> Result<ActivityEvent, SharingError> {
        let kind: ActivityEventKind = kind.parse()?;
        let share = self.share(token)?;
        self.record(&share, kind, value.unwrap_or(DEFAULT_EVENT_VALUE))
    }

    /// Append an event against `share`, denormalizing the share's doctor at write time.
    pub fn record(
        &self,
        share: &ShareRecord,
        kind: ActivityEventKind,
        value: f64,
    ) -> Result<ActivityEvent, SharingError> {
        if !value.is_finite() {
            return Err(SharingError::Validation(format!(
                "event value must be finite, got {value}"
            )));
        }
        let event = self.repository.append_event(NewActivityEvent {
            share_id: share.id,
            doctor_id: share.doctor_id,
            kind,
            value,
            created_at: self.clock.now(),
        })?;
        Ok(event)
    }

    /// Shares sent by a field representative with their freshly derived button state.
    pub fn shares_for_rep(
        &self,
        field_rep_id: FieldRepId,
    ) -> Result<Vec<ShareStatusView>, SharingError> {
        self.directory
            .field_rep(field_rep_id)?
            .ok_or_else(|| SharingError::not_found("field representative", field_rep_id))?;

        let now = self.clock.now();
        self.repository
            .shares_for_rep(field_rep_id)?
            .into_iter()
            .map(|share| -> Result<ShareStatusView, SharingError> {
                let doctor = self
                    .repository
                    .doctor(share.doctor_id)?
                    .ok_or_else(|| SharingError::not_found("doctor", share.doctor_id))?;
                Ok(ShareStatusView {
                    button_state: button_state(&share, now),
                    token: share.token,
                    doctor_contact: doctor.contact,
                    cycle_id: share.cycle_id,
                    is_reminder: share.is_reminder,
                    status: share.status,
                    shared_at: share.shared_at,
                    read_at: share.read_at,
                })
            })
            .collect()
    }

    pub fn share(&self, token: &ShareToken) -> Result<ShareRecord, SharingError> {
        if !ShareToken::is_well_formed(token.as_str()) {
            return Err(SharingError::not_found("share", token));
        }
        self.repository
            .share_by_token(token)?
            .ok_or_else(|| SharingError::not_found("share", token))
    }

    pub fn events(&self, token: &ShareToken) -> Result<Vec<ActivityEvent>, SharingError> {
        let share = self.share(token)?;
        Ok(self.repository.events_for_share(share.id)?)
    }
}

/// Error raised by the sharing workflow.
#[derive(Debug, thiserror::Error)]
pub enum SharingError {
    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },
    #[error("{0}")]
    Validation(String),
    #[error("field representative {0} is inactive")]
    InactiveRep(FieldRepId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl SharingError {
    fn not_found(entity: &'static str, key: impl ToString) -> Self {
        SharingError::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

impl From<UnknownEventKind> for SharingError {
    fn from(value: UnknownEventKind) -> Self {
        SharingError::Validation(value.to_string())
    }
}
