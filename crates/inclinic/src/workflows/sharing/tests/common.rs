use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::StatusCode;
use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::clock::FixedClock;
use crate::storage::transactional::{NewCampaign, NewCampaignCycle, NewFieldRepresentative};
use crate::storage::SqliteTransactionalStore;
use crate::workflows::sharing::domain::{
    ActivityEvent, Campaign, CampaignCycle, CampaignId, CycleId, Doctor, DoctorId,
    FieldRepId, FieldRepresentative, NewActivityEvent, NewShareRecord, ShareId, ShareRecord,
    ShareToken,
};
use crate::workflows::sharing::repository::{
    CampaignDirectory, RepositoryError, ShareRepository,
};
use crate::workflows::sharing::{LinkComposer, ShareService};

pub(super) const BASE_URL: &str = "https://inclinic.test";
pub(super) const DOCTOR_CONTACT: &str = "+91 98765 43210";

pub(super) type SqliteShareService = ShareService<SqliteTransactionalStore, SqliteTransactionalStore>;

pub(super) fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, 9, 30, 0).unwrap()
}

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).expect("valid date")
}

/// Seeded in-memory store with one campaign, one cycle, and one active representative.
pub(super) struct Fixture {
    pub store: Arc<SqliteTransactionalStore>,
    pub clock: Arc<FixedClock>,
    pub service: Arc<SqliteShareService>,
    pub campaign: Campaign,
    pub cycle: CampaignCycle,
    pub rep: FieldRepresentative,
}

impl Fixture {
    pub fn new() -> Self {
        let store = Arc::new(SqliteTransactionalStore::open_in_memory().expect("store opens"));
        let clock = Arc::new(FixedClock::new(start()));

        let campaign = store
            .insert_campaign(
                NewCampaign {
                    name: "Cardio Awareness".to_string(),
                    brand_name: "Cardiozen".to_string(),
                    description: "Hypertension collateral".to_string(),
                    start_date: date(3, 1),
                    end_date: date(6, 30),
                },
                date(3, 1),
            )
            .expect("campaign inserted");
        let cycle = store
            .insert_cycle(cycle_for(campaign.id, 1))
            .expect("cycle inserted");
        let rep = store
            .insert_field_rep(NewFieldRepresentative {
                campaign_id: campaign.id,
                name: "Asha Rao".to_string(),
                email: "asha@example.com".to_string(),
                contact: "+91 90000 00001".to_string(),
            })
            .expect("rep inserted");

        let service = Arc::new(ShareService::new(
            store.clone(),
            store.clone(),
            clock.clone(),
            LinkComposer::new(BASE_URL),
        ));

        Self {
            store,
            clock,
            service,
            campaign,
            cycle,
            rep,
        }
    }

    /// A second campaign with its own cycle, for cross-campaign checks.
    pub fn foreign_cycle(&self) -> CampaignCycle {
        let other = self
            .store
            .insert_campaign(
                NewCampaign {
                    name: "Diabetes Care".to_string(),
                    brand_name: "Glucosafe".to_string(),
                    description: String::new(),
                    start_date: date(4, 1),
                    end_date: date(9, 30),
                },
                date(4, 1),
            )
            .expect("campaign inserted");
        self.store
            .insert_cycle(cycle_for(other.id, 1))
            .expect("cycle inserted")
    }
}

pub(super) fn cycle_for(campaign_id: CampaignId, cycle_number: u32) -> NewCampaignCycle {
    NewCampaignCycle {
        campaign_id,
        cycle_number,
        title: format!("Cycle {cycle_number}: BP targets"),
        message_template: "Dear Doctor, please review the latest BP guidance.".to_string(),
        reminder_template: "Reminder: the BP guidance is waiting for you.".to_string(),
        pdf_url: "https://cdn.example.com/bp.pdf".to_string(),
        video_url: "https://cdn.example.com/bp.mp4".to_string(),
        start_date: date(3, 1),
        end_date: date(3, 31),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("valid json")
}

pub(super) fn json_request(method: &str, uri: &str, body: Value) -> axum::http::Request<Body> {
    axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

pub(super) fn empty_request(method: &str, uri: &str) -> axum::http::Request<Body> {
    axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

pub(super) fn assert_error_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected);
}

/// Directory and repository that fail every call, for the 500 mapping.
pub(super) struct UnavailableRepository;

fn unavailable() -> RepositoryError {
    RepositoryError::Unavailable("database is locked".to_string())
}

impl CampaignDirectory for UnavailableRepository {
    fn campaign(&self, _: CampaignId) -> Result<Option<Campaign>, RepositoryError> {
        Err(unavailable())
    }

    fn cycle(&self, _: CycleId) -> Result<Option<CampaignCycle>, RepositoryError> {
        Err(unavailable())
    }

    fn field_rep(&self, _: FieldRepId) -> Result<Option<FieldRepresentative>, RepositoryError> {
        Err(unavailable())
    }
}

impl ShareRepository for UnavailableRepository {
    fn get_or_create_doctor(&self, _: &str) -> Result<Doctor, RepositoryError> {
        Err(unavailable())
    }

    fn doctor(&self, _: DoctorId) -> Result<Option<Doctor>, RepositoryError> {
        Err(unavailable())
    }

    fn mark_doctor_verified(&self, _: DoctorId, _: DateTime<Utc>) -> Result<(), RepositoryError> {
        Err(unavailable())
    }

    fn insert_share(&self, _: NewShareRecord) -> Result<ShareRecord, RepositoryError> {
        Err(unavailable())
    }

    fn share_by_token(&self, _: &ShareToken) -> Result<Option<ShareRecord>, RepositoryError> {
        Err(unavailable())
    }

    fn mark_share_read(&self, _: ShareId, _: DateTime<Utc>) -> Result<bool, RepositoryError> {
        Err(unavailable())
    }

    fn shares_for_rep(&self, _: FieldRepId) -> Result<Vec<ShareRecord>, RepositoryError> {
        Err(unavailable())
    }

    fn append_event(&self, _: NewActivityEvent) -> Result<ActivityEvent, RepositoryError> {
        Err(unavailable())
    }

    fn events_for_share(&self, _: ShareId) -> Result<Vec<ActivityEvent>, RepositoryError> {
        Err(unavailable())
    }
}

pub(super) fn unavailable_service() -> Arc<ShareService<UnavailableRepository, UnavailableRepository>>
{
    Arc::new(ShareService::new(
        Arc::new(UnavailableRepository),
        Arc::new(UnavailableRepository),
        Arc::new(FixedClock::new(start())),
        LinkComposer::new(BASE_URL),
    ))
}
