//! Reporting migration between two independent SQLite stores.

mod common {
    use std::sync::Arc;

    use chrono::{NaiveDate, TimeZone, Utc};

    use inclinic::clock::FixedClock;
    use inclinic::storage::transactional::{
        NewCampaign, NewCampaignCycle, NewFieldRepresentative,
    };
    use inclinic::storage::{SqliteReportingStore, SqliteTransactionalStore};
    use inclinic::workflows::reporting::ReportingMigrator;
    use inclinic::workflows::sharing::{
        IssueShareRequest, IssuedShare, LinkComposer, ShareService,
    };

    pub struct Stores {
        pub transactional: Arc<SqliteTransactionalStore>,
        pub reporting: Arc<SqliteReportingStore>,
        pub service: ShareService<SqliteTransactionalStore, SqliteTransactionalStore>,
        pub migrator: ReportingMigrator<SqliteTransactionalStore, SqliteReportingStore>,
        pub share: IssuedShare,
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).expect("valid date")
    }

    /// Both stores plus one issued share with no events yet.
    pub fn stores() -> Stores {
        let transactional =
            Arc::new(SqliteTransactionalStore::open_in_memory().expect("transactional store"));
        let reporting = Arc::new(SqliteReportingStore::open_in_memory().expect("reporting store"));
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap(),
        ));

        let campaign = transactional
            .insert_campaign(
                NewCampaign {
                    name: "Bone Health".to_string(),
                    brand_name: "Ossifort".to_string(),
                    description: String::new(),
                    start_date: day(1),
                    end_date: day(30),
                },
                day(1),
            )
            .expect("campaign");
        let cycle = transactional
            .insert_cycle(NewCampaignCycle {
                campaign_id: campaign.id,
                cycle_number: 1,
                title: "Vitamin D".to_string(),
                message_template: "Vitamin D dosing update".to_string(),
                reminder_template: "Vitamin D reminder".to_string(),
                pdf_url: "https://cdn.example.com/vitd.pdf".to_string(),
                video_url: "https://cdn.example.com/vitd.mp4".to_string(),
                start_date: day(1),
                end_date: day(30),
            })
            .expect("cycle");
        let rep = transactional
            .insert_field_rep(NewFieldRepresentative {
                campaign_id: campaign.id,
                name: "Meera Iyer".to_string(),
                email: "meera@example.com".to_string(),
                contact: "+91 90000 00003".to_string(),
            })
            .expect("rep");

        let service = ShareService::new(
            transactional.clone(),
            transactional.clone(),
            clock,
            LinkComposer::new("https://share.example.com"),
        );
        let share = service
            .issue_share(IssueShareRequest {
                field_rep_id: rep.id,
                cycle_id: cycle.id,
                doctor_contact: "+91 98111 22233".to_string(),
                is_reminder: false,
            })
            .expect("share");
        let migrator = ReportingMigrator::new(transactional.clone(), reporting.clone());

        Stores {
            transactional,
            reporting,
            service,
            migrator,
            share,
        }
    }
}

use common::*;
use inclinic::workflows::reporting::{
    ActivityEventReport, EventSource, MigrationError, ReportingRepository,
};
use inclinic::workflows::sharing::domain::NewActivityEvent;
use inclinic::workflows::sharing::{ActivityEventKind, ShareRepository};

#[test]
fn sync_moves_events_and_second_run_is_empty() {
    let stores = stores();
    let token = &stores.share.share.token;
    stores.service.land(token).expect("landing");
    stores
        .service
        .track(token, "video_progress", Some(30.0))
        .expect("tracked");

    let outcome = stores.migrator.sync().expect("sync");
    assert_eq!(outcome.fetched, 2);
    assert_eq!(outcome.inserted, 2);
    assert_eq!(outcome.moved(), 2);
    assert!(stores
        .transactional
        .pending_events()
        .expect("pending")
        .is_empty());
    assert_eq!(stores.reporting.count().expect("count"), 2);

    let reports = stores.reporting.recent(10).expect("recent");
    let progress = reports
        .iter()
        .find(|report| report.event_kind == ActivityEventKind::VideoProgress)
        .expect("progress report");
    assert_eq!(progress.value, 30.0);
    assert_eq!(progress.cycle_id, stores.share.share.cycle_id);
    assert_eq!(progress.field_rep_id, stores.share.share.field_rep_id);
    assert_eq!(progress.doctor_id, stores.share.doctor.id);

    assert_eq!(stores.migrator.sync().expect("second sync").moved(), 0);
    assert_eq!(stores.reporting.count().expect("count"), 2);
}

#[test]
fn rows_copied_by_an_interrupted_run_are_skipped() {
    let stores = stores();
    let token = &stores.share.share.token;
    stores.service.land(token).expect("landing");
    stores
        .service
        .track(token, "content_last_page", None)
        .expect("tracked");

    let pending = stores.transactional.pending_events().expect("pending");
    let already_copied: ActivityEventReport = pending[0].to_report().expect("report");
    stores
        .reporting
        .insert_or_skip(&already_copied)
        .expect("prior insert");

    let outcome = stores.migrator.sync().expect("sync");
    assert_eq!(outcome.inserted, 1);
    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.moved(), 2);
    assert_eq!(stores.reporting.count().expect("count"), 2);
}

#[test]
fn events_recorded_after_a_sync_get_fresh_ids() {
    let stores = stores();
    let token = &stores.share.share.token;
    stores.service.land(token).expect("landing");
    let first = stores
        .service
        .track(token, "content_download", None)
        .expect("tracked");
    stores.migrator.sync().expect("sync");

    let later = stores
        .service
        .track(token, "content_download", None)
        .expect("tracked again");
    assert!(later.id > first.id);

    let outcome = stores.migrator.sync().expect("second sync");
    assert_eq!(outcome.inserted, 1);
    assert_eq!(stores.reporting.count().expect("count"), 3);
}

#[test]
fn non_finite_value_aborts_without_deleting() {
    let stores = stores();
    let token = &stores.share.share.token;
    let share = stores.service.share(token).expect("share");
    stores.service.land(token).expect("landing");
    // The service refuses non-finite values, so write the row straight to the store.
    stores
        .transactional
        .append_event(NewActivityEvent {
            share_id: share.id,
            doctor_id: share.doctor_id,
            kind: ActivityEventKind::VideoProgress,
            value: f64::INFINITY,
            created_at: share.shared_at,
        })
        .expect("recorded");

    let err = stores.migrator.sync().expect_err("transform failure");
    assert!(matches!(err, MigrationError::Transform { .. }));
    assert_eq!(stores.reporting.count().expect("count"), 0);
    assert_eq!(
        stores.transactional.pending_events().expect("pending").len(),
        2
    );
}
