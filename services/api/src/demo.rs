use crate::infra::Stores;
use chrono::{Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::Args;
use inclinic::clock::FixedClock;
use inclinic::error::AppError;
use inclinic::storage::transactional::{NewCampaign, NewCampaignCycle, NewFieldRepresentative};
use inclinic::workflows::reporting::{ActivityEventReport, ReportingRepository, SyncOutcome};
use inclinic::workflows::sharing::{
    ActivityEvent, IssueShareRequest, LandingView, LinkComposer, ShareStatusView, SharingError,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Day the demo share is sent (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Doctor contact the demo share is addressed to.
    #[arg(long, default_value = "+19990000001")]
    pub(crate) contact: String,
    /// Base URL embedded in the verification link.
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    pub(crate) base_url: String,
}

/// Everything the demo observed, in the order it happened.
pub(crate) struct DemoRun {
    pub(crate) share_link: String,
    pub(crate) verification_url: String,
    pub(crate) rejected_contact: Option<String>,
    pub(crate) first_landing: LandingView,
    pub(crate) second_landing: LandingView,
    pub(crate) events: Vec<ActivityEvent>,
    pub(crate) dashboard: Vec<ShareStatusView>,
    pub(crate) sync: SyncOutcome,
    pub(crate) second_sync: SyncOutcome,
    pub(crate) reports: Vec<ActivityEventReport>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let run = run_scenario(date, &args.contact, &args.base_url)?;
    render(&run);
    Ok(())
}

pub(crate) fn run_scenario(
    date: NaiveDate,
    contact: &str,
    base_url: &str,
) -> Result<DemoRun, AppError> {
    let stores = Stores::in_memory()?;
    let start = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)) + Duration::hours(9);
    let clock = Arc::new(FixedClock::new(start));
    let service = stores.share_service(clock.clone(), LinkComposer::new(base_url));
    let migrator = stores.migrator();

    let campaign = stores.transactional.insert_campaign(
        NewCampaign {
            name: "Cardio Awareness".to_string(),
            brand_name: "Cardiozen".to_string(),
            description: "Hypertension management collateral".to_string(),
            start_date: date,
            end_date: date + Duration::days(90),
        },
        date,
    )?;
    let cycle = stores.transactional.insert_cycle(NewCampaignCycle {
        campaign_id: campaign.id,
        cycle_number: 1,
        title: "BP targets in practice".to_string(),
        message_template: "Dear Doctor, here is this month's BP targets brief.".to_string(),
        reminder_template: "A quick reminder about the BP targets brief.".to_string(),
        pdf_url: "https://cdn.example.com/bp-targets.pdf".to_string(),
        video_url: "https://cdn.example.com/bp-targets.mp4".to_string(),
        start_date: date,
        end_date: date + Duration::days(30),
    })?;
    let rep = stores.transactional.insert_field_rep(NewFieldRepresentative {
        campaign_id: campaign.id,
        name: "Demo Rep".to_string(),
        email: "rep@example.com".to_string(),
        contact: "+19990000100".to_string(),
    })?;

    let issued = service.issue_share(IssueShareRequest {
        field_rep_id: rep.id,
        cycle_id: cycle.id,
        doctor_contact: contact.to_string(),
        is_reminder: false,
    })?;
    let token = issued.share.token.clone();

    clock.advance(Duration::minutes(3));
    let rejected_contact = match service.verify(&token, "+1wrong") {
        Err(SharingError::Validation(reason)) => Some(reason),
        Err(other) => return Err(other.into()),
        Ok(_) => None,
    };
    service.verify(&token, contact)?;

    clock.advance(Duration::minutes(1));
    let first_landing = service.land(&token)?;
    clock.advance(Duration::hours(2));
    let second_landing = service.land(&token)?;
    service.track(&token, "video_progress", Some(60.0))?;

    let events = service.events(&token)?;
    let dashboard = service.shares_for_rep(rep.id)?;

    let sync = migrator.sync()?;
    let second_sync = migrator.sync()?;
    let reports = stores.reporting.recent(10)?;

    Ok(DemoRun {
        share_link: issued.share_link,
        verification_url: issued.verification_url,
        rejected_contact,
        first_landing,
        second_landing,
        events,
        dashboard,
        sync,
        second_sync,
        reports,
    })
}

fn render(run: &DemoRun) {
    println!("In-clinic sharing demo");
    println!("\nShare issued");
    println!("  Verification URL: {}", run.verification_url);
    println!("  Share link: {}", run.share_link);

    println!("\nVerification");
    match &run.rejected_contact {
        Some(reason) => println!("  Wrong contact rejected: {reason}"),
        None => println!("  Wrong contact unexpectedly accepted"),
    }
    println!("  Matching contact accepted");

    println!("\nLanding");
    println!(
        "  First visit: {} at {}",
        run.first_landing.status.label(),
        run.first_landing
            .read_at
            .map(|at| at.to_rfc3339())
            .unwrap_or_else(|| "-".to_string())
    );
    println!(
        "  Repeat visit keeps read time: {}",
        run.first_landing.read_at == run.second_landing.read_at
    );
    println!(
        "  Collateral: {} ({}, {})",
        run.first_landing.title, run.first_landing.pdf_url, run.first_landing.video_url
    );

    println!("\nActivity events ({})", run.events.len());
    for event in &run.events {
        println!(
            "- #{} {} value={} at {}",
            event.id,
            event.kind,
            event.value,
            event.created_at.to_rfc3339()
        );
    }

    println!("\nField rep dashboard");
    for row in &run.dashboard {
        println!(
            "- {} {} [{}]",
            row.doctor_contact,
            row.status.label(),
            row.button_state.label()
        );
    }

    println!("\nReporting sync");
    println!(
        "  Moved {} events ({} inserted, {} already present)",
        run.sync.moved(),
        run.sync.inserted,
        run.sync.skipped
    );
    println!("  Second run moved {} events", run.second_sync.moved());
    println!("  Reporting store holds {} reports", run.reports.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use inclinic::workflows::sharing::{ActivityEventKind, ButtonState, ShareStatus};

    #[test]
    fn scenario_walks_the_full_lifecycle() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 3).expect("valid date");
        let run = run_scenario(date, "+19990000001", "http://127.0.0.1:3000").expect("demo runs");

        assert!(run.rejected_contact.is_some());
        assert_eq!(run.first_landing.status, ShareStatus::Read);
        assert_eq!(run.first_landing.read_at, run.second_landing.read_at);

        let kinds: Vec<ActivityEventKind> = run.events.iter().map(|event| event.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ActivityEventKind::LinkClick,
                ActivityEventKind::LinkClick,
                ActivityEventKind::LandingVisit,
                ActivityEventKind::LandingVisit,
                ActivityEventKind::VideoProgress,
            ]
        );
        assert_eq!(run.dashboard[0].button_state, ButtonState::Green);
        assert_eq!(run.sync.moved(), 5);
        assert_eq!(run.second_sync.moved(), 0);
        assert_eq!(run.reports.len(), 5);
    }
}
