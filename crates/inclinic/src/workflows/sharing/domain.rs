use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(
    /// Storage row identifier for a campaign.
    CampaignId
);
row_id!(CycleId);
row_id!(FieldRepId);
row_id!(DoctorId);
row_id!(
    /// Internal row identifier for a share. Never exposed in public URLs; use [`ShareToken`].
    ShareId
);
row_id!(
    /// Transactional row identifier for an activity event, reused as the reporting idempotency key.
    EventId
);

/// Opaque, unguessable handle addressing a share from outside the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShareToken(pub String);

impl ShareToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShareToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Publisher-configured campaign; read-only to the sharing workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    /// Human facing code in the form `CAMP-YYYYMMDD-XXXXXX`.
    pub code: String,
    pub name: String,
    pub brand_name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Time-boxed phase of a campaign carrying its own collateral and message template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignCycle {
    pub id: CycleId,
    pub campaign_id: CampaignId,
    pub cycle_number: u32,
    pub title: String,
    pub message_template: String,
    pub reminder_template: String,
    pub pdf_url: String,
    pub video_url: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRepresentative {
    pub id: FieldRepId,
    pub campaign_id: CampaignId,
    pub name: String,
    pub email: String,
    pub contact: String,
    pub is_active: bool,
}

/// Doctor identity keyed by contact address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: DoctorId,
    pub contact: String,
    pub name: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
}

/// Lifecycle of a share. `Read` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareStatus {
    Sent,
    Read,
}

impl ShareStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ShareStatus::Sent => "sent",
            ShareStatus::Read => "read",
        }
    }
}

impl FromStr for ShareStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "sent" => Ok(ShareStatus::Sent),
            "read" => Ok(ShareStatus::Read),
            other => Err(format!("unknown share status '{other}'")),
        }
    }
}

/// One outbound share of a cycle's collateral from a field representative to a doctor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareRecord {
    pub id: ShareId,
    pub token: ShareToken,
    pub campaign_id: CampaignId,
    pub cycle_id: CycleId,
    pub field_rep_id: FieldRepId,
    pub doctor_id: DoctorId,
    /// Snapshot of the cycle template at send time.
    pub message: String,
    pub is_reminder: bool,
    pub status: ShareStatus,
    pub shared_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// Insert payload; the store assigns the row id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewShareRecord {
    pub token: ShareToken,
    pub campaign_id: CampaignId,
    pub cycle_id: CycleId,
    pub field_rep_id: FieldRepId,
    pub doctor_id: DoctorId,
    pub message: String,
    pub is_reminder: bool,
    pub shared_at: DateTime<Utc>,
}

/// Fixed enumeration of engagement events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityEventKind {
    LinkClick,
    LandingVisit,
    ContentLastPage,
    VideoProgress,
    ContentDownload,
}

impl ActivityEventKind {
    pub const ALL: [ActivityEventKind; 5] = [
        ActivityEventKind::LinkClick,
        ActivityEventKind::LandingVisit,
        ActivityEventKind::ContentLastPage,
        ActivityEventKind::VideoProgress,
        ActivityEventKind::ContentDownload,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ActivityEventKind::LinkClick => "link_click",
            ActivityEventKind::LandingVisit => "landing_visit",
            ActivityEventKind::ContentLastPage => "content_last_page",
            ActivityEventKind::VideoProgress => "video_progress",
            ActivityEventKind::ContentDownload => "content_download",
        }
    }
}

impl fmt::Display for ActivityEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown activity event kind '{0}'")]
pub struct UnknownEventKind(pub String);

impl FromStr for ActivityEventKind {
    type Err = UnknownEventKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ActivityEventKind::ALL
            .into_iter()
            .find(|kind| kind.label() == value)
            .ok_or_else(|| UnknownEventKind(value.to_string()))
    }
}

/// Immutable engagement fact recorded against a share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: EventId,
    pub share_id: ShareId,
    /// Copied from the share when the event is written.
    pub doctor_id: DoctorId,
    pub kind: ActivityEventKind,
    pub value: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewActivityEvent {
    pub share_id: ShareId,
    pub doctor_id: DoctorId,
    pub kind: ActivityEventKind,
    pub value: f64,
    pub created_at: DateTime<Utc>,
}

/// UI affordance derived from a share on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonState {
    Green,
    Purple,
    Yellow,
}

impl ButtonState {
    pub const fn label(self) -> &'static str {
        match self {
            ButtonState::Green => "green",
            ButtonState::Purple => "purple",
            ButtonState::Yellow => "yellow",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_labels_parse_back() {
        for kind in ActivityEventKind::ALL {
            assert_eq!(kind.label().parse::<ActivityEventKind>(), Ok(kind));
        }
    }

    #[test]
    fn unknown_event_kind_is_rejected() {
        assert_eq!(
            "pdf_print".parse::<ActivityEventKind>(),
            Err(UnknownEventKind("pdf_print".to_string()))
        );
    }

    #[test]
    fn event_kind_serializes_as_label() {
        let value = serde_json::to_value(ActivityEventKind::VideoProgress).expect("serializes");
        assert_eq!(value, serde_json::json!("video_progress"));
    }

    #[test]
    fn share_status_rejects_unknown_labels() {
        assert_eq!("read".parse::<ShareStatus>(), Ok(ShareStatus::Read));
        assert!("archived".parse::<ShareStatus>().is_err());
    }
}
