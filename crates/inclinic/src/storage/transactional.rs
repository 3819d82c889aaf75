use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::routing::{EntityKind, StoreTarget};
use super::Database;
use crate::workflows::reporting::domain::{PendingActivityEvent, ShareKeys};
use crate::workflows::reporting::repository::EventSource;
use crate::workflows::sharing::domain::{
    ActivityEvent, Campaign, CampaignCycle, CampaignId, CycleId, Doctor, DoctorId, EventId,
    FieldRepId, FieldRepresentative, NewActivityEvent, NewShareRecord, ShareId, ShareRecord,
    ShareStatus, ShareToken,
};
use crate::workflows::sharing::repository::{CampaignDirectory, RepositoryError, ShareRepository};

const SHARE_COLUMNS: &str = "id, token, campaign_id, cycle_id, field_rep_id, doctor_id, message, \
                             is_reminder, status, shared_at, read_at";
const CYCLE_COLUMNS: &str = "id, campaign_id, cycle_number, title, message_template, \
                             reminder_template, pdf_url, video_url, start_date, end_date";
const EVENT_COLUMNS: &str = "id, share_id, doctor_id, event_type, value, created_at";

/// Campaign payload used when seeding the directory.
#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub name: String,
    pub brand_name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct NewCampaignCycle {
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

#[derive(Debug, Clone)]
pub struct NewFieldRepresentative {
    pub campaign_id: CampaignId,
    pub name: String,
    pub email: String,
    pub contact: String,
}

/// SQLite transactional store: campaign directory, doctors, shares, and the raw event log.
pub struct SqliteTransactionalStore {
    db: Database,
}

impl SqliteTransactionalStore {
    pub fn open(path: &Path) -> Result<Self, RepositoryError> {
        Ok(Self {
            db: Database::open(path, StoreTarget::Transactional)?,
        })
    }

    pub fn open_in_memory() -> Result<Self, RepositoryError> {
        Ok(Self {
            db: Database::open_in_memory(StoreTarget::Transactional)?,
        })
    }

    /// Register a campaign; `today` seeds the generated public code.
    pub fn insert_campaign(
        &self,
        campaign: NewCampaign,
        today: NaiveDate,
    ) -> Result<Campaign, RepositoryError> {
        let code = Campaign::generate_code(today);
        self.db.with_conn(&[EntityKind::Campaign], |conn| {
            conn.execute(
                "INSERT INTO campaigns (code, name, brand_name, description, start_date, end_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    code,
                    campaign.name,
                    campaign.brand_name,
                    campaign.description,
                    campaign.start_date,
                    campaign.end_date
                ],
            )?;
            Ok(Campaign {
                id: CampaignId(conn.last_insert_rowid()),
                code,
                name: campaign.name,
                brand_name: campaign.brand_name,
                description: campaign.description,
                start_date: campaign.start_date,
                end_date: campaign.end_date,
            })
        })
    }

    pub fn insert_cycle(&self, cycle: NewCampaignCycle) -> Result<CampaignCycle, RepositoryError> {
        self.db.with_conn(&[EntityKind::CampaignCycle], |conn| {
            conn.execute(
                "INSERT INTO campaign_cycles (campaign_id, cycle_number, title, message_template,
                     reminder_template, pdf_url, video_url, start_date, end_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    cycle.campaign_id,
                    cycle.cycle_number,
                    cycle.title,
                    cycle.message_template,
                    cycle.reminder_template,
                    cycle.pdf_url,
                    cycle.video_url,
                    cycle.start_date,
                    cycle.end_date
                ],
            )?;
            Ok(CampaignCycle {
                id: CycleId(conn.last_insert_rowid()),
                campaign_id: cycle.campaign_id,
                cycle_number: cycle.cycle_number,
                title: cycle.title,
                message_template: cycle.message_template,
                reminder_template: cycle.reminder_template,
                pdf_url: cycle.pdf_url,
                video_url: cycle.video_url,
                start_date: cycle.start_date,
                end_date: cycle.end_date,
            })
        })
    }

    pub fn insert_field_rep(
        &self,
        rep: NewFieldRepresentative,
    ) -> Result<FieldRepresentative, RepositoryError> {
        self.db
            .with_conn(&[EntityKind::FieldRepresentative], |conn| {
                conn.execute(
                    "INSERT INTO field_representatives (campaign_id, name, email, contact, is_active)
                     VALUES (?1, ?2, ?3, ?4, 1)",
                    params![rep.campaign_id, rep.name, rep.email, rep.contact],
                )?;
                Ok(FieldRepresentative {
                    id: FieldRepId(conn.last_insert_rowid()),
                    campaign_id: rep.campaign_id,
                    name: rep.name,
                    email: rep.email,
                    contact: rep.contact,
                    is_active: true,
                })
            })
    }

    pub fn set_field_rep_active(
        &self,
        id: FieldRepId,
        is_active: bool,
    ) -> Result<(), RepositoryError> {
        self.db
            .with_conn(&[EntityKind::FieldRepresentative], |conn| {
                let updated = conn.execute(
                    "UPDATE field_representatives SET is_active = ?1 WHERE id = ?2",
                    params![is_active, id],
                )?;
                if updated == 0 {
                    Err(RepositoryError::NotFound)
                } else {
                    Ok(())
                }
            })
    }

    pub fn doctor_by_contact(&self, contact: &str) -> Result<Option<Doctor>, RepositoryError> {
        self.db.with_conn(&[EntityKind::Doctor], |conn| {
            Ok(conn
                .query_row(
                    "SELECT id, contact, name, verified_at FROM doctors WHERE contact = ?1",
                    [contact],
                    doctor_from_row,
                )
                .optional()?)
        })
    }
}

impl CampaignDirectory for SqliteTransactionalStore {
    fn campaign(&self, id: CampaignId) -> Result<Option<Campaign>, RepositoryError> {
        self.db.with_conn(&[EntityKind::Campaign], |conn| {
            Ok(conn
                .query_row(
                    "SELECT id, code, name, brand_name, description, start_date, end_date
                     FROM campaigns WHERE id = ?1",
                    [id],
                    |row| {
                        Ok(Campaign {
                            id: row.get(0)?,
                            code: row.get(1)?,
                            name: row.get(2)?,
                            brand_name: row.get(3)?,
                            description: row.get(4)?,
                            start_date: row.get(5)?,
                            end_date: row.get(6)?,
                        })
                    },
                )
                .optional()?)
        })
    }

    fn cycle(&self, id: CycleId) -> Result<Option<CampaignCycle>, RepositoryError> {
        self.db.with_conn(&[EntityKind::CampaignCycle], |conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {CYCLE_COLUMNS} FROM campaign_cycles WHERE id = ?1"),
                    [id],
                    cycle_from_row,
                )
                .optional()?)
        })
    }

    fn field_rep(&self, id: FieldRepId) -> Result<Option<FieldRepresentative>, RepositoryError> {
        self.db
            .with_conn(&[EntityKind::FieldRepresentative], |conn| {
                Ok(conn
                    .query_row(
                        "SELECT id, campaign_id, name, email, contact, is_active
                         FROM field_representatives WHERE id = ?1",
                        [id],
                        |row| {
                            Ok(FieldRepresentative {
                                id: row.get(0)?,
                                campaign_id: row.get(1)?,
                                name: row.get(2)?,
                                email: row.get(3)?,
                                contact: row.get(4)?,
                                is_active: row.get(5)?,
                            })
                        },
                    )
                    .optional()?)
            })
    }
}

impl ShareRepository for SqliteTransactionalStore {
    fn get_or_create_doctor(&self, contact: &str) -> Result<Doctor, RepositoryError> {
        self.db.with_conn(&[EntityKind::Doctor], |conn| {
            // The UNIQUE(contact) constraint settles concurrent first contacts.
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO doctors (contact) VALUES (?1) ON CONFLICT(contact) DO NOTHING",
                [contact],
            )?;
            let doctor = tx.query_row(
                "SELECT id, contact, name, verified_at FROM doctors WHERE contact = ?1",
                [contact],
                doctor_from_row,
            )?;
            tx.commit()?;
            Ok(doctor)
        })
    }

    fn doctor(&self, id: DoctorId) -> Result<Option<Doctor>, RepositoryError> {
        self.db.with_conn(&[EntityKind::Doctor], |conn| {
            Ok(conn
                .query_row(
                    "SELECT id, contact, name, verified_at FROM doctors WHERE id = ?1",
                    [id],
                    doctor_from_row,
                )
                .optional()?)
        })
    }

    fn mark_doctor_verified(&self, id: DoctorId, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        self.db.with_conn(&[EntityKind::Doctor], |conn| {
            let updated = conn.execute(
                "UPDATE doctors SET verified_at = ?1 WHERE id = ?2",
                params![at, id],
            )?;
            if updated == 0 {
                Err(RepositoryError::NotFound)
            } else {
                Ok(())
            }
        })
    }

    fn insert_share(&self, share: NewShareRecord) -> Result<ShareRecord, RepositoryError> {
        self.db.with_conn(&[EntityKind::ShareRecord], |conn| {
            conn.execute(
                "INSERT INTO share_records (token, campaign_id, cycle_id, field_rep_id, doctor_id,
                     message, is_reminder, status, shared_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    share.token,
                    share.campaign_id,
                    share.cycle_id,
                    share.field_rep_id,
                    share.doctor_id,
                    share.message,
                    share.is_reminder,
                    ShareStatus::Sent,
                    share.shared_at
                ],
            )?;
            Ok(ShareRecord {
                id: ShareId(conn.last_insert_rowid()),
                token: share.token,
                campaign_id: share.campaign_id,
                cycle_id: share.cycle_id,
                field_rep_id: share.field_rep_id,
                doctor_id: share.doctor_id,
                message: share.message,
                is_reminder: share.is_reminder,
                status: ShareStatus::Sent,
                shared_at: share.shared_at,
                read_at: None,
            })
        })
    }

    fn share_by_token(&self, token: &ShareToken) -> Result<Option<ShareRecord>, RepositoryError> {
        self.db.with_conn(&[EntityKind::ShareRecord], |conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {SHARE_COLUMNS} FROM share_records WHERE token = ?1"),
                    [token],
                    share_from_row,
                )
                .optional()?)
        })
    }

    fn mark_share_read(&self, id: ShareId, at: DateTime<Utc>) -> Result<bool, RepositoryError> {
        self.db.with_conn(&[EntityKind::ShareRecord], |conn| {
            // Conditional update: only the first landing sets read_at.
            let updated = conn.execute(
                "UPDATE share_records SET status = ?1, read_at = ?2
                 WHERE id = ?3 AND status = ?4",
                params![ShareStatus::Read, at, id, ShareStatus::Sent],
            )?;
            if updated == 1 {
                return Ok(true);
            }
            let exists = conn
                .query_row("SELECT 1 FROM share_records WHERE id = ?1", [id], |_| {
                    Ok(())
                })
                .optional()?;
            match exists {
                Some(()) => Ok(false),
                None => Err(RepositoryError::NotFound),
            }
        })
    }

    fn shares_for_rep(&self, id: FieldRepId) -> Result<Vec<ShareRecord>, RepositoryError> {
        self.db.with_conn(&[EntityKind::ShareRecord], |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SHARE_COLUMNS} FROM share_records
                 WHERE field_rep_id = ?1 ORDER BY shared_at DESC, id DESC"
            ))?;
            let shares = stmt
                .query_map([id], share_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(shares)
        })
    }

    fn append_event(&self, event: NewActivityEvent) -> Result<ActivityEvent, RepositoryError> {
        self.db.with_conn(&[EntityKind::ActivityEvent], |conn| {
            conn.execute(
                "INSERT INTO activity_events (share_id, doctor_id, event_type, value, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    event.share_id,
                    event.doctor_id,
                    event.kind,
                    event.value,
                    event.created_at
                ],
            )?;
            Ok(ActivityEvent {
                id: EventId(conn.last_insert_rowid()),
                share_id: event.share_id,
                doctor_id: event.doctor_id,
                kind: event.kind,
                value: event.value,
                created_at: event.created_at,
            })
        })
    }

    fn events_for_share(&self, id: ShareId) -> Result<Vec<ActivityEvent>, RepositoryError> {
        self.db.with_conn(&[EntityKind::ActivityEvent], |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EVENT_COLUMNS} FROM activity_events WHERE share_id = ?1 ORDER BY id"
            ))?;
            let events = stmt
                .query_map([id], event_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(events)
        })
    }
}

impl EventSource for SqliteTransactionalStore {
    fn pending_events(&self) -> Result<Vec<PendingActivityEvent>, RepositoryError> {
        self.db.with_conn(
            &[EntityKind::ActivityEvent, EntityKind::ShareRecord],
            |conn| {
                let mut stmt = conn.prepare(
                    "SELECT e.id, e.share_id, e.doctor_id, e.event_type, e.value, e.created_at,
                            s.campaign_id, s.cycle_id, s.field_rep_id
                     FROM activity_events e
                     LEFT JOIN share_records s ON s.id = e.share_id
                     ORDER BY e.id",
                )?;
                let pending = stmt
                    .query_map([], |row| {
                        let campaign_id: Option<CampaignId> = row.get(6)?;
                        let cycle_id: Option<CycleId> = row.get(7)?;
                        let field_rep_id: Option<FieldRepId> = row.get(8)?;
                        let share = match (campaign_id, cycle_id, field_rep_id) {
                            (Some(campaign_id), Some(cycle_id), Some(field_rep_id)) => {
                                Some(ShareKeys {
                                    campaign_id,
                                    cycle_id,
                                    field_rep_id,
                                })
                            }
                            _ => None,
                        };
                        Ok(PendingActivityEvent {
                            event: event_from_row(row)?,
                            share,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(pending)
            },
        )
    }

    fn delete_events(&self, ids: &[EventId]) -> Result<usize, RepositoryError> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.db.with_conn(&[EntityKind::ActivityEvent], |conn| {
            let tx = conn.transaction()?;
            let mut deleted = 0;
            {
                let mut stmt = tx.prepare("DELETE FROM activity_events WHERE id = ?1")?;
                for id in ids {
                    deleted += stmt.execute([id])?;
                }
            }
            tx.commit()?;
            Ok(deleted)
        })
    }
}

fn doctor_from_row(row: &Row<'_>) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: row.get(0)?,
        contact: row.get(1)?,
        name: row.get(2)?,
        verified_at: row.get(3)?,
    })
}

fn cycle_from_row(row: &Row<'_>) -> rusqlite::Result<CampaignCycle> {
    Ok(CampaignCycle {
        id: row.get(0)?,
        campaign_id: row.get(1)?,
        cycle_number: row.get(2)?,
        title: row.get(3)?,
        message_template: row.get(4)?,
        reminder_template: row.get(5)?,
        pdf_url: row.get(6)?,
        video_url: row.get(7)?,
        start_date: row.get(8)?,
        end_date: row.get(9)?,
    })
}

fn share_from_row(row: &Row<'_>) -> rusqlite::Result<ShareRecord> {
    Ok(ShareRecord {
        id: row.get(0)?,
        token: row.get(1)?,
        campaign_id: row.get(2)?,
        cycle_id: row.get(3)?,
        field_rep_id: row.get(4)?,
        doctor_id: row.get(5)?,
        message: row.get(6)?,
        is_reminder: row.get(7)?,
        status: row.get(8)?,
        shared_at: row.get(9)?,
        read_at: row.get(10)?,
    })
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<ActivityEvent> {
    Ok(ActivityEvent {
        id: row.get(0)?,
        share_id: row.get(1)?,
        doctor_id: row.get(2)?,
        kind: row.get(3)?,
        value: row.get(4)?,
        created_at: row.get(5)?,
    })
}

