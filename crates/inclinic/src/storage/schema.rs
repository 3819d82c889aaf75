//! Table layout for both stores. Each store only creates the tables of the entities routed to it.

use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use super::routing::{EntityKind, RoutingTable, StoreTarget};
use crate::workflows::sharing::repository::RepositoryError;

pub const SCHEMA_VERSION: i32 = 1;

// AUTOINCREMENT on activity_events keeps ids monotonic across deletes; the id is the
// reporting idempotency key and must never be handed out twice.
fn table_ddl(entity: EntityKind) -> &'static str {
    match entity {
        EntityKind::Campaign => {
            "CREATE TABLE IF NOT EXISTS campaigns (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                brand_name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL
            );"
        }
        EntityKind::CampaignCycle => {
            "CREATE TABLE IF NOT EXISTS campaign_cycles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                campaign_id INTEGER NOT NULL REFERENCES campaigns(id) ON DELETE CASCADE,
                cycle_number INTEGER NOT NULL,
                title TEXT NOT NULL,
                message_template TEXT NOT NULL,
                reminder_template TEXT NOT NULL,
                pdf_url TEXT NOT NULL,
                video_url TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                UNIQUE (campaign_id, cycle_number)
            );"
        }
        EntityKind::FieldRepresentative => {
            "CREATE TABLE IF NOT EXISTS field_representatives (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                campaign_id INTEGER NOT NULL REFERENCES campaigns(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                contact TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1
            );"
        }
        EntityKind::Doctor => {
            "CREATE TABLE IF NOT EXISTS doctors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                contact TEXT NOT NULL UNIQUE,
                name TEXT,
                verified_at TEXT
            );"
        }
        EntityKind::ShareRecord => {
            "CREATE TABLE IF NOT EXISTS share_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                token TEXT NOT NULL UNIQUE,
                campaign_id INTEGER NOT NULL REFERENCES campaigns(id),
                cycle_id INTEGER NOT NULL REFERENCES campaign_cycles(id),
                field_rep_id INTEGER NOT NULL REFERENCES field_representatives(id),
                doctor_id INTEGER NOT NULL REFERENCES doctors(id),
                message TEXT NOT NULL,
                is_reminder INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'sent' CHECK (status IN ('sent', 'read')),
                shared_at TEXT NOT NULL,
                read_at TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_share_records_rep
                ON share_records(field_rep_id, shared_at DESC);"
        }
        EntityKind::ActivityEvent => {
            "CREATE TABLE IF NOT EXISTS activity_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                share_id INTEGER NOT NULL REFERENCES share_records(id),
                doctor_id INTEGER NOT NULL REFERENCES doctors(id),
                event_type TEXT NOT NULL,
                value REAL NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_activity_events_share
                ON activity_events(share_id);"
        }
        EntityKind::ActivityEventReport => {
            "CREATE TABLE IF NOT EXISTS activity_event_reports (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_event_id INTEGER NOT NULL UNIQUE,
                campaign_id INTEGER NOT NULL,
                cycle_id INTEGER NOT NULL,
                field_rep_id INTEGER NOT NULL,
                doctor_id INTEGER NOT NULL,
                event_type TEXT NOT NULL,
                value REAL NOT NULL DEFAULT 1,
                occurred_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_activity_event_reports_occurred
                ON activity_event_reports(occurred_at DESC);"
        }
    }
}

/// Create the tables routed to `target` if this is a fresh database.
pub fn init_schema(
    conn: &Connection,
    routes: &RoutingTable,
    target: StoreTarget,
) -> Result<(), RepositoryError> {
    let current = schema_version(conn)?;
    if current >= SCHEMA_VERSION {
        info!(%target, version = current, "database schema is up to date");
        return Ok(());
    }

    info!(%target, version = SCHEMA_VERSION, "creating database schema");
    // Entity order matters for foreign keys: ALL lists parents before children.
    for entity in EntityKind::ALL {
        if routes.route(entity)? == target {
            conn.execute_batch(table_ddl(entity))?;
        }
    }
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [SCHEMA_VERSION],
    )?;
    Ok(())
}

fn schema_version(conn: &Connection) -> Result<i32, RepositoryError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
        [],
    )?;
    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(version.unwrap_or(0))
}
