//! SQLite persistence for the two independent stores.
//!
//! - transactional: campaign configuration, doctors, shares, raw activity events
//! - reporting: activity event reports only
//!
//! Each store owns its own connection; nothing is ever written to both inside one
//! transaction.

pub mod reporting;
pub mod routing;
pub mod schema;
pub mod transactional;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Connection;
use tracing::{debug, info};

use crate::workflows::sharing::domain::{
    ActivityEventKind, CampaignId, CycleId, DoctorId, EventId, FieldRepId, ShareId, ShareStatus,
    ShareToken,
};
use crate::workflows::sharing::repository::RepositoryError;
use routing::{EntityKind, RoutingTable, StoreTarget};

pub use reporting::SqliteReportingStore;
pub use transactional::SqliteTransactionalStore;

/// Connection handle bound to one side of the routing table.
pub(crate) struct Database {
    conn: Mutex<Connection>,
    target: StoreTarget,
    routes: RoutingTable,
}

impl Database {
    pub(crate) fn open(path: &Path, target: StoreTarget) -> Result<Self, RepositoryError> {
        info!(?path, %target, "opening SQLite store");
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::from_connection(conn, target)
    }

    pub(crate) fn open_in_memory(target: StoreTarget) -> Result<Self, RepositoryError> {
        debug!(%target, "opening in-memory SQLite store");
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, target)
    }

    fn from_connection(conn: Connection, target: StoreTarget) -> Result<Self, RepositoryError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let routes = RoutingTable::standard();
        schema::init_schema(&conn, &routes, target)?;
        Ok(Self {
            conn: Mutex::new(conn),
            target,
            routes,
        })
    }

    /// Run `f` with exclusive access after checking every entity it touches belongs here.
    pub(crate) fn with_conn<F, T>(
        &self,
        entities: &[EntityKind],
        f: F,
    ) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut Connection) -> Result<T, RepositoryError>,
    {
        for entity in entities {
            self.routes.ensure(*entity, self.target)?;
        }
        let mut conn = self
            .conn
            .lock()
            .map_err(|err| RepositoryError::Unavailable(format!("lock poisoned: {err}")))?;
        f(&mut conn)
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                RepositoryError::Conflict
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound,
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..) => RepositoryError::Corrupt(err.to_string()),
            _ => RepositoryError::Unavailable(err.to_string()),
        }
    }
}

macro_rules! sql_row_id {
    ($($name:ident),+) => {
        $(
            impl ToSql for $name {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    self.0.to_sql()
                }
            }

            impl FromSql for $name {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    i64::column_result(value).map($name)
                }
            }
        )+
    };
}

sql_row_id!(CampaignId, CycleId, FieldRepId, DoctorId, ShareId, EventId);

impl ToSql for ShareToken {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for ShareToken {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        String::column_result(value).map(ShareToken)
    }
}

impl ToSql for ShareStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.label()))
    }
}

impl FromSql for ShareStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err: String| FromSqlError::Other(err.into()))
    }
}

impl ToSql for ActivityEventKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.label()))
    }
}

impl FromSql for ActivityEventKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}
