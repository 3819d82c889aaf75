//! In-clinic collateral sharing: share → verify → land → track, plus the reporting migrator
//! that drains the transactional event log into a separate reporting store.

pub mod clock;
pub mod config;
pub mod error;
pub mod storage;
pub mod telemetry;
pub mod workflows;

pub use error::AppError;
