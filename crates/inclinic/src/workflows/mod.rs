pub mod reporting;
pub mod sharing;
