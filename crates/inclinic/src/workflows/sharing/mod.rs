//! In-clinic sharing: a field representative shares a campaign cycle with a doctor, the
//! doctor verifies and lands on the collateral, and engagement is tracked per share.

pub(crate) mod button;
pub mod domain;
pub mod messaging;
pub mod repository;
pub mod router;
pub mod service;
pub(crate) mod token;

#[cfg(test)]
mod tests;

pub use button::{button_state, REMINDER_DUE_AFTER_DAYS};
pub use domain::{
    ActivityEvent, ActivityEventKind, ButtonState, Campaign, CampaignCycle, CampaignId, CycleId,
    Doctor, DoctorId, EventId, FieldRepId, FieldRepresentative, ShareId, ShareRecord,
    ShareStatus, ShareToken,
};
pub use messaging::LinkComposer;
pub use repository::{CampaignDirectory, RepositoryError, ShareRepository};
pub use router::share_router;
pub use service::{
    IssueShareRequest, IssuedShare, LandingView, ShareService, ShareStatusView, SharingError,
    VerifyPrompt, DEFAULT_EVENT_VALUE,
};
