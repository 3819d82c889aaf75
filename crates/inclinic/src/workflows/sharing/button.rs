use chrono::{DateTime, Duration, Utc};

use super::domain::{ButtonState, ShareRecord, ShareStatus};

/// Days after sending at which an unread share becomes due for a reminder.
pub const REMINDER_DUE_AFTER_DAYS: i64 = 6;

impl ShareRecord {
    pub fn reminder_due(&self, now: DateTime<Utc>) -> bool {
        self.status == ShareStatus::Sent
            && now >= self.shared_at + Duration::days(REMINDER_DUE_AFTER_DAYS)
    }
}

/// Derive the dashboard affordance for a share. Never stored; recompute on each read.
pub fn button_state(share: &ShareRecord, now: DateTime<Utc>) -> ButtonState {
    if share.status == ShareStatus::Read {
        ButtonState::Green
    } else if share.reminder_due(now) {
        ButtonState::Purple
    } else {
        ButtonState::Yellow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::sharing::domain::{
        CampaignId, CycleId, DoctorId, FieldRepId, ShareId, ShareToken,
    };
    use chrono::TimeZone;

    fn share(status: ShareStatus) -> ShareRecord {
        let shared_at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        ShareRecord {
            id: ShareId(1),
            token: ShareToken("00".repeat(16)),
            campaign_id: CampaignId(1),
            cycle_id: CycleId(1),
            field_rep_id: FieldRepId(1),
            doctor_id: DoctorId(1),
            message: "Please review".to_string(),
            is_reminder: false,
            status,
            shared_at,
            read_at: (status == ShareStatus::Read).then_some(shared_at),
        }
    }

    #[test]
    fn fresh_unread_share_is_yellow() {
        let share = share(ShareStatus::Sent);
        let now = share.shared_at + Duration::days(2);
        assert_eq!(button_state(&share, now), ButtonState::Yellow);
    }

    #[test]
    fn unread_share_turns_purple_exactly_at_six_days() {
        let share = share(ShareStatus::Sent);
        let boundary = share.shared_at + Duration::days(6);
        assert_eq!(
            button_state(&share, boundary - Duration::seconds(1)),
            ButtonState::Yellow
        );
        assert_eq!(button_state(&share, boundary), ButtonState::Purple);
        assert_eq!(
            button_state(&share, boundary + Duration::days(30)),
            ButtonState::Purple
        );
    }

    #[test]
    fn read_share_is_green_regardless_of_age() {
        let share = share(ShareStatus::Read);
        for days in [0, 5, 6, 7, 365] {
            assert_eq!(
                button_state(&share, share.shared_at + Duration::days(days)),
                ButtonState::Green
            );
        }
    }

    #[test]
    fn clock_before_send_time_stays_yellow() {
        let share = share(ShareStatus::Sent);
        assert_eq!(
            button_state(&share, share.shared_at - Duration::hours(1)),
            ButtonState::Yellow
        );
    }
}
