//! Reminder stages and their message bodies.
//!
//! Five escalating reminders fire as a window ages. A scan picks the
//! HIGHEST unsent stage whose threshold the window has crossed; skipped
//! intermediate stages are never backfilled.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// A named reminder threshold within the outbound window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "reminder_stage", rename_all = "lowercase")]
pub enum ReminderStage {
    S1,
    S2,
    S3,
    S4,
    S5,
}

impl ReminderStage {
    /// All stages, ascending by threshold.
    pub const ALL: [ReminderStage; 5] = [
        ReminderStage::S1,
        ReminderStage::S2,
        ReminderStage::S3,
        ReminderStage::S4,
        ReminderStage::S5,
    ];

    /// Elapsed time at which this stage becomes due.
    pub fn threshold(&self) -> Duration {
        match self {
            ReminderStage::S1 => Duration::hours(16),
            ReminderStage::S2 => Duration::hours(19),
            ReminderStage::S3 => Duration::hours(21),
            ReminderStage::S4 => Duration::hours(23),
            ReminderStage::S5 => Duration::hours(23) + Duration::minutes(45),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReminderStage::S1 => "s1",
            ReminderStage::S2 => "s2",
            ReminderStage::S3 => "s3",
            ReminderStage::S4 => "s4",
            ReminderStage::S5 => "s5",
        }
    }

    /// Render the reminder body for this stage.
    ///
    /// `alerts_sent_today` personalizes the mid-window check-ins;
    /// `monitoring_hours` is how long the current window has been open.
    pub fn message(&self, alerts_sent_today: i64, monitoring_hours: i64) -> String {
        match self {
            ReminderStage::S1 => {
                if alerts_sent_today > 0 {
                    format!(
                        "📊 *Market update!*\n\n\
                         I've been monitoring job boards for {monitoring_hours} hours and \
                         sent you {alerts_sent_today} matches so far. 🎯\n\n\
                         Send me any message to keep the alerts coming! ⚡"
                    )
                } else {
                    format!(
                        "📊 *Market update!*\n\n\
                         I've been monitoring job boards for {monitoring_hours} hours. \
                         No perfect matches yet, but I'm still hunting! 🔍\n\n\
                         Send me any message to keep the alerts coming! ⚡"
                    )
                }
            }
            ReminderStage::S2 => format!(
                "👋 *Quick check-in!*\n\n\
                 {monitoring_hours} hours of monitoring, {alerts_sent_today} matches \
                 found for you so far. 🎯\n\n\
                 I have about 5 hours of instant alerts remaining.\n\
                 Reply with anything to stay active! ⚡"
            ),
            ReminderStage::S3 => "⏰ *3 hours remaining*\n\n\
                 I have about 3 hours left of instant job alerts.\n\n\
                 After that:\n\
                 ✅ You can still request jobs anytime\n\
                 ⚡ But automatic alerts will pause\n\n\
                 Reply with anything to keep instant notifications on! 🚀"
                .to_string(),
            ReminderStage::S4 => "🔔 *Final hour!*\n\n\
                 My 24-hour window closes in about an hour.\n\n\
                 📱 You can still get jobs by asking me later\n\
                 ⏸️ Automatic alerts will pause when it closes\n\n\
                 Reply with anything to stay active! ⚡"
                .to_string(),
            ReminderStage::S5 => "🚨 *LAST CALL - 15 MINUTES LEFT!*\n\n\
                 Your 24-hour window is almost up! ⏰\n\n\
                 Reply with any message right now to keep real-time job \
                 alerts flowing.\n\
                 (You can always ask me for jobs later! 😊)"
                .to_string(),
        }
    }
}

/// Pick the reminder that is due: the highest unsent stage whose threshold
/// the elapsed time has crossed. Returns `None` when nothing is due.
pub fn due_stage(elapsed: Duration, sent: &[ReminderStage]) -> Option<ReminderStage> {
    ReminderStage::ALL
        .iter()
        .rev()
        .find(|stage| elapsed >= stage.threshold() && !sent.contains(stage))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_ascending() {
        for pair in ReminderStage::ALL.windows(2) {
            assert!(pair[0].threshold() < pair[1].threshold());
        }
    }

    #[test]
    fn nothing_due_before_sixteen_hours() {
        assert_eq!(due_stage(Duration::hours(15), &[]), None);
    }

    #[test]
    fn first_stage_due_at_sixteen_hours() {
        assert_eq!(due_stage(Duration::hours(16), &[]), Some(ReminderStage::S1));
    }

    #[test]
    fn highest_crossed_stage_wins() {
        // 23h50m with only S1-S3 sent: S5 is due, S4 is skipped forever
        let sent = [ReminderStage::S1, ReminderStage::S2, ReminderStage::S3];
        let elapsed = Duration::hours(23) + Duration::minutes(50);
        assert_eq!(due_stage(elapsed, &sent), Some(ReminderStage::S5));
    }

    #[test]
    fn sent_stages_are_not_repeated() {
        let sent = [ReminderStage::S1];
        assert_eq!(due_stage(Duration::hours(17), &sent), None);
    }

    #[test]
    fn cold_scan_goes_straight_to_last_call() {
        let elapsed = Duration::hours(23) + Duration::minutes(50);
        assert_eq!(due_stage(elapsed, &[]), Some(ReminderStage::S5));
    }

    #[test]
    fn stage_messages_escalate() {
        assert!(ReminderStage::S4.message(0, 23).contains("Final hour"));
        assert!(ReminderStage::S5.message(0, 23).contains("LAST CALL"));
    }

    #[test]
    fn s1_message_reflects_alert_count() {
        assert!(ReminderStage::S1.message(3, 16).contains("3 matches"));
        assert!(ReminderStage::S1.message(0, 16).contains("No perfect matches"));
    }
}
