//! Host capabilities the evaluation cycle drives: named timers, desktop
//! notifications and the badge surface.

pub mod alarms;
pub mod badge;
pub mod desktop;
pub mod scheduler;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use alarms::AlarmTable;
pub use badge::BadgeFile;
pub use desktop::DesktopNotifier;
pub use scheduler::{NotificationScheduler, ScheduleOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmName {
    /// Advance reminder, `notify_minutes_before` ahead of the prayer.
    PrayerPre,
    PrayerAtTime,
}

impl AlarmName {
    pub const ALL: [AlarmName; 2] = [AlarmName::PrayerPre, AlarmName::PrayerAtTime];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmName::PrayerPre => "PRAYER_PRE",
            AlarmName::PrayerAtTime => "PRAYER_AT_TIME",
        }
    }
}

impl std::fmt::Display for AlarmName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named one-shot timers firing at absolute instants.
pub trait TimerFacility {
    fn create(&mut self, name: AlarmName, fire_at: DateTime<Utc>) -> anyhow::Result<()>;
    /// Clearing a timer that is not set is a no-op.
    fn clear(&mut self, name: AlarmName) -> anyhow::Result<()>;
    /// Remove and return every timer due at `now`, earliest first.
    fn take_due(&mut self, now: DateTime<Utc>) -> Vec<AlarmName>;
}

pub trait Notifier {
    fn show(&mut self, title: &str, message: &str) -> anyhow::Result<()>;
}

pub trait BadgeSurface {
    fn set_text(&mut self, text: &str) -> anyhow::Result<()>;
}
