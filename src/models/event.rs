use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::PrayerType;

/// The next upcoming prayer as seen from one evaluation instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedEvent {
    /// Display name; "Jumu'ah" when Dhuhr falls on a Friday.
    pub name: String,
    #[serde(rename = "key")]
    pub prayer: PrayerType,
    /// Local wall-clock time as `HH:MM`.
    pub at: String,
    #[serde(rename = "whenTs", with = "chrono::serde::ts_milliseconds")]
    pub when: DateTime<Utc>,
    pub minutes_left: i64,
    pub is_jumuah: bool,
    /// Calendar day the event belongs to.
    pub date: NaiveDate,
    pub falls_on_tomorrow: bool,
}

impl ResolvedEvent {
    pub fn minutes_left_at(&self, now: DateTime<Utc>) -> i64 {
        ceil_minutes((self.when - now).num_milliseconds())
    }

    pub fn seconds_left_at(&self, now: DateTime<Utc>) -> i64 {
        let ms = (self.when - now).num_milliseconds();
        ms.div_euclid(1000) + i64::from(ms.rem_euclid(1000) > 0)
    }
}

/// Round a millisecond span up to whole minutes.
pub fn ceil_minutes(ms: i64) -> i64 {
    ms.div_euclid(60_000) + i64::from(ms.rem_euclid(60_000) > 0)
}
