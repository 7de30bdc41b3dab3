use chrono::{Days, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use crate::error::AppError;
use crate::models::PrayerType;

pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Parse an `HH:MM` (24-hour) clock string. Seconds are tolerated.
pub fn parse_hhmm(s: &str) -> anyhow::Result<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|e| anyhow::anyhow!("Bad time '{}': {}", s, e))
}

pub fn parse_date_key(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_KEY_FORMAT)
        .map_err(|e| anyhow::anyhow!("Bad date key '{}': {}", s, e))
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match t {
            Some(t) => s.serialize_str(&t.format("%H:%M").to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => super::parse_hhmm(s)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// One timetable row: the five prayer times plus sunrise, local wall-clock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayTimes {
    #[serde(default, with = "hhmm", skip_serializing_if = "Option::is_none")]
    pub fajr: Option<NaiveTime>,
    #[serde(default, with = "hhmm", skip_serializing_if = "Option::is_none")]
    pub sunrise: Option<NaiveTime>,
    #[serde(default, with = "hhmm", skip_serializing_if = "Option::is_none")]
    pub dhuhr: Option<NaiveTime>,
    #[serde(default, with = "hhmm", skip_serializing_if = "Option::is_none")]
    pub asr: Option<NaiveTime>,
    #[serde(default, with = "hhmm", skip_serializing_if = "Option::is_none")]
    pub maghrib: Option<NaiveTime>,
    #[serde(default, with = "hhmm", skip_serializing_if = "Option::is_none")]
    pub isha: Option<NaiveTime>,
}

impl DayTimes {
    pub fn time_for(&self, prayer: PrayerType) -> Option<NaiveTime> {
        match prayer {
            PrayerType::Fajr => self.fajr,
            PrayerType::Dhuhr => self.dhuhr,
            PrayerType::Asr => self.asr,
            PrayerType::Maghrib => self.maghrib,
            PrayerType::Isha => self.isha,
        }
    }
}

/// The whole precomputed timetable, keyed by local calendar day.
#[derive(Debug, Clone, Default)]
pub struct Timetable {
    days: BTreeMap<NaiveDate, DayTimes>,
}

impl Timetable {
    pub fn from_days(days: impl IntoIterator<Item = (NaiveDate, DayTimes)>) -> Self {
        Self {
            days: days.into_iter().collect(),
        }
    }

    /// Parse the JSON artifact: an object mapping `YYYY-MM-DD` to a row.
    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        let rows: HashMap<String, DayTimes> = serde_json::from_str(raw)?;
        let mut days = BTreeMap::new();
        for (key, times) in rows {
            days.insert(parse_date_key(&key)?, times);
        }
        Ok(Self { days })
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DayTimes> {
        self.days.get(&date)
    }

    /// The row for `date` and, if present, the row for the following day.
    pub fn with_next_day(
        &self,
        date: NaiveDate,
    ) -> Result<(&DayTimes, Option<&DayTimes>), AppError> {
        let today = self
            .day(date)
            .ok_or(AppError::DataUnavailable { date })?;
        let tomorrow = date
            .checked_add_days(Days::new(1))
            .and_then(|d| self.day(d));
        Ok((today, tomorrow))
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// First and last covered day.
    pub fn coverage(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.days.keys().next()?;
        let last = self.days.keys().next_back()?;
        Some((*first, *last))
    }
}

/// Where the timetable comes from.
pub trait TimetableSource {
    fn load(&self) -> Result<Timetable, AppError>;
}

pub struct JsonFileTimetable {
    pub path: PathBuf,
}

impl JsonFileTimetable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TimetableSource for JsonFileTimetable {
    fn load(&self) -> Result<Timetable, AppError> {
        let shown = self.path.display().to_string();
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|e| AppError::load_failure(&shown, e))?;
        let table =
            Timetable::from_json_str(&raw).map_err(|e| AppError::load_failure(&shown, e))?;
        if table.is_empty() {
            log::warn!("Timetable {} is empty", shown);
        } else if let Some((first, last)) = table.coverage() {
            log::info!(
                "Loaded {} timetable rows from {} ({} to {})",
                table.len(),
                shown,
                first,
                last
            );
        }
        Ok(table)
    }
}
