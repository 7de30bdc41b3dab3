//! Tabular (civil) Hijri calendar.
//!
//! This is arithmetic, not moon sighting: it can differ by a day from local
//! announcements, which is what the user's correction offset is for.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::models::Settings;
use crate::utils::i18n::UiLanguage;

/// JDN of 1 Muharram 1 AH in this scheme.
pub const ISLAMIC_EPOCH_JDN: i64 = 1_948_439;

pub const RAMADAN: u32 = 9;

const HIJRI_MONTH_NAMES_EN: [&str; 12] = [
    "Muharram",
    "Safar",
    "Rabiʿ al-Awwal",
    "Rabiʿ al-Thani",
    "Jumada al-Ula",
    "Jumada al-Akhirah",
    "Rajab",
    "Shaʿban",
    "Ramadan",
    "Shawwal",
    "Dhu al-Qaʿdah",
    "Dhu al-Hijjah",
];

const HIJRI_MONTH_NAMES_AR: [&str; 12] = [
    "محرم",
    "صفر",
    "ربيع الأول",
    "ربيع الآخر",
    "جمادى الأولى",
    "جمادى الآخرة",
    "رجب",
    "شعبان",
    "رمضان",
    "شوال",
    "ذو القعدة",
    "ذو الحجة",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HijriDate {
    pub year: i64,
    pub month: u32,
    pub day: u32,
}

impl HijriDate {
    pub fn month_name(&self, lang: UiLanguage) -> &'static str {
        let names = match lang {
            UiLanguage::En => &HIJRI_MONTH_NAMES_EN,
            UiLanguage::Ar => &HIJRI_MONTH_NAMES_AR,
        };
        names[(self.month.clamp(1, 12) - 1) as usize]
    }

    pub fn formatted(&self, lang: UiLanguage) -> String {
        format!("{} {} {} AH", self.day, self.month_name(lang), self.year)
    }

    pub fn is_ramadan(&self) -> bool {
        self.month == RAMADAN
    }
}

fn ceil_div(n: i64, d: i64) -> i64 {
    -((-n).div_euclid(d))
}

/// Proleptic Gregorian date to Julian Day Number.
pub fn gregorian_to_jdn(year: i64, month: i64, day: i64) -> i64 {
    let a = (14 - month).div_euclid(12);
    let y = year + 4800 - a;
    let m = month + 12 * a - 3;
    day + (153 * m + 2).div_euclid(5) + 365 * y + y.div_euclid(4) - y.div_euclid(100)
        + y.div_euclid(400)
        - 32045
}

/// JDN of a tabular Hijri date.
pub fn islamic_to_jdn(year: i64, month: u32, day: u32) -> i64 {
    let months_before = i64::from(month) - 1;
    // ceil(29.5 * (month - 1))
    i64::from(day)
        + ceil_div(59 * months_before, 2)
        + (year - 1) * 354
        + (3 + 11 * year).div_euclid(30)
        + ISLAMIC_EPOCH_JDN
}

pub fn islamic_from_jdn(jdn: i64) -> HijriDate {
    let days = jdn - ISLAMIC_EPOCH_JDN;
    let mut year = (30 * days + 10646).div_euclid(10631);
    // The estimate runs one day early on the last day of some years.
    if jdn < islamic_to_jdn(year, 1, 1) {
        year -= 1;
    }
    let year_start = islamic_to_jdn(year, 1, 1);

    // ceil((jdn - 29 - year_start) / 29.5) + 1
    let month = (ceil_div(2 * (jdn - 29 - year_start), 59) + 1).clamp(1, 12) as u32;
    let day = (jdn - islamic_to_jdn(year, month, 1) + 1) as u32;
    HijriDate { year, month, day }
}

/// Convert a Gregorian day, shifted by `correction_days`, to the Hijri calendar.
pub fn gregorian_to_hijri(date: NaiveDate, correction_days: i64) -> HijriDate {
    let shifted = date
        .checked_add_signed(Duration::days(correction_days))
        .unwrap_or(date);
    let jdn = gregorian_to_jdn(
        i64::from(shifted.year()),
        i64::from(shifted.month()),
        i64::from(shifted.day()),
    );
    islamic_from_jdn(jdn)
}

/// Ramadan theming is on during Ramadan, or always when the user forces it.
pub fn ramadan_theme_active(hijri: &HijriDate, settings: &Settings) -> bool {
    hijri.is_ramadan() || settings.ramadan_theme_always_on
}
