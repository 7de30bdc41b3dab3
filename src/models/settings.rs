use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const MAX_NOTIFY_MINUTES_BEFORE: i64 = 120;
pub const MAX_HIJRI_CORRECTION_DAYS: i64 = 2;

fn default_true() -> bool {
    true
}
fn default_notify_minutes_before() -> i64 {
    15
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Auto,
    En,
    Ar,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Auto => "auto",
            Language::En => "en",
            Language::Ar => "ar",
        }
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Language::Auto),
            "en" | "english" => Ok(Language::En),
            "ar" | "arabic" => Ok(Language::Ar),
            _ => Err(anyhow::anyhow!("Unknown language '{}'. Use: auto, en, ar", s)),
        }
    }
}

/// User preferences. Every field falls back to its default on its own, so a
/// stored record missing some keys keeps the keys it does have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
    #[serde(default = "default_notify_minutes_before")]
    pub notify_minutes_before: i64,
    #[serde(default = "default_true")]
    pub badge_enabled: bool,
    /// Days added to the Gregorian date before Hijri conversion, for local moon sighting.
    #[serde(default)]
    pub hijri_correction_days: i64,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub ramadan_theme_always_on: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            notify_minutes_before: default_notify_minutes_before(),
            badge_enabled: true,
            hijri_correction_days: 0,
            language: Language::Auto,
            ramadan_theme_always_on: false,
        }
    }
}

impl Settings {
    /// Clamp numeric fields into their documented ranges.
    pub fn normalized(mut self) -> Self {
        self.notify_minutes_before = self.notify_minutes_before.clamp(0, MAX_NOTIFY_MINUTES_BEFORE);
        self.hijri_correction_days = self
            .hijri_correction_days
            .clamp(-MAX_HIJRI_CORRECTION_DAYS, MAX_HIJRI_CORRECTION_DAYS);
        self
    }

    /// Merge a stored (possibly partial) JSON record over the defaults.
    pub fn from_stored(raw: &str) -> serde_json::Result<Self> {
        let settings: Settings = serde_json::from_str(raw)?;
        Ok(settings.normalized())
    }
}
