use crate::models::{PrayerType, ResolvedEvent};

pub const BADGE_NOW: &str = "NOW";
pub const BADGE_FRIDAY: &str = "JUM";
pub const BADGE_ERROR: &str = "!";
/// Above this many minutes the badge names the prayer instead of counting down.
pub const BADGE_COUNTDOWN_MAX_MINUTES: i64 = 99;

/// Short ambient label for the next event, at most four characters.
pub fn format_badge(next: Option<&ResolvedEvent>) -> String {
    let Some(next) = next else {
        return String::new();
    };
    let mins = next.minutes_left;
    if mins <= 0 {
        return BADGE_NOW.to_string();
    }
    if mins <= BADGE_COUNTDOWN_MAX_MINUTES {
        return format!("{}m", mins);
    }
    if next.is_jumuah {
        return BADGE_FRIDAY.to_string();
    }
    next.name.chars().take(3).collect::<String>().to_uppercase()
}

/// Format a duration in seconds to "Xh Ym" or "Ym" string
pub fn format_duration_secs(secs: i64) -> String {
    if secs <= 0 {
        return "now".to_string();
    }
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Live countdown as `H:MM:SS`, or `M:SS` under an hour.
pub fn format_countdown(secs: i64) -> String {
    let secs = secs.max(0);
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

/// Extra hint shown next to the countdown: Suhoor/Fajr before dawn, Iftar in Ramadan.
pub fn special_chip_text(next: &ResolvedEvent, secs_left: i64, ramadan: bool) -> Option<String> {
    let remaining = if secs_left <= 0 {
        "Now".to_string()
    } else {
        format_countdown(secs_left)
    };
    match next.prayer {
        PrayerType::Fajr if ramadan => Some(format!("Suhoor ends in {}", remaining)),
        PrayerType::Fajr => Some(format!("Fajr in {}", remaining)),
        PrayerType::Maghrib if ramadan => Some(format!("Iftar in {}", remaining)),
        _ => None,
    }
}
