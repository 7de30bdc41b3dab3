use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local, NaiveDate, NaiveTime, Utc, Weekday};

use crate::cli::args::SettingsArgs;
use crate::config::AppConfig;
use crate::daemon::ipc::{self, Request, Response};
use crate::db::SettingsStore;
use crate::models::{PrayerType, Settings, StateSnapshot};
use crate::prayer_times::{resolve_next, DayTimes, JsonFileTimetable, TimetableSource};
use crate::utils::format::{format_badge, format_countdown, format_duration_secs, special_chip_text};
use crate::utils::hijri::{gregorian_to_hijri, ramadan_theme_active};
use crate::utils::i18n::{host_locale, resolve_language, Label, UiLanguage};

// ─── ANSI helpers ────────────────────────────────────────────────────────────

macro_rules! println_colored {
    ($color:expr, $($arg:tt)*) => {{
        print!("{}", $color);
        print!($($arg)*);
        println!("\x1b[0m");
    }};
}

const GREEN: &str = "\x1b[32m";
const AMBER: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const GOLD: &str = "\x1b[38;2;196;160;68m";

fn ui_language(settings: &Settings) -> UiLanguage {
    resolve_language(settings.language, host_locale().as_deref())
}

fn on_off(b: bool) -> &'static str {
    if b { "on" } else { "off" }
}

// ─── Times ───────────────────────────────────────────────────────────────────

/// Display rows for one day: label, time, and the prayer it belongs to (sunrise has none).
pub fn day_rows(
    times: &DayTimes,
    friday: bool,
    lang: UiLanguage,
) -> Vec<(&'static str, Option<NaiveTime>, Option<PrayerType>)> {
    let mut rows = Vec::with_capacity(6);
    for prayer in PrayerType::ORDER {
        let label = if prayer == PrayerType::Dhuhr && friday {
            Label::Jumuah.text(lang)
        } else {
            prayer.display_name()
        };
        rows.push((label, times.time_for(prayer), Some(prayer)));
        if prayer == PrayerType::Fajr {
            rows.push((Label::Sunrise.text(lang), times.sunrise, None));
        }
    }
    rows
}

pub fn handle_times(
    store: &dyn SettingsStore,
    config: &AppConfig,
    date: Option<NaiveDate>,
) -> Result<()> {
    let settings = store.get()?;
    let lang = ui_language(&settings);
    let path = config.timetable_path()?;
    let table = JsonFileTimetable::new(&path)
        .load()
        .with_context(|| format!("Loading timetable {:?}", path))?;

    let now = Local::now();
    let today = now.date_naive();
    let day = date.unwrap_or(today);
    let (times, times_next) = table.with_next_day(day)?;
    let friday = day.weekday() == Weekday::Fri;

    // Only the current day has a meaningful "next".
    let next = if day == today {
        resolve_next(day, times, times_next, &now)
    } else {
        None
    };

    let hijri = gregorian_to_hijri(day, settings.hijri_correction_days);

    println!();
    if friday {
        println_colored!(GOLD, "  Prayer Times ({}, {})", day, Label::Friday.text(lang));
    } else {
        println_colored!(GOLD, "  Prayer Times ({})", day);
    }
    println_colored!(DIM, "  {}", hijri.formatted(lang));
    println!();

    for (label, time, prayer) in day_rows(times, friday, lang) {
        let time_str = time
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_else(|| "--:--".to_string());
        let is_next = prayer.is_some()
            && next
                .as_ref()
                .is_some_and(|n| !n.falls_on_tomorrow && Some(n.prayer) == prayer);
        let is_past = day < today || (day == today && time.is_some_and(|t| t <= now.time()));

        if is_next {
            println_colored!(AMBER, "  {:<12}  {}  ◀", label, time_str);
        } else if is_past {
            println_colored!(DIM, "  {:<12}  {}", label, time_str);
        } else {
            println_colored!(BOLD, "  {:<12}  {}", label, time_str);
        }
    }

    if day == today {
        println!();
        match &next {
            Some(n) => {
                let secs = n.seconds_left_at(now.with_timezone(&Utc));
                let when = if n.falls_on_tomorrow {
                    format!("{} tomorrow", n.at)
                } else {
                    n.at.clone()
                };
                println_colored!(
                    AMBER,
                    "  {}: {} at {} (in {})",
                    Label::Next.text(lang),
                    n.name,
                    when,
                    format_duration_secs(secs)
                );
            }
            None => println_colored!(RED, "  {}", Label::NoNextPrayer.text(lang)),
        }
    }
    println!();
    Ok(())
}

// ─── Status / refresh ────────────────────────────────────────────────────────

fn ask_daemon(config: &AppConfig, request: Request) -> Result<Response> {
    ipc::send_request(config.daemon.ipc_port, request)
        .context("Daemon not reachable. Start it with `next-prayer daemon`")
}

pub fn handle_status(config: &AppConfig) -> Result<()> {
    let state = match ask_daemon(config, Request::GetState)? {
        Response::State(s) => s,
        Response::Ack { .. } => bail!("Daemon answered GET_STATE without a state"),
    };

    println!();
    match state {
        StateSnapshot::Pending => {
            println_colored!(DIM, "  Daemon has not finished its first evaluation yet");
        }
        StateSnapshot::Error(e) => {
            println_colored!(RED, "  ! {}", e.error);
            println_colored!(DIM, "  Evaluated at {}", e.evaluated_at.with_timezone(&Local).format("%H:%M:%S"));
        }
        StateSnapshot::Ready(r) => {
            let lang = ui_language(&r.settings);
            let hijri = gregorian_to_hijri(r.today_key, r.settings.hijri_correction_days);
            let ramadan = ramadan_theme_active(&hijri, &r.settings);

            if r.today_key.weekday() == Weekday::Fri {
                println_colored!(GOLD, "  {} · {}", r.today_key, Label::Friday.text(lang));
            } else {
                println_colored!(GOLD, "  {}", r.today_key);
            }
            if ramadan {
                println_colored!(GOLD, "  {} ☾", hijri.formatted(lang));
            } else {
                println_colored!(DIM, "  {}", hijri.formatted(lang));
            }
            println!();

            match &r.next {
                Some(next) => {
                    let secs = next.seconds_left_at(Utc::now());
                    let countdown = if secs <= 0 {
                        "Now".to_string()
                    } else {
                        format_countdown(secs)
                    };
                    println_colored!(
                        AMBER,
                        "  {}: {} at {}  {}",
                        Label::Next.text(lang),
                        next.name,
                        next.at,
                        countdown
                    );
                    if let Some(chip) = special_chip_text(next, secs, ramadan) {
                        println_colored!(GREEN, "  {}", chip);
                    }
                }
                None => println_colored!(RED, "  {}", Label::NoNextPrayer.text(lang)),
            }

            let badge = if r.settings.badge_enabled {
                format_badge(r.next.as_ref())
            } else {
                String::new()
            };
            println!();
            println_colored!(
                DIM,
                "  Badge: {}  ·  Reminders: {}",
                if badge.is_empty() { "-" } else { badge.as_str() },
                on_off(r.settings.notifications_enabled)
            );
        }
    }
    println!();
    Ok(())
}

pub fn handle_refresh(config: &AppConfig) -> Result<()> {
    match ask_daemon(config, Request::ForceRefresh)? {
        Response::Ack { ok: true } => {
            println_colored!(GREEN, "  ✓ Daemon refreshed");
            Ok(())
        }
        other => bail!("Daemon refused refresh: {:?}", other),
    }
}

// ─── Hijri ───────────────────────────────────────────────────────────────────

pub fn handle_hijri(store: &dyn SettingsStore, date: Option<NaiveDate>) -> Result<()> {
    let settings = store.get()?;
    let lang = ui_language(&settings);
    let day = date.unwrap_or_else(|| Local::now().date_naive());
    let hijri = gregorian_to_hijri(day, settings.hijri_correction_days);

    println!();
    println_colored!(GOLD, "  {}", hijri.formatted(lang));
    if settings.hijri_correction_days != 0 {
        println_colored!(DIM, "  ({} with {:+} day correction)", day, settings.hijri_correction_days);
    } else {
        println_colored!(DIM, "  ({})", day);
    }
    if ramadan_theme_active(&hijri, &settings) {
        println_colored!(GREEN, "  Ramadan theme: on");
    }
    println!();
    Ok(())
}

// ─── Settings ────────────────────────────────────────────────────────────────

pub fn handle_settings_show(store: &dyn SettingsStore) -> Result<()> {
    let s = store.get()?;
    println!();
    println_colored!(GOLD, "  Settings");
    println!();
    println!("  {:<18}  {}", "notifications", on_off(s.notifications_enabled));
    println!("  {:<18}  {}", "minutes-before", s.notify_minutes_before);
    println!("  {:<18}  {}", "badge", on_off(s.badge_enabled));
    println!("  {:<18}  {:+}", "hijri-correction", s.hijri_correction_days);
    println!("  {:<18}  {}", "language", s.language.as_str());
    println!("  {:<18}  {}", "ramadan-theme", on_off(s.ramadan_theme_always_on));
    println!();
    Ok(())
}

/// Overlay the given flags on `current`, clamped into range.
pub fn apply_settings_args(current: Settings, args: &SettingsArgs) -> Settings {
    let mut s = current;
    if let Some(v) = args.notifications {
        s.notifications_enabled = v.is_on();
    }
    if let Some(v) = args.minutes_before {
        s.notify_minutes_before = v;
    }
    if let Some(v) = args.badge {
        s.badge_enabled = v.is_on();
    }
    if let Some(v) = args.hijri_correction {
        s.hijri_correction_days = v;
    }
    if let Some(v) = args.language {
        s.language = v;
    }
    if let Some(v) = args.ramadan_theme {
        s.ramadan_theme_always_on = v.is_on();
    }
    s.normalized()
}

pub fn handle_settings_set(
    store: &mut dyn SettingsStore,
    config: &AppConfig,
    args: &SettingsArgs,
) -> Result<()> {
    if args.is_empty() {
        bail!("Nothing to change. See `next-prayer settings set --help`");
    }
    let current = store.get()?;
    let updated = apply_settings_args(current.clone(), args);
    if updated == current {
        println_colored!(DIM, "  Settings unchanged");
        return Ok(());
    }
    store.set(&updated).context("Saving settings")?;
    println_colored!(GREEN, "  ✓ Settings saved");

    // A running daemon picks the change up now instead of at its next cycle.
    match ipc::send_request(config.daemon.ipc_port, Request::ForceRefresh) {
        Ok(Response::Ack { ok: true }) => println_colored!(DIM, "  Daemon refreshed"),
        Ok(other) => log::warn!("Unexpected refresh reply: {:?}", other),
        Err(e) => {
            log::debug!("Refresh after settings change failed: {:#}", e);
            println_colored!(DIM, "  Daemon not running; changes apply when it starts");
        }
    }
    Ok(())
}
