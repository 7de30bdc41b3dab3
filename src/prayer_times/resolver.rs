use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};

use crate::models::event::ceil_minutes;
use crate::models::{PrayerType, ResolvedEvent};
use crate::prayer_times::timetable::DayTimes;

pub const JUMUAH_NAME: &str = "Jumu'ah";

/// Absolute instant for a local wall-clock time. A time that falls into a DST
/// gap moves forward by an hour; an ambiguous one takes the earlier instant.
pub fn local_instant<Tz: TimeZone>(tz: &Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Tz>> {
    let naive = date.and_time(time);
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
}

/// Find the first prayer strictly after `now`.
///
/// Today's five prayers are tried in canonical order; when all have passed the
/// result is Fajr of the day after `today_key`. `None` means the timetable has
/// nothing usable, which callers treat as missing data.
pub fn resolve_next<Tz: TimeZone>(
    today_key: NaiveDate,
    today: &DayTimes,
    tomorrow: Option<&DayTimes>,
    now: &DateTime<Tz>,
) -> Option<ResolvedEvent> {
    let tz = now.timezone();
    let now_utc = now.with_timezone(&Utc);
    let is_friday = now.weekday() == Weekday::Fri;

    for prayer in PrayerType::ORDER {
        let Some(time) = today.time_for(prayer) else {
            continue;
        };
        let Some(when) = local_instant(&tz, today_key, time) else {
            continue;
        };
        if when > *now {
            let is_jumuah = is_friday && prayer == PrayerType::Dhuhr;
            let name = if is_jumuah {
                JUMUAH_NAME
            } else {
                prayer.display_name()
            };
            return Some(build(prayer, name, time, when.with_timezone(&Utc), now_utc, today_key, is_jumuah, false));
        }
    }

    let tomorrow_key = today_key.succ_opt()?;
    let time = tomorrow?.fajr?;
    let when = local_instant(&tz, tomorrow_key, time)?;
    if when <= *now {
        return None;
    }
    Some(build(
        PrayerType::Fajr,
        PrayerType::Fajr.display_name(),
        time,
        when.with_timezone(&Utc),
        now_utc,
        tomorrow_key,
        false,
        true,
    ))
}

#[allow(clippy::too_many_arguments)]
fn build(
    prayer: PrayerType,
    name: &str,
    time: NaiveTime,
    when: DateTime<Utc>,
    now: DateTime<Utc>,
    date: NaiveDate,
    is_jumuah: bool,
    falls_on_tomorrow: bool,
) -> ResolvedEvent {
    ResolvedEvent {
        name: name.to_string(),
        prayer,
        at: time.format("%H:%M").to_string(),
        when,
        minutes_left: ceil_minutes((when - now).num_milliseconds()),
        is_jumuah,
        date,
        falls_on_tomorrow,
    }
}
