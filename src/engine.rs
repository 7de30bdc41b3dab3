//! The evaluation cycle: load timetable, resolve the next prayer, update the
//! badge, (re)arm reminders and publish a snapshot.
//!
//! All process-lifetime state lives in [`Engine`]. Callers capture `now` once
//! per cycle and pass it in; nothing below reads the clock.

use chrono::{DateTime, TimeZone, Utc};

use crate::db::SettingsStore;
use crate::error::AppError;
use crate::models::{ErrorState, ReadyState, ResolvedEvent, Settings, StateSnapshot};
use crate::notify::{
    AlarmName, BadgeSurface, NotificationScheduler, Notifier, ScheduleOutcome, TimerFacility,
};
use crate::prayer_times::{resolve_next, Timetable, TimetableSource};
use crate::utils::format::{format_badge, BADGE_ERROR};

pub struct Facilities {
    pub settings: Box<dyn SettingsStore>,
    pub timetable: Box<dyn TimetableSource>,
    pub timers: Box<dyn TimerFacility>,
    pub notifier: Box<dyn Notifier>,
    pub badge: Box<dyn BadgeSurface>,
}

pub struct Engine<Tz: TimeZone> {
    tz: Tz,
    facilities: Facilities,
    timetable: Option<Timetable>,
    scheduler: NotificationScheduler,
    state: StateSnapshot,
    last_settings: Option<Settings>,
}

impl<Tz: TimeZone> Engine<Tz> {
    pub fn new(tz: Tz, facilities: Facilities) -> Self {
        Self {
            tz,
            facilities,
            timetable: None,
            scheduler: NotificationScheduler::new(),
            state: StateSnapshot::Pending,
            last_settings: None,
        }
    }

    pub fn state(&self) -> &StateSnapshot {
        &self.state
    }

    pub fn last_scheduled(&self) -> Option<DateTime<Utc>> {
        self.scheduler.last_scheduled()
    }

    /// Run one full evaluation cycle at `now`.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> &StateSnapshot {
        let settings = self.read_settings();

        match self.evaluate(now, &settings) {
            Ok(ready) => {
                let badge = if settings.badge_enabled {
                    format_badge(ready.next.as_ref())
                } else {
                    String::new()
                };
                self.set_badge(&badge);
                let outcome = self.scheduler.schedule_for(
                    self.facilities.timers.as_mut(),
                    ready.next.as_ref(),
                    &settings,
                    now,
                );
                if outcome != ScheduleOutcome::Unchanged {
                    log::debug!("Scheduler: {:?}", outcome);
                }
                self.state = StateSnapshot::Ready(ready);
            }
            Err(e) => {
                log::warn!("Evaluation failed: {}", e);
                self.set_badge(BADGE_ERROR);
                self.scheduler.disarm(self.facilities.timers.as_mut());
                self.state = StateSnapshot::Error(ErrorState {
                    error: e.to_string(),
                    settings,
                    evaluated_at: now,
                });
            }
        }
        &self.state
    }

    /// Fire every timer due at `now`. Returns how many fired.
    ///
    /// One cycle runs for the whole batch, and every reminder describes the
    /// event the timers were armed for, even when several came due together.
    pub fn poll_alarms(&mut self, now: DateTime<Utc>) -> usize {
        let due = self.facilities.timers.take_due(now);
        if due.is_empty() {
            return 0;
        }
        for alarm in &due {
            log::info!("Alarm {} fired", alarm);
        }
        let fired_for = self.scheduler.armed_event().cloned();
        self.refresh(now);

        if let Some(event) = fired_for {
            for alarm in &due {
                self.remind(*alarm, &event, now);
            }
        }
        due.len()
    }

    // An error snapshot from the cycle above does not cancel the reminder: the
    // event was resolved from good data when it was armed and its time is still real.
    fn remind(&mut self, alarm: AlarmName, event: &ResolvedEvent, now: DateTime<Utc>) {
        let enabled = self
            .state
            .settings()
            .is_some_and(|s| s.notifications_enabled);
        if !enabled {
            return;
        }
        let Some((title, message)) = reminder_text(alarm, event, now) else {
            log::info!("Skipping stale {} reminder for {}", alarm, event.name);
            return;
        };
        if let Err(e) = self.facilities.notifier.show(title, &message) {
            log::warn!("Notification failed: {}", e);
        }
    }

    fn read_settings(&mut self) -> Settings {
        let settings = match self.facilities.settings.get() {
            Ok(s) => s,
            Err(e) => {
                log::warn!("{}; using previous settings", e);
                self.last_settings.clone().unwrap_or_default()
            }
        };
        if let Some(prev) = &self.last_settings {
            if *prev != settings {
                log::info!("Settings changed: {:?}", settings);
            }
        }
        self.last_settings = Some(settings.clone());
        settings
    }

    fn evaluate(&mut self, now: DateTime<Utc>, settings: &Settings) -> Result<ReadyState, AppError> {
        if self.timetable.is_none() {
            self.timetable = Some(self.facilities.timetable.load()?);
        }
        let Some(table) = self.timetable.as_ref() else {
            return Err(AppError::load_failure("timetable", "not loaded"));
        };

        let local_now = now.with_timezone(&self.tz);
        let today_key = local_now.date_naive();
        let (times_today, times_tomorrow) = table.with_next_day(today_key)?;
        let tomorrow_key = today_key.succ_opt().unwrap_or(today_key);

        let next = resolve_next(today_key, times_today, times_tomorrow, &local_now);
        if next.is_none() {
            log::warn!("No upcoming prayer in timetable after {}", today_key);
        }

        Ok(ReadyState {
            today_key,
            times_today: times_today.clone(),
            tomorrow_key,
            times_tomorrow: times_tomorrow.cloned(),
            next,
            settings: settings.clone(),
            evaluated_at: now,
        })
    }

    fn set_badge(&mut self, text: &str) {
        if let Err(e) = self.facilities.badge.set_text(text) {
            log::warn!("Badge update failed: {}", e);
        }
    }
}

/// Title and body for a fired reminder, or `None` when it fired too late to matter.
pub fn reminder_text(
    alarm: AlarmName,
    event: &ResolvedEvent,
    now: DateTime<Utc>,
) -> Option<(&'static str, String)> {
    match alarm {
        AlarmName::PrayerPre => {
            let minutes = event.minutes_left_at(now);
            (minutes > 0).then(|| {
                (
                    "Prayer reminder",
                    format!("{} in {} minutes ({})", event.name, minutes, event.at),
                )
            })
        }
        AlarmName::PrayerAtTime => Some(("Prayer time", format!("{} ({})", event.name, event.at))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeBadge, FakeNotifier, FakeTimers, MemorySettingsStore, StaticTimetable};
    use crate::prayer_times::DayTimes;
    use chrono::{Duration, FixedOffset, NaiveDate, NaiveTime};

    struct Harness {
        engine: Engine<FixedOffset>,
        timers: FakeTimers,
        notifier: FakeNotifier,
        badge: FakeBadge,
        settings: MemorySettingsStore,
        source: StaticTimetable,
    }

    fn tz() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    fn t(h: u32, m: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(h, m, 0)
    }

    fn row() -> DayTimes {
        DayTimes {
            fajr: t(5, 0),
            sunrise: t(6, 21),
            dhuhr: t(12, 30),
            asr: t(15, 45),
            maghrib: t(18, 10),
            isha: t(19, 40),
        }
    }

    // 2026-03-19 is a Thursday.
    fn thursday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 19).unwrap()
    }

    fn table() -> Timetable {
        Timetable::from_days([
            (thursday(), row()),
            (thursday().succ_opt().unwrap(), row()),
        ])
    }

    /// Local (+03:00) wall-clock time on `date`, as UTC.
    fn local(date: NaiveDate, h: u32, m: u32) -> DateTime<Utc> {
        tz().from_local_datetime(&date.and_hms_opt(h, m, 0).unwrap())
            .single()
            .unwrap()
            .with_timezone(&Utc)
    }

    fn harness_with(source: StaticTimetable, settings: MemorySettingsStore) -> Harness {
        let timers = FakeTimers::default();
        let notifier = FakeNotifier::default();
        let badge = FakeBadge::default();
        let engine = Engine::new(
            tz(),
            Facilities {
                settings: Box::new(settings.clone()),
                timetable: Box::new(source.clone()),
                timers: Box::new(timers.clone()),
                notifier: Box::new(notifier.clone()),
                badge: Box::new(badge.clone()),
            },
        );
        Harness {
            engine,
            timers,
            notifier,
            badge,
            settings,
            source,
        }
    }

    fn harness() -> Harness {
        harness_with(StaticTimetable::new(table()), MemorySettingsStore::default())
    }

    #[test]
    fn ready_cycle_resolves_badges_and_arms() {
        let mut h = harness();
        let now = local(thursday(), 18, 0);
        let state = h.engine.refresh(now).clone();

        let StateSnapshot::Ready(ready) = state else {
            panic!("expected ready state");
        };
        let next = ready.next.unwrap();
        assert_eq!(next.name, "Maghrib");
        assert_eq!(next.minutes_left, 10);
        assert_eq!(ready.today_key, thursday());
        assert!(ready.times_tomorrow.is_some());
        assert_eq!(h.badge.last().as_deref(), Some("10m"));
        // Pre-reminder time (17:55) already passed; only the at-time timer is armed.
        assert_eq!(h.timers.armed(AlarmName::PrayerPre), None);
        assert_eq!(h.timers.armed(AlarmName::PrayerAtTime), Some(next.when));
    }

    #[test]
    fn repeated_cycles_do_not_churn_timers() {
        let mut h = harness();
        let start = local(thursday(), 16, 0);
        h.engine.refresh(start);
        let (creates, clears) = (h.timers.creates(), h.timers.clears());
        for minute in 1..30 {
            h.engine.refresh(start + Duration::minutes(minute));
        }
        assert_eq!(h.timers.creates(), creates);
        assert_eq!(h.timers.clears(), clears);
        // 101 minutes out at 16:29, past the countdown threshold.
        assert_eq!(h.badge.last().as_deref(), Some("MAG"));
    }

    #[test]
    fn missing_row_publishes_error_and_disarms() {
        let mut h = harness();
        h.engine.refresh(local(thursday(), 16, 0));
        assert!(h.engine.last_scheduled().is_some());

        let far = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        let state = h.engine.refresh(local(far, 9, 0)).clone();

        assert_eq!(state.error_message(), Some("No timings for 2026-07-01"));
        assert_eq!(h.badge.last().as_deref(), Some("!"));
        assert_eq!(h.timers.armed(AlarmName::PrayerPre), None);
        assert_eq!(h.timers.armed(AlarmName::PrayerAtTime), None);
        assert_eq!(h.engine.last_scheduled(), None);
    }

    #[test]
    fn load_failure_heals_once_data_appears() {
        let source = StaticTimetable::failing();
        let mut h = harness_with(source, MemorySettingsStore::default());
        let now = local(thursday(), 16, 0);

        let state = h.engine.refresh(now).clone();
        assert!(state.error_message().unwrap().starts_with("Failed to load timings"));
        assert_eq!(h.badge.last().as_deref(), Some("!"));

        h.source.replace(Some(table()));
        assert!(matches!(h.engine.refresh(now), StateSnapshot::Ready(_)));
        h.engine.refresh(now + Duration::minutes(1));
        assert_eq!(h.source.loads.get(), 2, "timetable is cached after the first success");
    }

    #[test]
    fn badge_switch_blanks_the_badge() {
        let settings = MemorySettingsStore::with_raw(r#"{"badgeEnabled": false}"#);
        let mut h = harness_with(StaticTimetable::new(table()), settings);
        h.engine.refresh(local(thursday(), 18, 0));
        assert_eq!(h.badge.last().as_deref(), Some(""));
    }

    #[test]
    fn disabled_notifications_never_arm() {
        let settings = MemorySettingsStore::with_raw(r#"{"notificationsEnabled": false}"#);
        let mut h = harness_with(StaticTimetable::new(table()), settings);
        h.engine.refresh(local(thursday(), 16, 0));
        assert_eq!(h.timers.creates(), 0);
        assert_eq!(h.engine.last_scheduled(), None);
    }

    #[test]
    fn settings_change_rearms_with_new_lead_time() {
        let mut h = harness();
        let now = local(thursday(), 16, 0);
        h.engine.refresh(now);
        let target = h.engine.last_scheduled().unwrap();

        let mut store = h.settings.clone();
        let changed = Settings {
            notify_minutes_before: 45,
            ..Settings::default()
        };
        store.set(&changed).unwrap();
        h.engine.refresh(now);

        assert_eq!(h.timers.armed(AlarmName::PrayerPre), Some(target - Duration::minutes(45)));
    }

    #[test]
    fn alarms_fire_reminders_then_retarget() {
        let mut h = harness();
        h.engine.refresh(local(thursday(), 17, 0));

        assert_eq!(h.engine.poll_alarms(local(thursday(), 17, 54)), 0);
        assert_eq!(h.engine.poll_alarms(local(thursday(), 17, 55)), 1);
        assert_eq!(
            h.notifier.shown(),
            vec![("Prayer reminder".to_string(), "Maghrib in 15 minutes (18:10)".to_string())]
        );
        assert!(h.timers.armed(AlarmName::PrayerAtTime).is_some(), "at-time timer survives");

        assert_eq!(h.engine.poll_alarms(local(thursday(), 18, 10)), 1);
        let shown = h.notifier.shown();
        assert_eq!(shown[1], ("Prayer time".to_string(), "Maghrib (18:10)".to_string()));

        // The cycle run by the alarm moved the reminders on to Isha.
        let isha = local(thursday(), 19, 40);
        assert_eq!(h.engine.last_scheduled(), Some(isha));
        assert_eq!(h.timers.armed(AlarmName::PrayerAtTime), Some(isha));
        assert_eq!(h.timers.armed(AlarmName::PrayerPre), Some(isha - Duration::minutes(15)));
    }

    #[test]
    fn alarm_with_notifications_off_stays_silent() {
        let mut h = harness();
        h.engine.refresh(local(thursday(), 17, 0));
        let mut store = h.settings.clone();
        store
            .set(&Settings {
                notifications_enabled: false,
                ..Settings::default()
            })
            .unwrap();
        assert_eq!(h.engine.poll_alarms(local(thursday(), 18, 10)), 2);
        assert!(h.notifier.shown().is_empty());
    }

    #[test]
    fn friday_dhuhr_badge_is_jum() {
        let friday = thursday().succ_opt().unwrap();
        let mut h = harness();
        let state = h.engine.refresh(local(friday, 10, 0)).clone();
        let next = state.next().unwrap();
        assert!(next.is_jumuah);
        assert_eq!(h.badge.last().as_deref(), Some("JUM"));
    }

    #[test]
    fn late_evening_targets_tomorrow_fajr() {
        let mut h = harness();
        let state = h.engine.refresh(local(thursday(), 21, 0)).clone();
        let next = state.next().unwrap();
        assert!(next.falls_on_tomorrow);
        assert_eq!(h.badge.last().as_deref(), Some("FAJ"));
    }

    #[test]
    fn stale_pre_reminder_is_dropped() {
        let event = ResolvedEvent {
            name: "Asr".to_string(),
            prayer: crate::models::PrayerType::Asr,
            at: "15:45".to_string(),
            when: local(thursday(), 15, 45),
            minutes_left: 15,
            is_jumuah: false,
            date: thursday(),
            falls_on_tomorrow: false,
        };
        assert!(reminder_text(AlarmName::PrayerPre, &event, local(thursday(), 15, 50)).is_none());
        assert!(reminder_text(AlarmName::PrayerAtTime, &event, local(thursday(), 15, 50)).is_some());
    }

    #[test]
    fn overdue_pair_reports_the_armed_prayer() {
        let mut h = harness();
        h.engine.refresh(local(thursday(), 17, 0));

        // Pre-reminder and at-time are both overdue in a single poll.
        assert_eq!(h.engine.poll_alarms(local(thursday(), 18, 11)), 2);
        assert_eq!(
            h.notifier.shown(),
            vec![("Prayer time".to_string(), "Maghrib (18:10)".to_string())]
        );
        assert_eq!(h.engine.last_scheduled(), Some(local(thursday(), 19, 40)));
    }

    #[test]
    fn reminder_survives_error_cycle_at_day_rollover() {
        let mut late = row();
        late.isha = t(23, 50);
        let source = StaticTimetable::new(Timetable::from_days([(thursday(), late)]));
        let mut h = harness_with(source, MemorySettingsStore::default());
        h.engine.refresh(local(thursday(), 23, 0));
        assert_eq!(h.timers.armed(AlarmName::PrayerAtTime), Some(local(thursday(), 23, 50)));

        // Friday has no row, so the cycle run by the alarm fails.
        let friday = thursday().succ_opt().unwrap();
        assert_eq!(h.engine.poll_alarms(local(friday, 0, 5)), 2);
        assert!(h.engine.state().error_message().is_some());
        assert_eq!(h.badge.last().as_deref(), Some("!"));
        assert_eq!(
            h.notifier.shown(),
            vec![("Prayer time".to_string(), "Isha (23:50)".to_string())]
        );
    }
}
