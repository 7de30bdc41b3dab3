use chrono::{DateTime, Duration, Utc};

use super::{AlarmName, TimerFacility};
use crate::models::{ResolvedEvent, Settings};

/// What the timers are currently armed for.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ArmedPlan {
    target: DateTime<Utc>,
    minutes_before: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// Notifications off or nothing to schedule; both timers cleared.
    Disarmed,
    /// Same target and lead time as the previous cycle; timers untouched.
    Unchanged,
    Armed {
        pre: Option<DateTime<Utc>>,
        at: Option<DateTime<Utc>>,
    },
}

/// Keeps the pre-reminder and at-time timers pointed at the next prayer.
///
/// Re-evaluating with the same target is a no-op on the timer facility, so a
/// once-a-minute refresh never churns timers. Any change of target or lead
/// time clears both timers before arming the new pair.
#[derive(Debug, Default)]
pub struct NotificationScheduler {
    armed: Option<ArmedPlan>,
    armed_event: Option<ResolvedEvent>,
}

impl NotificationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_scheduled(&self) -> Option<DateTime<Utc>> {
        self.armed.as_ref().map(|p| p.target)
    }

    /// The event the current timers were armed for.
    pub fn armed_event(&self) -> Option<&ResolvedEvent> {
        self.armed_event.as_ref()
    }

    pub fn schedule_for(
        &mut self,
        timers: &mut dyn TimerFacility,
        next: Option<&ResolvedEvent>,
        settings: &Settings,
        now: DateTime<Utc>,
    ) -> ScheduleOutcome {
        let next = match next {
            Some(next) if settings.notifications_enabled => next,
            _ => {
                self.disarm(timers);
                return ScheduleOutcome::Disarmed;
            }
        };

        let plan = ArmedPlan {
            target: next.when,
            minutes_before: settings.notify_minutes_before.max(0),
        };
        if self.armed.as_ref() == Some(&plan) {
            return ScheduleOutcome::Unchanged;
        }

        clear_both(timers);

        let pre_at = plan.target - Duration::minutes(plan.minutes_before);
        // A zero lead time would duplicate the at-time reminder.
        let pre = (plan.minutes_before > 0 && pre_at > now).then_some(pre_at);
        let at = (plan.target > now).then_some(plan.target);

        if let Some(pre) = pre {
            arm(timers, AlarmName::PrayerPre, pre);
        }
        if let Some(at) = at {
            arm(timers, AlarmName::PrayerAtTime, at);
        }
        log::info!(
            "Reminders for {} at {} armed (pre: {:?}, at: {:?})",
            next.name,
            next.at,
            pre,
            at
        );

        self.armed = Some(plan);
        self.armed_event = Some(next.clone());
        ScheduleOutcome::Armed { pre, at }
    }

    /// Clear both timers and forget the target.
    pub fn disarm(&mut self, timers: &mut dyn TimerFacility) {
        clear_both(timers);
        if self.armed.take().is_some() {
            log::info!("Reminders disarmed");
        }
        self.armed_event = None;
    }
}

fn clear_both(timers: &mut dyn TimerFacility) {
    for name in AlarmName::ALL {
        if let Err(e) = timers.clear(name) {
            log::warn!("Clearing alarm {} failed: {}", name, e);
        }
    }
}

fn arm(timers: &mut dyn TimerFacility, name: AlarmName, at: DateTime<Utc>) {
    if let Err(e) = timers.create(name, at) {
        log::warn!("Arming alarm {} for {} failed: {}", name, at, e);
    }
}
