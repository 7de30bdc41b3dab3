use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::{AlarmName, TimerFacility};

/// In-process alarm table polled by the daemon loop.
#[derive(Debug, Default)]
pub struct AlarmTable {
    alarms: HashMap<AlarmName, DateTime<Utc>>,
}

impl AlarmTable {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimerFacility for AlarmTable {
    fn create(&mut self, name: AlarmName, fire_at: DateTime<Utc>) -> anyhow::Result<()> {
        log::debug!("Alarm {} set for {}", name, fire_at);
        self.alarms.insert(name, fire_at);
        Ok(())
    }

    fn clear(&mut self, name: AlarmName) -> anyhow::Result<()> {
        if self.alarms.remove(&name).is_some() {
            log::debug!("Alarm {} cleared", name);
        }
        Ok(())
    }

    fn take_due(&mut self, now: DateTime<Utc>) -> Vec<AlarmName> {
        let mut due: Vec<(AlarmName, DateTime<Utc>)> = self
            .alarms
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(name, at)| (*name, *at))
            .collect();
        due.sort_by_key(|(_, at)| *at);
        for (name, _) in &due {
            self.alarms.remove(name);
        }
        due.into_iter().map(|(name, _)| name).collect()
    }
}
