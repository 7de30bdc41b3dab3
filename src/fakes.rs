//! In-memory stand-ins for the host facilities. Clones share their log so a
//! test can hand one copy to the engine and inspect the other.

use chrono::{DateTime, Utc};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::db::SettingsStore;
use crate::error::AppError;
use crate::models::Settings;
use crate::notify::{AlarmName, BadgeSurface, Notifier, TimerFacility};
use crate::prayer_times::{Timetable, TimetableSource};

#[derive(Debug, Default)]
pub struct TimerLog {
    pub armed: HashMap<AlarmName, DateTime<Utc>>,
    pub creates: Vec<(AlarmName, DateTime<Utc>)>,
    pub clears: usize,
    pub fail: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FakeTimers(pub Rc<RefCell<TimerLog>>);

impl FakeTimers {
    pub fn creates(&self) -> usize {
        self.0.borrow().creates.len()
    }

    pub fn clears(&self) -> usize {
        self.0.borrow().clears
    }

    pub fn armed(&self, name: AlarmName) -> Option<DateTime<Utc>> {
        self.0.borrow().armed.get(&name).copied()
    }

    pub fn set_failing(&self, fail: bool) {
        self.0.borrow_mut().fail = fail;
    }
}

impl TimerFacility for FakeTimers {
    fn create(&mut self, name: AlarmName, fire_at: DateTime<Utc>) -> anyhow::Result<()> {
        let mut log = self.0.borrow_mut();
        log.creates.push((name, fire_at));
        if log.fail {
            anyhow::bail!("timer facility unavailable");
        }
        log.armed.insert(name, fire_at);
        Ok(())
    }

    fn clear(&mut self, name: AlarmName) -> anyhow::Result<()> {
        let mut log = self.0.borrow_mut();
        log.clears += 1;
        log.armed.remove(&name);
        Ok(())
    }

    fn take_due(&mut self, now: DateTime<Utc>) -> Vec<AlarmName> {
        let mut log = self.0.borrow_mut();
        let mut due: Vec<(AlarmName, DateTime<Utc>)> = log
            .armed
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(n, at)| (*n, *at))
            .collect();
        due.sort_by_key(|(_, at)| *at);
        for (name, _) in &due {
            log.armed.remove(name);
        }
        due.into_iter().map(|(n, _)| n).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeNotifier(pub Rc<RefCell<Vec<(String, String)>>>);

impl FakeNotifier {
    pub fn shown(&self) -> Vec<(String, String)> {
        self.0.borrow().clone()
    }
}

impl Notifier for FakeNotifier {
    fn show(&mut self, title: &str, message: &str) -> anyhow::Result<()> {
        self.0.borrow_mut().push((title.to_string(), message.to_string()));
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeBadge(pub Rc<RefCell<Vec<String>>>);

impl FakeBadge {
    pub fn last(&self) -> Option<String> {
        self.0.borrow().last().cloned()
    }
}

impl BadgeSurface for FakeBadge {
    fn set_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.0.borrow_mut().push(text.to_string());
        Ok(())
    }
}

/// Holds the raw stored JSON, so partial records can be exercised.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore(pub Rc<RefCell<Option<String>>>);

impl MemorySettingsStore {
    pub fn with_raw(raw: &str) -> Self {
        Self(Rc::new(RefCell::new(Some(raw.to_string()))))
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self) -> Result<Settings, AppError> {
        match self.0.borrow().as_deref() {
            None => Ok(Settings::default()),
            Some(raw) => Settings::from_stored(raw).map_err(|e| AppError::Storage(e.to_string())),
        }
    }

    fn set(&mut self, settings: &Settings) -> Result<(), AppError> {
        let raw = serde_json::to_string(settings).map_err(|e| AppError::Storage(e.to_string()))?;
        *self.0.borrow_mut() = Some(raw);
        Ok(())
    }
}

/// Serves a fixed timetable, or a load failure while `table` is `None`.
#[derive(Debug, Clone, Default)]
pub struct StaticTimetable {
    pub table: Rc<RefCell<Option<Timetable>>>,
    pub loads: Rc<Cell<usize>>,
}

impl StaticTimetable {
    pub fn new(table: Timetable) -> Self {
        Self {
            table: Rc::new(RefCell::new(Some(table))),
            loads: Rc::new(Cell::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn replace(&self, table: Option<Timetable>) {
        *self.table.borrow_mut() = table;
    }
}

impl TimetableSource for StaticTimetable {
    fn load(&self) -> Result<Timetable, AppError> {
        self.loads.set(self.loads.get() + 1);
        self.table
            .borrow()
            .clone()
            .ok_or_else(|| AppError::load_failure("memory", "no timetable"))
    }
}
