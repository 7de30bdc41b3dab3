use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ResolvedEvent, Settings};
use crate::prayer_times::DayTimes;

/// Result of the last evaluation cycle, as served to `GET_STATE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StateSnapshot {
    /// No cycle has completed yet.
    Pending,
    Ready(ReadyState),
    Error(ErrorState),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyState {
    pub today_key: NaiveDate,
    pub times_today: DayTimes,
    pub tomorrow_key: NaiveDate,
    pub times_tomorrow: Option<DayTimes>,
    pub next: Option<ResolvedEvent>,
    pub settings: Settings,
    pub evaluated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorState {
    pub error: String,
    pub settings: Settings,
    pub evaluated_at: DateTime<Utc>,
}

impl StateSnapshot {
    pub fn error_message(&self) -> Option<&str> {
        match self {
            StateSnapshot::Error(e) => Some(&e.error),
            _ => None,
        }
    }

    pub fn next(&self) -> Option<&ResolvedEvent> {
        match self {
            StateSnapshot::Ready(r) => r.next.as_ref(),
            _ => None,
        }
    }

    pub fn settings(&self) -> Option<&Settings> {
        match self {
            StateSnapshot::Ready(r) => Some(&r.settings),
            StateSnapshot::Error(e) => Some(&e.settings),
            StateSnapshot::Pending => None,
        }
    }
}
