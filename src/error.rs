use chrono::NaiveDate;
use thiserror::Error;

/// Failures an evaluation cycle recovers from by publishing an error snapshot.
#[derive(Debug, Error)]
pub enum AppError {
    /// The timetable has no row for the requested day.
    #[error("No timings for {date}")]
    DataUnavailable { date: NaiveDate },

    /// The timetable artifact could not be read or parsed.
    #[error("Failed to load timings from {path}: {reason}")]
    LoadFailure { path: String, reason: String },

    #[error("Settings storage error: {0}")]
    Storage(String),
}

impl AppError {
    pub fn load_failure(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        AppError::LoadFailure {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
