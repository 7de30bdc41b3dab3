pub mod migrations;
pub mod repository;

use crate::error::AppError;
use crate::models::Settings;

pub use repository::SqliteSettingsStore;

/// One namespaced settings record; reads merge a partial record over defaults.
pub trait SettingsStore {
    fn get(&self) -> Result<Settings, AppError>;
    fn set(&mut self, settings: &Settings) -> Result<(), AppError>;
}
