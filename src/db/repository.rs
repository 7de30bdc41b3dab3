use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

use super::SettingsStore;
use crate::error::AppError;
use crate::models::Settings;

/// Key of the settings record in `app_meta`.
pub const SETTINGS_KEY: &str = "settings";

pub struct MetaRepo;

impl MetaRepo {
    pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
        conn.query_row(
            "SELECT value FROM app_meta WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO app_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }
}

/// Settings persisted as one JSON record under `app_meta.settings`.
pub struct SqliteSettingsStore {
    conn: Connection,
}

impl SqliteSettingsStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

impl SettingsStore for SqliteSettingsStore {
    fn get(&self) -> Result<Settings, AppError> {
        let raw = MetaRepo::get(&self.conn, SETTINGS_KEY)
            .map_err(|e| AppError::Storage(e.to_string()))?;
        match raw {
            None => Ok(Settings::default()),
            Some(raw) => Settings::from_stored(&raw).map_err(|e| {
                AppError::Storage(format!("Stored settings are not valid JSON: {}", e))
            }),
        }
    }

    fn set(&mut self, settings: &Settings) -> Result<(), AppError> {
        let normalized = settings.clone().normalized();
        let raw = serde_json::to_string(&normalized)
            .map_err(|e| AppError::Storage(e.to_string()))?;
        MetaRepo::set(&self.conn, SETTINGS_KEY, &raw)
            .map_err(|e| AppError::Storage(e.to_string()))
    }
}
