use rusqlite::{named_params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::AppResult;

/// Key/value store for small bits of app state: the current session,
/// the gateway endpoint, cached remote snapshots. Values are plain
/// strings; the JSON helpers cover the structured entries.
pub struct SettingsRepository;

impl SettingsRepository {
    pub fn get(conn: &Connection, key: &str) -> AppResult<Option<String>> {
        let mut stmt = conn.prepare("SELECT value FROM app_settings WHERE key = ?1")?;
        let value = stmt.query_row([key], |row| row.get(0)).optional()?;
        Ok(value)
    }

    pub fn upsert(conn: &Connection, key: &str, value: &str) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO app_settings (key, value)
                VALUES (:key, :value)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = CURRENT_TIMESTAMP
            "#,
            named_params! {":key": key, ":value": value},
        )?;

        Ok(())
    }

    pub fn delete(conn: &Connection, key: &str) -> AppResult<()> {
        conn.execute("DELETE FROM app_settings WHERE key = ?1", [key])?;
        Ok(())
    }

    pub fn get_json<T: DeserializeOwned>(conn: &Connection, key: &str) -> AppResult<Option<T>> {
        match Self::get(conn, key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn upsert_json<T: Serialize>(conn: &Connection, key: &str, value: &T) -> AppResult<()> {
        let raw = serde_json::to_string(value)?;
        Self::upsert(conn, key, &raw)
    }
}
