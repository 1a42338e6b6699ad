//! Key/value settings persisted as JSON text.

use crate::db::{now_epoch_ms, DbError};
use crate::repo::table_exists;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Settings key holding the tree the CLI acts on by default.
pub const ACTIVE_TREE_KEY: &str = "active_tree";

pub type SettingsResult<T> = Result<T, SettingsError>;

#[derive(Debug)]
pub enum SettingsError {
    Db(DbError),
    MissingRequiredTable(&'static str),
    /// Stored value is not valid JSON.
    InvalidValue { key: String, message: String },
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "settings repository requires table `{table}`")
            }
            Self::InvalidValue { key, message } => {
                write!(f, "invalid value for setting `{key}`: {message}")
            }
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::MissingRequiredTable(_) | Self::InvalidValue { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for SettingsError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// SQLite-backed settings store.
pub struct SettingsRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SettingsRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> SettingsResult<Self> {
        if !table_exists(conn, "settings")? {
            return Err(SettingsError::MissingRequiredTable("settings"));
        }
        Ok(Self { conn })
    }

    /// Reads one setting. Missing keys yield `None`.
    pub fn get(&self, key: &str) -> SettingsResult<Option<Value>> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?1;", [key], |row| {
                row.get(0)
            })
            .optional()?;
        raw.map(|text| {
            serde_json::from_str(&text).map_err(|err| SettingsError::InvalidValue {
                key: key.to_string(),
                message: err.to_string(),
            })
        })
        .transpose()
    }

    /// Inserts or replaces one setting.
    pub fn set(&self, key: &str, value: &Value) -> SettingsResult<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value.to_string(), now_epoch_ms()],
        )?;
        Ok(())
    }

    /// Removes one setting. Returns whether it existed.
    pub fn remove(&self, key: &str) -> SettingsResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM settings WHERE key = ?1;", [key])?;
        Ok(changed > 0)
    }
}
