//! Local persisted client state
//!
//! A small SQLite key/value table standing in for browser local storage.
//! Only a fixed set of keys is ever written.

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use crate::models::{Role, User};

/// Keys of the local state table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKey {
    User,
    UserId,
    Token,
    DarkMode,
    ProjectViewMode,
}

impl StorageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::User => "user",
            StorageKey::UserId => "userId",
            StorageKey::Token => "token",
            StorageKey::DarkMode => "darkMode",
            StorageKey::ProjectViewMode => "projectViewMode",
        }
    }
}

/// How the project list is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Grid => "grid",
            ViewMode::List => "list",
        }
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grid" => Ok(ViewMode::Grid),
            "list" => Ok(ViewMode::List),
            other => Err(format!("unknown view mode '{}'", other)),
        }
    }
}

/// The logged-in user, passed explicitly to whatever needs identity
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl Session {
    pub fn user_id(&self) -> i64 {
        self.user.id
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn tenant(&self) -> Option<&str> {
        self.user.tenant_id.as_deref()
    }
}

/// Thread-safe local state wrapper
pub struct SessionStore {
    conn: Mutex<Connection>,
}

impl SessionStore {
    /// Open or create the store
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).context("Failed to create session directory")?;
        }

        let conn = Connection::open(path).context("Failed to open session store")?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory store")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS local_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("session store lock poisoned"))
    }

    pub fn get(&self, key: StorageKey) -> Result<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM local_state WHERE key = ?1",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set(&self, key: StorageKey, value: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO local_state (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key.as_str(), value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: StorageKey) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM local_state WHERE key = ?1",
            params![key.as_str()],
        )?;
        Ok(())
    }

    /// Persist a fresh login
    pub fn save_login(&self, token: &str, user: &User) -> Result<()> {
        let user_json = serde_json::to_string(user).context("Failed to serialize user")?;
        self.set(StorageKey::Token, token)?;
        self.set(StorageKey::User, &user_json)?;
        self.set(StorageKey::UserId, &user.id.to_string())?;
        Ok(())
    }

    /// Drop identity keys; preferences survive a logout
    pub fn clear_login(&self) -> Result<()> {
        self.remove(StorageKey::Token)?;
        self.remove(StorageKey::User)?;
        self.remove(StorageKey::UserId)?;
        Ok(())
    }

    pub fn token(&self) -> Result<Option<String>> {
        self.get(StorageKey::Token)
    }

    pub fn user(&self) -> Result<Option<User>> {
        match self.get(StorageKey::User)? {
            Some(raw) => {
                let user = serde_json::from_str(&raw).context("Stored user profile is corrupt")?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// Current session, if both a token and a profile are stored
    pub fn session(&self) -> Result<Option<Session>> {
        match (self.token()?, self.user()?) {
            (Some(token), Some(user)) => Ok(Some(Session { token, user })),
            _ => Ok(None),
        }
    }

    pub fn dark_mode(&self) -> Result<bool> {
        Ok(self.get(StorageKey::DarkMode)?.as_deref() == Some("true"))
    }

    pub fn set_dark_mode(&self, enabled: bool) -> Result<()> {
        self.set(StorageKey::DarkMode, if enabled { "true" } else { "false" })
    }

    pub fn project_view_mode(&self) -> Result<ViewMode> {
        Ok(self
            .get(StorageKey::ProjectViewMode)?
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default())
    }

    pub fn set_project_view_mode(&self, mode: ViewMode) -> Result<()> {
        self.set(StorageKey::ProjectViewMode, mode.as_str())
    }
}
