use std::path::Path;
use std::sync::Mutex;

use log::info;
use rusqlite::{Connection, OptionalExtension};

use crate::error::Result;
use crate::record::UserConfig;

/// Durable per-user configuration. Users are created lazily on first
/// contact and never deleted; the spreadsheet id is the routing decision
/// everything else hangs off.
pub trait UserStore {
    fn ensure_user(&self, user_id: i64, display_name: Option<&str>) -> Result<()>;
    fn get_user(&self, user_id: i64) -> Result<Option<UserConfig>>;
    fn spreadsheet_id(&self, user_id: i64) -> Result<Option<String>>;
    fn set_spreadsheet_id(&self, user_id: i64, spreadsheet_id: &str) -> Result<()>;
}

pub struct SqliteUserStore {
    conn: Mutex<Connection>,
}

impl SqliteUserStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(&conn)?;
        info!("User store opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                first_name TEXT,
                spreadsheet_id TEXT
            )",
            [],
        )?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl UserStore for SqliteUserStore {
    fn ensure_user(&self, user_id: i64, display_name: Option<&str>) -> Result<()> {
        self.lock().execute(
            "INSERT INTO users (id, first_name) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET first_name = COALESCE(?2, first_name)",
            rusqlite::params![user_id, display_name],
        )?;
        Ok(())
    }

    fn get_user(&self, user_id: i64) -> Result<Option<UserConfig>> {
        let user = self
            .lock()
            .query_row(
                "SELECT id, first_name, spreadsheet_id FROM users WHERE id = ?1",
                [user_id],
                |row| {
                    Ok(UserConfig {
                        user_id: row.get(0)?,
                        display_name: row.get(1)?,
                        spreadsheet_id: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    fn spreadsheet_id(&self, user_id: i64) -> Result<Option<String>> {
        let id = self
            .lock()
            .query_row(
                "SELECT spreadsheet_id FROM users WHERE id = ?1",
                [user_id],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;
        Ok(id.flatten())
    }

    fn set_spreadsheet_id(&self, user_id: i64, spreadsheet_id: &str) -> Result<()> {
        self.lock().execute(
            "INSERT INTO users (id, spreadsheet_id) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET spreadsheet_id = ?2",
            rusqlite::params![user_id, spreadsheet_id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_created_lazily() {
        let store = SqliteUserStore::open_in_memory().unwrap();
        assert!(store.get_user(42).unwrap().is_none());

        store.ensure_user(42, Some("Ada")).unwrap();
        let user = store.get_user(42).unwrap().unwrap();
        assert_eq!(user.user_id, 42);
        assert_eq!(user.display_name.as_deref(), Some("Ada"));
        assert_eq!(user.spreadsheet_id, None);
    }

    #[test]
    fn test_ensure_user_keeps_existing_name_when_absent() {
        let store = SqliteUserStore::open_in_memory().unwrap();
        store.ensure_user(1, Some("Ada")).unwrap();
        store.ensure_user(1, None).unwrap();

        let user = store.get_user(1).unwrap().unwrap();
        assert_eq!(user.display_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_set_spreadsheet_id_roundtrip() {
        let store = SqliteUserStore::open_in_memory().unwrap();
        assert_eq!(store.spreadsheet_id(7).unwrap(), None);

        store.set_spreadsheet_id(7, "sheet-abc").unwrap();
        assert_eq!(store.spreadsheet_id(7).unwrap().as_deref(), Some("sheet-abc"));

        store.set_spreadsheet_id(7, "sheet-def").unwrap();
        assert_eq!(store.spreadsheet_id(7).unwrap().as_deref(), Some("sheet-def"));
    }

    #[test]
    fn test_set_spreadsheet_id_creates_missing_user() {
        let store = SqliteUserStore::open_in_memory().unwrap();
        store.set_spreadsheet_id(99, "sheet-xyz").unwrap();

        let user = store.get_user(99).unwrap().unwrap();
        assert_eq!(user.spreadsheet_id.as_deref(), Some("sheet-xyz"));
        assert_eq!(user.display_name, None);
    }
}
