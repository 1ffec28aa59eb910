// ABOUTME: SQLite-backed durable medium storing blobs in a single key/value table.
// ABOUTME: An alternative persistent host store for deployments that prefer one database file.

use std::fs;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension, params};

use crate::medium::{DurableMedium, MediumError};

/// A persistent medium backed by one SQLite database file.
pub struct SqliteMedium {
    conn: Mutex<Connection>,
}

impl SqliteMedium {
    /// Open or create the database at `path`, creating parent directories
    /// and the `kv` table as needed.
    pub fn open(path: &Path) -> Result<Self, MediumError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        // Statements are atomic, so a poisoned connection is still consistent.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DurableMedium for SqliteMedium {
    fn kind(&self) -> &'static str {
        "sqlite"
    }

    fn read(&self, key: &str) -> Result<Option<String>, MediumError> {
        let value = self
            .conn()
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn write(&self, key: &str, blob: &str) -> Result<(), MediumError> {
        self.conn().execute(
            "INSERT INTO kv (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            params![key, blob, lgcrm_core::now().to_string()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), MediumError> {
        self.conn()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("crm.db");

        SqliteMedium::open(&path).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn write_upserts_existing_key() {
        let dir = TempDir::new().unwrap();
        let medium = SqliteMedium::open(&dir.path().join("crm.db")).unwrap();

        medium.write("k", "first").unwrap();
        medium.write("k", "second").unwrap();

        assert_eq!(medium.read("k").unwrap().as_deref(), Some("second"));
        let rows: i64 = medium
            .conn()
            .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("crm.db");

        SqliteMedium::open(&path).unwrap().write("k", "v").unwrap();

        let reopened = SqliteMedium::open(&path).unwrap();
        assert_eq!(reopened.read("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn remove_deletes_key() {
        let dir = TempDir::new().unwrap();
        let medium = SqliteMedium::open(&dir.path().join("crm.db")).unwrap();

        medium.write("k", "v").unwrap();
        medium.remove("k").unwrap();
        medium.remove("k").unwrap();

        assert!(medium.read("k").unwrap().is_none());
    }
}
