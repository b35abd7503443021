use std::path::Path;

use anyhow::Result;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use rusqlite_migration::{Migrations, M};

use super::Storage;

fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(
        "CREATE TABLE kv_entry (
            key        TEXT NOT NULL PRIMARY KEY,
            value      BLOB NOT NULL,
            updated_at TEXT NOT NULL
        );",
    )])
}

/// Key-value entries in a single SQLite table. Useful when the collections
/// should live in one file next to other application data.
#[derive(Clone)]
pub struct SqliteStorage {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |_row| Ok(()))
        });
        Self::from_manager(manager, 4)
    }

    /// Every pooled connection to `:memory:` would be its own database, so the
    /// pool is held to a single connection.
    pub fn open_memory() -> Result<Self> {
        Self::from_manager(SqliteConnectionManager::memory(), 1)
    }

    fn from_manager(manager: SqliteConnectionManager, max_size: u32) -> Result<Self> {
        let pool = Pool::builder().max_size(max_size).build(manager)?;
        {
            let mut conn = pool.get()?;
            migrations().to_latest(&mut *conn)?;
        }
        Ok(Self { pool })
    }
}

impl Storage for SqliteStorage {
    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        log::debug!("STORAGE LIST: prefix='{}'", prefix);
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT key FROM kv_entry WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
        )?;
        let keys = stmt
            .query_map([prefix], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        log::debug!("STORAGE LIST RESULT: {} items", keys.len());
        Ok(keys)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        log::debug!("STORAGE GET: key='{}'", key);
        let conn = self.pool.get()?;
        let content = conn
            .query_row("SELECT value FROM kv_entry WHERE key = ?1", [key], |row| {
                row.get::<_, Vec<u8>>(0)
            })
            .optional()?;
        match &content {
            Some(bytes) => log::debug!("STORAGE GET RESULT: {} bytes", bytes.len()),
            None => log::debug!("STORAGE GET RESULT: not found"),
        }
        Ok(content)
    }

    fn put(&self, key: &str, content: &[u8]) -> Result<()> {
        log::debug!("STORAGE PUT: key='{}', size={} bytes", key, content.len());
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO kv_entry (key, value, updated_at)
                VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at",
            params![key, content],
        )?;
        log::debug!("STORAGE PUT RESULT: success");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        log::debug!("STORAGE REMOVE: key='{}'", key);
        let conn = self.pool.get()?;
        conn.execute("DELETE FROM kv_entry WHERE key = ?1", [key])?;
        Ok(())
    }
}
