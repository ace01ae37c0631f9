use std::path::Path;

use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::error::StorageError;
use crate::traits::{KvStore, check_key};

/// SQLite-backed key-value store. Two stores opened on the same file behave
/// like two views of one browser profile: each sees the other's writes on the
/// next read.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// All keys currently stored, in key order.
    pub fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

impl KvStore for SqliteStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                rusqlite::params![key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(&mut self, key: &str, value: &[u8]) -> Result<u64, StorageError> {
        check_key(key)?;
        // One statement, so the returned revision is the one this write made.
        let revision = self.conn.query_row(
            "INSERT INTO kv (key, value, revision) VALUES (?1, ?2, 1)
             ON CONFLICT (key) DO UPDATE SET
                value = excluded.value,
                revision = kv.revision + 1,
                updated_at = excluded.updated_at
             RETURNING revision",
            rusqlite::params![key, value],
            |row| row.get::<_, i64>(0),
        )?;
        debug!(key, bytes = value.len(), revision, "kv write");
        Ok(revision.max(0) as u64)
    }

    fn revision(&self, key: &str) -> Result<u64, StorageError> {
        let revision = self
            .conn
            .query_row(
                "SELECT revision FROM kv WHERE key = ?1",
                rusqlite::params![key],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(revision.map_or(0, |r| r.max(0) as u64))
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.conn.path())
            .finish()
    }
}
