//! SQLite persistence for saved assets.
//!
//! [`SqliteStore`] keeps one row per package holding the asset's JSON
//! document and its blake3 content hash. Writes are transactional and skipped
//! entirely when the stored hash already matches. Each write is also recorded
//! in `save_log`, which keeps the most recent [`SAVE_LOG_RETAINED`] entries
//! per package.

use rusqlite::{params, Connection, OptionalExtension};

use bpmcp_core::GraphAsset;

use crate::error::BackendError;
use crate::hash::{encode_asset, hash_document};

/// Save records kept per package; older ones are pruned on write.
pub const SAVE_LOG_RETAINED: u64 = 16;

/// What a save actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The document was new or changed and was written.
    Written,
    /// The stored copy already had the same content hash.
    Unchanged,
}

/// SQLite-backed asset store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) a SQLite database at `path`.
    pub fn new(path: &str) -> Result<Self, BackendError> {
        let conn = crate::schema::open_database(path)?;
        Ok(SqliteStore { conn })
    }

    /// Opens an in-memory SQLite database.
    pub fn in_memory() -> Result<Self, BackendError> {
        let conn = crate::schema::open_in_memory()?;
        Ok(SqliteStore { conn })
    }

    /// Hex content hash of the stored copy, if any.
    pub fn stored_hash(&self, package: &str) -> Result<Option<String>, BackendError> {
        Ok(self
            .conn
            .query_row(
                "SELECT content_hash FROM assets WHERE package = ?1",
                params![package],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Persists `asset` unless the stored copy is identical.
    pub fn save_asset(&mut self, asset: &GraphAsset) -> Result<SaveOutcome, BackendError> {
        let document = encode_asset(asset)?;
        let hash = hash_document(&document).to_hex().to_string();
        let package = asset.path.package();

        if self.stored_hash(package)?.as_deref() == Some(hash.as_str()) {
            return Ok(SaveOutcome::Unchanged);
        }

        let text = String::from_utf8(document).map_err(|e| BackendError::SaveFailed {
            reason: e.to_string(),
        })?;
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO assets (package, object_path, content_hash, document)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(package) DO UPDATE SET
                object_path = excluded.object_path,
                content_hash = excluded.content_hash,
                document = excluded.document,
                saved_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
            params![package, asset.path.object_path(), hash, text],
        )?;
        tx.execute(
            "INSERT INTO save_log (package, content_hash) VALUES (?1, ?2)",
            params![package, hash],
        )?;
        tx.execute(
            "DELETE FROM save_log WHERE package = ?1 AND id NOT IN (
                SELECT id FROM save_log WHERE package = ?1 ORDER BY id DESC LIMIT ?2
             )",
            params![package, SAVE_LOG_RETAINED as i64],
        )?;
        tx.commit()?;
        Ok(SaveOutcome::Written)
    }

    /// Loads one stored asset by package name.
    pub fn load_asset(&self, package: &str) -> Result<Option<GraphAsset>, BackendError> {
        let document: Option<String> = self
            .conn
            .query_row(
                "SELECT document FROM assets WHERE package = ?1",
                params![package],
                |row| row.get(0),
            )
            .optional()?;
        document
            .map(|d| serde_json::from_str(&d).map_err(BackendError::from))
            .transpose()
    }

    /// Loads every stored asset, ordered by package name.
    pub fn load_all(&self) -> Result<Vec<GraphAsset>, BackendError> {
        let mut stmt = self
            .conn
            .prepare("SELECT document FROM assets ORDER BY package")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut assets = Vec::new();
        for row in rows {
            assets.push(serde_json::from_str(&row?)?);
        }
        Ok(assets)
    }

    /// Number of retained write records for `package`, at most
    /// [`SAVE_LOG_RETAINED`].
    pub fn write_count(&self, package: &str) -> Result<u64, BackendError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM save_log WHERE package = ?1",
            params![package],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
