//! Metadata cache store
//!
//! Durable map from canonical URL to artifact metadata, plus the durable
//! frontier mirror. Before a URL is re-downloaded the cache is consulted;
//! a row is only honoured while its artifact file still exists on disk
//! with the recorded size, otherwise the row is evicted and the caller
//! sees a miss. All operations serialise on one connection behind a
//! mutex.

mod schema;

pub use schema::{initialize_schema, SCHEMA_SQL};

use crate::crawler::FrontierEntry;
use crate::MagpieError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// One row of the `downloads` table
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub cleaned_url: String,
    pub content_type: String,
    pub url_file_path: String,
    pub url_file_size: u64,
    pub text_file_path: String,
    pub text_file_size: u64,
    pub hash: String,
    pub download_time: String,
}

impl CacheEntry {
    /// Builds an entry stamped with the current time
    pub fn new(
        cleaned_url: impl Into<String>,
        content_type: impl Into<String>,
        url_file_path: impl Into<String>,
        url_file_size: u64,
        text_file_path: impl Into<String>,
        text_file_size: u64,
        hash: impl Into<String>,
    ) -> Self {
        Self {
            cleaned_url: cleaned_url.into(),
            content_type: content_type.into(),
            url_file_path: url_file_path.into(),
            url_file_size,
            text_file_path: text_file_path.into(),
            text_file_size,
            hash: hash.into(),
            download_time: Utc::now().to_rfc3339(),
        }
    }
}

/// Cached bytes returned by a successful lookup
#[derive(Debug)]
pub struct CachedContent {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// The metadata cache database handle
pub struct MetaCache {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl MetaCache {
    /// Opens (or creates) the cache database at the given path
    ///
    /// The parent directory must already exist; the coordinator creates
    /// the working directories before opening the cache.
    pub fn open(path: &Path) -> Result<Self, MagpieError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Creates an in-memory cache (for testing)
    pub fn open_in_memory() -> Result<Self, MagpieError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A poisoned lock only means another worker panicked mid-statement;
        // the connection itself is still usable.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns cached bytes for a CU when the entry is still valid
    ///
    /// Valid means the recorded artifact file exists on disk with exactly
    /// the recorded size. A stale row (missing file, size mismatch) is
    /// evicted and the lookup reports a miss, so the caller re-fetches.
    pub fn lookup(&self, cleaned_url: &str) -> Result<Option<CachedContent>, MagpieError> {
        let row: Option<(String, u64, String)> = self
            .conn()
            .query_row(
                "SELECT url_file_path, url_file_size, content_type
                 FROM downloads WHERE cleaned_url = ?1",
                params![cleaned_url],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((file_path, expected_size, content_type)) = row else {
            return Ok(None);
        };

        match std::fs::metadata(&file_path) {
            Ok(meta) if meta.len() == expected_size => {
                let bytes = std::fs::read(&file_path)?;
                Ok(Some(CachedContent {
                    bytes,
                    content_type,
                }))
            }
            _ => {
                tracing::warn!(
                    "Evicting stale cache row for {cleaned_url}: {file_path} missing or resized"
                );
                self.evict(cleaned_url)?;
                Ok(None)
            }
        }
    }

    /// Returns the raw metadata row for a CU without validating the file
    pub fn entry(&self, cleaned_url: &str) -> Result<Option<CacheEntry>, MagpieError> {
        let row = self
            .conn()
            .query_row(
                "SELECT cleaned_url, content_type, url_file_path, url_file_size,
                        text_file_path, text_file_size, hash, download_time
                 FROM downloads WHERE cleaned_url = ?1",
                params![cleaned_url],
                |row| {
                    Ok(CacheEntry {
                        cleaned_url: row.get(0)?,
                        content_type: row.get(1)?,
                        url_file_path: row.get(2)?,
                        url_file_size: row.get(3)?,
                        text_file_path: row.get(4)?,
                        text_file_size: row.get(5)?,
                        hash: row.get(6)?,
                        download_time: row.get(7)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Inserts or replaces the metadata row for a CU
    ///
    /// On conflict every field except the primary key is replaced.
    pub fn upsert(&self, entry: &CacheEntry) -> Result<(), MagpieError> {
        self.conn().execute(
            "INSERT INTO downloads (cleaned_url, content_type, url_file_path, url_file_size,
                                    text_file_path, text_file_size, hash, download_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(cleaned_url) DO UPDATE SET
                 content_type = excluded.content_type,
                 url_file_path = excluded.url_file_path,
                 url_file_size = excluded.url_file_size,
                 text_file_path = excluded.text_file_path,
                 text_file_size = excluded.text_file_size,
                 hash = excluded.hash,
                 download_time = excluded.download_time",
            params![
                entry.cleaned_url,
                entry.content_type,
                entry.url_file_path,
                entry.url_file_size,
                entry.text_file_path,
                entry.text_file_size,
                entry.hash,
                entry.download_time,
            ],
        )?;
        Ok(())
    }

    /// Deletes the metadata row for a CU
    pub fn evict(&self, cleaned_url: &str) -> Result<(), MagpieError> {
        self.conn().execute(
            "DELETE FROM downloads WHERE cleaned_url = ?1",
            params![cleaned_url],
        )?;
        Ok(())
    }

    /// Records a frontier entry in the persistent queue
    ///
    /// Re-enqueueing the same URL is a no-op.
    pub fn enqueue_pending(&self, entry: &FrontierEntry) -> Result<(), MagpieError> {
        self.conn().execute(
            "INSERT OR IGNORE INTO url_queue (url, depth_actual, depth_effective)
             VALUES (?1, ?2, ?3)",
            params![entry.url, entry.depth_actual, entry.depth_effective],
        )?;
        Ok(())
    }

    /// Drains the persisted frontier, in insertion order
    ///
    /// Called once at startup; pair with [`clear_pending`] after the
    /// entries have been pushed onto the in-memory frontier.
    ///
    /// [`clear_pending`]: MetaCache::clear_pending
    pub fn load_pending(&self) -> Result<Vec<FrontierEntry>, MagpieError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT url, depth_actual, depth_effective FROM url_queue ORDER BY rowid",
        )?;

        let entries = stmt
            .query_map([], |row| {
                Ok(FrontierEntry {
                    url: row.get(0)?,
                    depth_actual: row.get(1)?,
                    depth_effective: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Empties the persistent frontier table
    pub fn clear_pending(&self) -> Result<(), MagpieError> {
        self.conn().execute("DELETE FROM url_queue", [])?;
        Ok(())
    }

    /// Removes a URL from the persistent frontier once its work is done
    pub fn finalize_pending(&self, url: &str) -> Result<(), MagpieError> {
        self.conn()
            .execute("DELETE FROM url_queue WHERE url = ?1", params![url])?;
        Ok(())
    }

    /// Counts rows still waiting in the persistent frontier
    pub fn pending_count(&self) -> Result<u64, MagpieError> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM url_queue", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Wipes cached metadata
    ///
    /// With `delete_db` the whole database file is removed (file-backed
    /// caches only); otherwise the `downloads` table is emptied in place.
    pub fn clear(self, delete_db: bool) -> Result<(), MagpieError> {
        if delete_db {
            if let Some(path) = self.path.clone() {
                // The connection must be closed before the file goes away.
                drop(self);
                if path.exists() {
                    std::fs::remove_file(&path)?;
                }
                tracing::debug!("Deleted cache database {}", path.display());
                return Ok(());
            }
        }

        self.conn().execute("DELETE FROM downloads", [])?;
        tracing::debug!("Cleared all entries from the downloads table");
        Ok(())
    }

    /// Empties the `downloads` table without consuming the handle
    pub fn clear_downloads(&self) -> Result<(), MagpieError> {
        self.conn().execute("DELETE FROM downloads", [])?;
        Ok(())
    }
}
