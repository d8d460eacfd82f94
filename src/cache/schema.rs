//! Database schema for the metadata cache
//!
//! Two tables: `downloads` maps each canonical URL to its artifact pair
//! metadata; `url_queue` mirrors the in-memory frontier so an interrupted
//! crawl resumes instead of restarting.

/// SQL schema for the cache database
pub const SCHEMA_SQL: &str = r#"
-- Artifact metadata per canonical URL
CREATE TABLE IF NOT EXISTS downloads (
    cleaned_url TEXT PRIMARY KEY,
    content_type TEXT NOT NULL,
    url_file_path TEXT NOT NULL,
    url_file_size INTEGER NOT NULL,
    text_file_path TEXT NOT NULL,
    text_file_size INTEGER NOT NULL,
    hash TEXT NOT NULL,
    download_time TEXT NOT NULL
);

-- Persistent mirror of the frontier
CREATE TABLE IF NOT EXISTS url_queue (
    url TEXT PRIMARY KEY,
    depth_actual INTEGER NOT NULL,
    depth_effective INTEGER NOT NULL
);
"#;

/// Initializes the database schema
///
/// Safe to call on every startup; the statements are idempotent.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
