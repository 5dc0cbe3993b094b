//! Database connection management and the document-store primitive.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees
//! that migrations are run before any other operation.  SQLite is used as a
//! document store: every record is a whole JSON body addressed by
//! `(collection, doc_id)`, and [`Database::set_document`] replaces the body
//! wholesale.  That whole-document replacement is the unit of every
//! read-modify-write sequence in the repositories built on top.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, StoreError};
use crate::migrations;

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the default application database.
    ///
    /// The database file is placed in the platform-appropriate data directory:
    /// - Linux:   `~/.local/share/lostfound/lostfound.db`
    /// - macOS:   `~/Library/Application Support/com.lostfound.lostfound/lostfound.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\lostfound\lostfound\data\lostfound.db`
    pub fn new() -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("com", "lostfound", "lostfound").ok_or(StoreError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join("lostfound.db");

        tracing::info!(path = %db_path.display(), "opening database");

        Self::open_at(&db_path)
    }

    /// Open (or create) a database at an explicit path.
    ///
    /// This is useful for tests and for embedding the store inside custom
    /// directory layouts.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Recommended SQLite settings.
        conn.pragma_update(None, "journal_mode", "WAL")?;

        // Run schema migrations.
        migrations::run_migrations(&conn)?;

        Ok(Self { conn })
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    ///
    /// Callers should prefer the typed repository helpers, but direct access
    /// is occasionally needed for transactions or ad-hoc queries.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }

    // ------------------------------------------------------------------
    // Document primitives
    // ------------------------------------------------------------------

    /// Fetch a whole document body, or `None` if the document does not exist.
    ///
    /// Absence is not an error: callers treat a missing floor document as an
    /// empty item list.
    pub fn get_document(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> Result<Option<serde_json::Value>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND doc_id = ?2",
                params![collection, doc_id],
                |row| row.get(0),
            )
            .optional()?;

        match body {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Write (upsert) a whole document body.
    ///
    /// There is no conditional-write variant: the last writer wins, exactly
    /// like the document database this models.  The server serializes access
    /// behind a single handle, so in-process read-modify-write sequences do
    /// not interleave.
    pub fn set_document(
        &self,
        collection: &str,
        doc_id: &str,
        body: &serde_json::Value,
    ) -> Result<()> {
        let raw = serde_json::to_string(body)?;
        self.conn.execute(
            "INSERT INTO documents (collection, doc_id, body, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (collection, doc_id) DO UPDATE
             SET body = excluded.body, updated_at = excluded.updated_at",
            params![
                collection,
                doc_id,
                raw,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}
