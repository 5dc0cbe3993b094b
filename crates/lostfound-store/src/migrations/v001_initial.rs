//! v001 -- Initial schema creation.
//!
//! Creates the single `documents` table.  The store is document-oriented:
//! each row holds one whole JSON body keyed by `(collection, doc_id)`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Documents
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,                 -- e.g. 'lostItems', 'settings'
    doc_id     TEXT NOT NULL,                 -- e.g. 'floor1', 'schoolNotice'
    body       TEXT NOT NULL,                 -- whole JSON document
    updated_at TEXT NOT NULL,                 -- ISO-8601 / RFC-3339

    PRIMARY KEY (collection, doc_id)
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
