//! Notice board: a single ordered list of strings in one document.
//!
//! Appends grow the list at the end (insertion order is display order);
//! removal is by index.

use crate::database::Database;
use crate::error::{Result, StoreError};

const SETTINGS_COLLECTION: &str = "settings";
const NOTICE_DOC_ID: &str = "schoolNotice";

impl Database {
    /// Current notices in display order.  Empty if the document is absent.
    pub fn list_notices(&self) -> Result<Vec<String>> {
        match self.read_notice_doc()? {
            Some(list) => Ok(list),
            None => Ok(Vec::new()),
        }
    }

    /// Append a notice.  Fails with [`StoreError::InvalidInput`] when the
    /// text is empty after trimming.
    pub fn append_notice(&self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StoreError::InvalidInput("text required"));
        }

        let mut list = self.list_notices()?;
        list.push(text.to_string());
        self.write_notice_doc(&list)
    }

    /// Remove the notice at `index`.
    ///
    /// Fails with [`StoreError::NotFound`] when the notice document has
    /// never been written, [`StoreError::InvalidIndex`] outside `[0, len)`.
    pub fn remove_notice_at(&self, index: i64) -> Result<()> {
        let mut list = self.read_notice_doc()?.ok_or(StoreError::NotFound)?;

        if index < 0 || index as usize >= list.len() {
            return Err(StoreError::InvalidIndex {
                index,
                len: list.len(),
            });
        }

        list.remove(index as usize);
        self.write_notice_doc(&list)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// `None` means the singleton document does not exist yet, which only
    /// `remove_notice_at` distinguishes from an empty list.
    fn read_notice_doc(&self) -> Result<Option<Vec<String>>> {
        match self.get_document(SETTINGS_COLLECTION, NOTICE_DOC_ID)? {
            Some(body) => {
                let items = body
                    .get("items")
                    .cloned()
                    .unwrap_or_else(|| serde_json::Value::Array(Vec::new()));
                Ok(Some(serde_json::from_value(items)?))
            }
            None => Ok(None),
        }
    }

    fn write_notice_doc(&self, list: &[String]) -> Result<()> {
        self.set_document(
            SETTINGS_COLLECTION,
            NOTICE_DOC_ID,
            &serde_json::json!({ "items": list }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_db() -> (Database, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (db, dir)
    }

    #[test]
    fn list_is_empty_without_document() {
        let (db, _dir) = test_db();
        assert!(db.list_notices().unwrap().is_empty());
    }

    #[test]
    fn append_then_list() {
        let (db, _dir) = test_db();
        db.append_notice("Fire drill").unwrap();
        assert_eq!(db.list_notices().unwrap(), vec!["Fire drill"]);

        db.append_notice("  Gym closed  ").unwrap();
        assert_eq!(
            db.list_notices().unwrap(),
            vec!["Fire drill", "Gym closed"]
        );
    }

    #[test]
    fn append_rejects_blank_text() {
        let (db, _dir) = test_db();
        assert!(matches!(
            db.append_notice("   "),
            Err(StoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn remove_at_index() {
        let (db, _dir) = test_db();
        db.append_notice("first").unwrap();
        db.append_notice("second").unwrap();

        db.remove_notice_at(0).unwrap();
        assert_eq!(db.list_notices().unwrap(), vec!["second"]);

        db.remove_notice_at(0).unwrap();
        assert!(db.list_notices().unwrap().is_empty());
    }

    #[test]
    fn remove_before_any_append_is_not_found() {
        let (db, _dir) = test_db();
        assert!(matches!(
            db.remove_notice_at(0),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn remove_out_of_range_is_invalid_index() {
        let (db, _dir) = test_db();
        db.append_notice("only one").unwrap();

        assert!(matches!(
            db.remove_notice_at(1),
            Err(StoreError::InvalidIndex { index: 1, len: 1 })
        ));
        assert!(matches!(
            db.remove_notice_at(-1),
            Err(StoreError::InvalidIndex { index: -1, .. })
        ));

        // emptied list still exists as a document, so removal is a range error
        db.remove_notice_at(0).unwrap();
        assert!(matches!(
            db.remove_notice_at(0),
            Err(StoreError::InvalidIndex { index: 0, len: 0 })
        ));
    }
}
