//! Floor-partitioned CRUD for [`Item`] records.
//!
//! Every floor owns one document (`lostItems/floor{n}`) holding its full
//! item list.  All mutations are read-modify-write on that whole list; the
//! cross-floor move rewrites two partitions inside a single transaction.

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{generate_item_id, Floor, ImageRef, Item, ItemPatch};

/// Collection holding one document per floor.
const ITEMS_COLLECTION: &str = "lostItems";

impl Database {
    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// List the items stored on one floor, in stored order.
    ///
    /// A floor document that does not exist yet is an empty list, not an
    /// error.  Fails with [`StoreError::InvalidFloor`] outside `{1..4}`.
    pub fn list_floor_items(&self, floor: i64) -> Result<Vec<Item>> {
        let floor = Floor::new(floor)?;
        self.read_floor_items(floor)
    }

    /// List every item in the building, concatenated floor-ascending.
    pub fn list_all_items(&self) -> Result<Vec<Item>> {
        let mut all = Vec::new();
        for floor in Floor::ALL {
            all.extend(self.read_floor_items(floor)?);
        }
        Ok(all)
    }

    /// Find an item by id, scanning floors in ascending order.
    ///
    /// Linear across all partitions; fine because the floor count is small
    /// and fixed.  Fails with [`StoreError::NotFound`] if no floor holds it.
    pub fn find_item(&self, id: &str) -> Result<(Floor, Item)> {
        let (floor, index, items) = self.locate_item(id)?;
        Ok((floor, items[index].clone()))
    }

    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Register a new item on a floor and return its generated id.
    ///
    /// Fails with [`StoreError::InvalidInput`] when the title is empty after
    /// trimming, [`StoreError::InvalidFloor`] for a floor outside the set.
    pub fn create_item(
        &self,
        floor: i64,
        title: &str,
        desc: &str,
        image: ImageRef,
    ) -> Result<String> {
        let floor = Floor::new(floor)?;
        let title = title.trim();
        if title.is_empty() {
            return Err(StoreError::InvalidInput("title required"));
        }

        let item = Item {
            id: generate_item_id(),
            title: title.to_string(),
            desc: desc.trim().to_string(),
            floor: floor.number(),
            created_at: chrono::Utc::now().timestamp_millis(),
            image,
        };
        let id = item.id.clone();

        let mut items = self.read_floor_items(floor)?;
        items.push(item);
        self.write_floor_items(floor, &items)?;

        Ok(id)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Apply a partial update, relocating the item if the floor changes.
    ///
    /// A floor change removes the record from its source partition and
    /// appends it to the destination partition.  Both whole-document writes
    /// happen inside one SQLite transaction, so a failure mid-move cannot
    /// leave the item in neither (or both) floors.
    pub fn update_item(&self, id: &str, patch: &ItemPatch) -> Result<()> {
        let (src_floor, index, mut items) = self.locate_item(id)?;

        let mut item = items[index].clone();
        if let Some(title) = &patch.title {
            item.title = title.clone();
        }
        if let Some(desc) = &patch.desc {
            item.desc = desc.clone();
        }
        if let Some(image) = &patch.image {
            item.image = image.clone();
        }

        let dst_floor = match patch.floor {
            Some(n) => Floor::new(n)?,
            None => src_floor,
        };

        if dst_floor == src_floor {
            items[index] = item;
            return self.write_floor_items(src_floor, &items);
        }

        let tx = self.conn().unchecked_transaction()?;

        items.remove(index);
        self.write_floor_items(src_floor, &items)?;

        item.floor = dst_floor.number();
        let mut dst_items = self.read_floor_items(dst_floor)?;
        dst_items.push(item);
        self.write_floor_items(dst_floor, &dst_items)?;

        tx.commit()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Remove an item from its floor.  Fails with [`StoreError::NotFound`]
    /// if no floor holds it.
    pub fn delete_item(&self, id: &str) -> Result<()> {
        let (floor, index, mut items) = self.locate_item(id)?;
        items.remove(index);
        self.write_floor_items(floor, &items)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn read_floor_items(&self, floor: Floor) -> Result<Vec<Item>> {
        match self.get_document(ITEMS_COLLECTION, &floor.doc_id())? {
            Some(body) => {
                let items = body
                    .get("items")
                    .cloned()
                    .unwrap_or_else(|| serde_json::Value::Array(Vec::new()));
                Ok(serde_json::from_value(items)?)
            }
            None => Ok(Vec::new()),
        }
    }

    fn write_floor_items(&self, floor: Floor, items: &[Item]) -> Result<()> {
        self.set_document(
            ITEMS_COLLECTION,
            &floor.doc_id(),
            &serde_json::json!({ "items": items }),
        )
    }

    /// Scan floors in fixed ascending order for an item id.
    fn locate_item(&self, id: &str) -> Result<(Floor, usize, Vec<Item>)> {
        for floor in Floor::ALL {
            let items = self.read_floor_items(floor)?;
            if let Some(index) = items.iter().position(|it| it.id == id) {
                return Ok((floor, index, items));
            }
        }
        Err(StoreError::NotFound)
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
    fn fresh_floors_are_empty() {
        let (db, _dir) = test_db();
        for floor in 1..=4 {
            assert!(db.list_floor_items(floor).unwrap().is_empty());
        }
    }

    #[test]
    fn list_rejects_bad_floor() {
        let (db, _dir) = test_db();
        assert!(matches!(
            db.list_floor_items(5),
            Err(StoreError::InvalidFloor(5))
        ));
    }

    #[test]
    fn create_and_find() {
        let (db, _dir) = test_db();
        let id = db
            .create_item(3, "Phone", "Black iPhone", ImageRef::None)
            .unwrap();

        let (floor, item) = db.find_item(&id).unwrap();
        assert_eq!(floor.number(), 3);
        assert_eq!(item.floor, 3);
        assert_eq!(item.title, "Phone");
        assert_eq!(item.desc, "Black iPhone");
        assert_eq!(item.image, ImageRef::None);
        assert!(item.created_at > 0);
    }

    #[test]
    fn create_rejects_blank_title() {
        let (db, _dir) = test_db();
        assert!(matches!(
            db.create_item(1, "", "desc", ImageRef::None),
            Err(StoreError::InvalidInput(_))
        ));
        assert!(matches!(
            db.create_item(1, "   ", "desc", ImageRef::None),
            Err(StoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn create_rejects_bad_floor() {
        let (db, _dir) = test_db();
        assert!(matches!(
            db.create_item(5, "Phone", "", ImageRef::None),
            Err(StoreError::InvalidFloor(5))
        ));
    }

    #[test]
    fn ids_are_unique_across_floors() {
        let (db, _dir) = test_db();
        let mut ids = std::collections::HashSet::new();
        for floor in 1..=4 {
            for i in 0..5 {
                let id = db
                    .create_item(floor, &format!("item {i}"), "", ImageRef::None)
                    .unwrap();
                assert!(ids.insert(id));
            }
        }
    }

    #[test]
    fn update_in_place() {
        let (db, _dir) = test_db();
        let id = db.create_item(1, "Hat", "blue", ImageRef::None).unwrap();

        let patch = ItemPatch {
            title: Some("Blue Hat".into()),
            ..Default::default()
        };
        db.update_item(&id, &patch).unwrap();

        let (_, item) = db.find_item(&id).unwrap();
        assert_eq!(item.title, "Blue Hat");
        assert_eq!(item.desc, "blue");

        // in-place update keeps stored order
        let other = db.create_item(1, "Scarf", "", ImageRef::None).unwrap();
        db.update_item(&id, &ItemPatch::default()).unwrap();
        let items = db.list_floor_items(1).unwrap();
        assert_eq!(items[0].id, id);
        assert_eq!(items[1].id, other);
    }

    #[test]
    fn update_moves_between_floors() {
        let (db, _dir) = test_db();
        let id = db.create_item(1, "Umbrella", "red", ImageRef::None).unwrap();

        let patch = ItemPatch {
            floor: Some(2),
            ..Default::default()
        };
        db.update_item(&id, &patch).unwrap();

        assert!(db.list_floor_items(1).unwrap().is_empty());
        let second = db.list_floor_items(2).unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, id);
        assert_eq!(second[0].floor, 2);
    }

    #[test]
    fn update_rejects_bad_destination_floor() {
        let (db, _dir) = test_db();
        let id = db.create_item(1, "Umbrella", "", ImageRef::None).unwrap();

        let patch = ItemPatch {
            floor: Some(7),
            ..Default::default()
        };
        assert!(matches!(
            db.update_item(&id, &patch),
            Err(StoreError::InvalidFloor(7))
        ));

        // source floor untouched after the failed move
        assert_eq!(db.list_floor_items(1).unwrap().len(), 1);
    }

    #[test]
    fn update_unknown_id() {
        let (db, _dir) = test_db();
        assert!(matches!(
            db.update_item("nope", &ItemPatch::default()),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn delete_then_find_fails() {
        let (db, _dir) = test_db();
        let id = db.create_item(2, "Wallet", "", ImageRef::None).unwrap();

        db.delete_item(&id).unwrap();
        assert!(matches!(db.find_item(&id), Err(StoreError::NotFound)));
        assert!(matches!(db.delete_item(&id), Err(StoreError::NotFound)));
    }

    #[test]
    fn find_is_repeatable_without_mutation() {
        let (db, _dir) = test_db();
        let id = db
            .create_item(4, "Keys", "ring of three", ImageRef::None)
            .unwrap();

        let first = db.find_item(&id).unwrap();
        let second = db.find_item(&id).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn list_all_concatenates_floor_ascending() {
        let (db, _dir) = test_db();
        let on_third = db.create_item(3, "Bag", "", ImageRef::None).unwrap();
        let on_first = db.create_item(1, "Pen", "", ImageRef::None).unwrap();

        let all = db.list_all_items().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, on_first);
        assert_eq!(all[1].id, on_third);
    }

    #[test]
    fn image_survives_round_trip() {
        let (db, _dir) = test_db();
        let id = db
            .create_item(
                1,
                "Jacket",
                "",
                ImageRef::StoredPath("/uploads/abc.jpg".into()),
            )
            .unwrap();

        let (_, item) = db.find_item(&id).unwrap();
        assert_eq!(item.image, ImageRef::StoredPath("/uploads/abc.jpg".into()));

        // update without an image field leaves the stored one untouched
        db.update_item(
            &id,
            &ItemPatch {
                desc: Some("leather".into()),
                ..Default::default()
            },
        )
        .unwrap();
        let (_, item) = db.find_item(&id).unwrap();
        assert_eq!(item.image, ImageRef::StoredPath("/uploads/abc.jpg".into()));
    }
}
