//! Domain model structs persisted in the floor and notice documents.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be embedded
//! directly into a stored document body and handed to the HTTP layer without
//! a separate DTO.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

// ---------------------------------------------------------------------------
// Floor
// ---------------------------------------------------------------------------

/// A validated building floor number.
///
/// The registry covers a fixed four-storey building; a [`Floor`] can only be
/// constructed for a value in `{1, 2, 3, 4}`.  Each floor maps to one stored
/// document (the partition of every read-modify-write).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Floor(i64);

impl Floor {
    /// All floors in ascending order.  Scans and concatenations iterate this.
    pub const ALL: [Floor; 4] = [Floor(1), Floor(2), Floor(3), Floor(4)];

    /// Validate a raw floor number.
    pub fn new(n: i64) -> Result<Self, StoreError> {
        if (1..=4).contains(&n) {
            Ok(Floor(n))
        } else {
            Err(StoreError::InvalidFloor(n))
        }
    }

    /// The raw floor number.
    pub fn number(self) -> i64 {
        self.0
    }

    /// Document id of this floor's partition, e.g. `floor2`.
    pub fn doc_id(self) -> String {
        format!("floor{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ImageRef
// ---------------------------------------------------------------------------

/// Reference to an item's image.
///
/// The stored JSON keeps the legacy two-field shape (`image` / `imageUrl`,
/// at most one non-null), but in memory the representation is a single
/// tagged variant so "both set" and "which field wins" states cannot exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ImageFields", into = "ImageFields")]
pub enum ImageRef {
    /// No image attached.
    #[default]
    None,
    /// Inline payload, normally a `data:<mime>;base64,...` URL.
    Inline(String),
    /// Absolute URL hosted elsewhere.
    External(String),
    /// Relative path into this server's upload directory (`/uploads/...`).
    StoredPath(String),
}

impl ImageRef {
    /// Classify a raw `(image, imageUrl)` pair as read from a request body
    /// or a legacy stored record.  `image` wins when both are present.
    pub fn classify(image: Option<String>, image_url: Option<String>) -> Self {
        if let Some(data) = image.filter(|s| !s.is_empty()) {
            return ImageRef::Inline(data);
        }
        match image_url.filter(|s| !s.is_empty()) {
            Some(url) if url.starts_with('/') => ImageRef::StoredPath(url),
            Some(url) => ImageRef::External(url),
            None => ImageRef::None,
        }
    }
}

/// Legacy wire/stored shape of an [`ImageRef`].
#[derive(Serialize, Deserialize)]
struct ImageFields {
    #[serde(default)]
    image: Option<String>,
    #[serde(rename = "imageUrl", default)]
    image_url: Option<String>,
}

impl From<ImageFields> for ImageRef {
    fn from(fields: ImageFields) -> Self {
        ImageRef::classify(fields.image, fields.image_url)
    }
}

impl From<ImageRef> for ImageFields {
    fn from(image: ImageRef) -> Self {
        let (image, image_url) = match image {
            ImageRef::None => (None, None),
            ImageRef::Inline(data) => (Some(data), None),
            ImageRef::External(url) => (None, Some(url)),
            ImageRef::StoredPath(path) => (None, Some(path)),
        };
        ImageFields { image, image_url }
    }
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// A single lost-item record, stored inside its floor document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    /// Globally unique id: creation epoch-millis plus a short random suffix.
    pub id: String,
    /// Short title, required non-empty.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub desc: String,
    /// Floor the item was found on.  Matches the partition it is stored in.
    pub floor: i64,
    /// Creation time, epoch milliseconds.
    #[serde(rename = "createdAt", default)]
    pub created_at: i64,
    /// Attached image, flattened into the legacy `image`/`imageUrl` fields.
    #[serde(flatten)]
    pub image: ImageRef,
}

/// Generate a fresh item id: epoch-millis timestamp concatenated with five
/// random base-36 characters.  Never reused; uniqueness within a millisecond
/// rests on the suffix.
pub fn generate_item_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .map(char::from)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .take(5)
        .collect();
    format!("{millis}{suffix}")
}

// ---------------------------------------------------------------------------
// ItemPatch
// ---------------------------------------------------------------------------

/// Partial update for an [`Item`].  Absent fields are left untouched;
/// `image: None` (the `Option`) keeps the current image representation.
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub desc: Option<String>,
    pub floor: Option<i64>,
    pub image: Option<ImageRef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_validation() {
        assert!(Floor::new(1).is_ok());
        assert!(Floor::new(4).is_ok());
        assert!(matches!(Floor::new(0), Err(StoreError::InvalidFloor(0))));
        assert!(matches!(Floor::new(5), Err(StoreError::InvalidFloor(5))));
        assert_eq!(Floor::new(3).unwrap().doc_id(), "floor3");
    }

    #[test]
    fn image_ref_classification() {
        assert_eq!(ImageRef::classify(None, None), ImageRef::None);
        assert_eq!(
            ImageRef::classify(Some("data:image/png;base64,AAAA".into()), None),
            ImageRef::Inline("data:image/png;base64,AAAA".into())
        );
        // image wins over imageUrl when both are present
        assert_eq!(
            ImageRef::classify(Some("data:x".into()), Some("https://e.com/a.jpg".into())),
            ImageRef::Inline("data:x".into())
        );
        assert_eq!(
            ImageRef::classify(None, Some("https://e.com/a.jpg".into())),
            ImageRef::External("https://e.com/a.jpg".into())
        );
        // legacy relative upload paths are recognised as locally stored
        assert_eq!(
            ImageRef::classify(None, Some("/uploads/abc.jpg".into())),
            ImageRef::StoredPath("/uploads/abc.jpg".into())
        );
    }

    #[test]
    fn item_wire_shape() {
        let item = Item {
            id: "1700000000000abcde".into(),
            title: "Phone".into(),
            desc: "Black iPhone".into(),
            floor: 2,
            created_at: 1_700_000_000_000,
            image: ImageRef::None,
        };

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["createdAt"], 1_700_000_000_000_i64);
        // both legacy image fields present and null when no image is attached
        assert!(value["image"].is_null());
        assert!(value["imageUrl"].is_null());

        let back: Item = serde_json::from_value(value).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn item_wire_shape_stored_path() {
        let item = Item {
            id: "x".into(),
            title: "Hat".into(),
            desc: String::new(),
            floor: 1,
            created_at: 0,
            image: ImageRef::StoredPath("/uploads/a.png".into()),
        };

        let value = serde_json::to_value(&item).unwrap();
        assert!(value["image"].is_null());
        assert_eq!(value["imageUrl"], "/uploads/a.png");

        let back: Item = serde_json::from_value(value).unwrap();
        assert_eq!(back.image, ImageRef::StoredPath("/uploads/a.png".into()));
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = generate_item_id();
        let b = generate_item_id();
        assert_ne!(a, b);
        assert!(a.len() > 13);
    }
}
