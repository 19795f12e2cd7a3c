//! Outline item entity
//!
//! [`Item`] is the arena representation of one WorkFlowy list. A document
//! holds a single `id -> Item` map covering the user's own tree and every
//! stitched shared tree; the `children` vector is derived from `parent_id`
//! back-references at load time and then kept consistent in place by
//! structural mutations.

/// Sentinel parent id marking an item as top-level in its origin tree.
///
/// The synthetic root of a document uses this value as its own id.
pub const ROOT_ID: &str = "None";

/// Display name given to the synthetic root item.
pub const ROOT_NAME: &str = "Home";

/// A single entry of the outline tree.
///
/// Raw timestamps (`completed_at`, `last_modified`) are seconds since the
/// account's join time, exactly as the server reports them. The numeric
/// `priority` is only consulted while ordering siblings during tree
/// construction; afterwards the position inside the parent's `children`
/// vector is the authoritative order.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// Item id, unique within its origin tree.
    pub id: String,
    /// List name.
    pub name: String,
    /// Optional note attached to the list.
    pub note: Option<String>,
    /// Parent item id, [`ROOT_ID`] for top-level items.
    pub parent_id: String,
    /// Server-side sibling ordering key, used only for the initial sort.
    pub priority: i64,
    /// Completion timestamp in seconds since join time, if completed.
    pub completed_at: Option<i64>,
    /// Last modification timestamp in seconds since join time.
    pub last_modified: i64,
    /// True if this item is a live mirror of another item.
    pub is_mirror_root: bool,
    /// Id of the mirrored item, present when `is_mirror_root` is set.
    pub original_id: Option<String>,
    /// Share id anchoring a separately fetched tree under this item.
    pub share_id: Option<String>,
    /// Ordered child item ids; rebuilt at load time, mutated in place.
    pub children: Vec<String>,
    /// Share id of the origin tree this item was fetched from.
    /// `None` for the user's own tree.
    pub origin: Option<String>,
}

impl Item {
    /// Creates an empty placeholder entry for an id that has been referenced
    /// but not yet described by a fetched record.
    ///
    /// Placeholders support forward references during tree construction and
    /// also absorb items whose declared parent is missing from the snapshot;
    /// such a parent stays empty and unreachable from the root, which keeps
    /// the data-integrity signal visible instead of dropping the orphan.
    pub fn placeholder(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            note: None,
            parent_id: ROOT_ID.to_string(),
            priority: 0,
            completed_at: None,
            last_modified: 0,
            is_mirror_root: false,
            original_id: None,
            share_id: None,
            children: Vec::new(),
            origin: None,
        }
    }

    /// True if this item is the synthetic root of the document.
    pub fn is_root(&self) -> bool {
        self.id == ROOT_ID
    }
}
