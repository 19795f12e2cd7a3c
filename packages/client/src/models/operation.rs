//! Pending mutation operations
//!
//! Every local mutation of the document appends one [`Operation`] to the
//! queue of the origin tree that owns the target item. Operations carry a
//! best-effort `undo_data` snapshot of prior state for server-side undo;
//! fields are populated opportunistically and may be incomplete, matching
//! what the web client sends.
//!
//! `client_timestamp` is attached when a batch is flushed, not when the
//! operation is recorded.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of a pending operation, in the server's wire vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    /// Create a new item.
    Create,
    /// Edit an item's name or note.
    Edit,
    /// Move an item under a new parent.
    Move,
    /// Delete an item.
    Delete,
    /// Enable sharing of any kind on an item.
    Share,
    /// Disable sharing entirely on an item.
    Unshare,
    /// Attach a shared URL to an item.
    AddSharedUrl,
    /// Detach the shared URL from an item.
    RemoveSharedUrl,
}

/// Type-specific operation payload.
///
/// Field names follow the native wire format (`projectid`, `parentid`,
/// `description` for notes). Absent fields are omitted from the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationData {
    /// Target item id.
    #[serde(rename = "projectid")]
    pub project_id: String,
    /// New parent id, for create and move.
    #[serde(rename = "parentid", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Position among siblings, for create and move.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    /// New name, for edit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New note, for edit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Native permission level, for add_shared_url.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_level: Option<i64>,
    /// URL access token, for add_shared_url.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// Best-effort snapshot of prior state for server-side undo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UndoData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_last_modified: Option<i64>,
    /// The web client always sends `null` here; kept as a raw value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_last_modified_by: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_description: Option<String>,
    #[serde(rename = "previous_parentid", skip_serializing_if = "Option::is_none")]
    pub previous_parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_priority: Option<i64>,
    /// Parent at deletion time, recorded under this bare name for delete.
    #[serde(rename = "parentid", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Priority at deletion time, recorded under this bare name for delete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_permission_level: Option<i64>,
    /// Permission level at removal time, for remove_shared_url.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_level: Option<i64>,
}

impl UndoData {
    /// Snapshot shared by most operations: the target's last-modified
    /// timestamp plus the (always-null) last modifier.
    fn touched(previous_last_modified: i64) -> Self {
        Self {
            previous_last_modified: Some(previous_last_modified),
            previous_last_modified_by: Some(Value::Null),
            ..Self::default()
        }
    }
}

/// An intent to mutate server state, queued until the next flush.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Operation kind.
    #[serde(rename = "type")]
    pub kind: OperationType,
    /// Type-specific payload.
    pub data: OperationData,
    /// Seconds since the account join time, attached at flush time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_timestamp: Option<i64>,
    /// Prior-state snapshot for server-side undo.
    pub undo_data: UndoData,
}

impl Operation {
    fn new(kind: OperationType, data: OperationData, undo_data: UndoData) -> Self {
        Self {
            kind,
            data,
            client_timestamp: None,
            undo_data,
        }
    }

    /// A `create` operation for a freshly inserted blank item.
    pub fn create(project_id: String, parent_id: String, priority: i64) -> Self {
        Self::new(
            OperationType::Create,
            OperationData {
                project_id,
                parent_id: Some(parent_id),
                priority: Some(priority),
                ..OperationData::default()
            },
            UndoData::default(),
        )
    }

    /// An `edit` operation carrying a new name.
    pub fn edit_name(
        project_id: String,
        name: String,
        previous_name: String,
        previous_last_modified: i64,
    ) -> Self {
        Self::new(
            OperationType::Edit,
            OperationData {
                project_id,
                name: Some(name),
                ..OperationData::default()
            },
            UndoData {
                previous_name: Some(previous_name),
                ..UndoData::touched(previous_last_modified)
            },
        )
    }

    /// An `edit` operation carrying a new note.
    pub fn edit_note(
        project_id: String,
        note: String,
        previous_note: Option<String>,
        previous_last_modified: i64,
    ) -> Self {
        Self::new(
            OperationType::Edit,
            OperationData {
                project_id,
                description: Some(note),
                ..OperationData::default()
            },
            UndoData {
                previous_description: previous_note,
                ..UndoData::touched(previous_last_modified)
            },
        )
    }

    /// A `move` operation with the previous location snapshot.
    pub fn move_item(
        project_id: String,
        parent_id: String,
        priority: i64,
        previous_parent_id: String,
        previous_priority: i64,
        previous_last_modified: i64,
    ) -> Self {
        Self::new(
            OperationType::Move,
            OperationData {
                project_id,
                parent_id: Some(parent_id),
                priority: Some(priority),
                ..OperationData::default()
            },
            UndoData {
                previous_parent_id: Some(previous_parent_id),
                previous_priority: Some(previous_priority),
                ..UndoData::touched(previous_last_modified)
            },
        )
    }

    /// A `delete` operation with the position snapshot needed to restore it.
    pub fn delete(
        project_id: String,
        parent_id: String,
        priority: i64,
        previous_last_modified: i64,
    ) -> Self {
        Self::new(
            OperationType::Delete,
            OperationData {
                project_id,
                ..OperationData::default()
            },
            UndoData {
                parent_id: Some(parent_id),
                priority: Some(priority),
                ..UndoData::touched(previous_last_modified)
            },
        )
    }

    /// A generic `share` operation, recorded when the first sharing channel
    /// is enabled on an item.
    pub fn share(project_id: String, previous_last_modified: i64) -> Self {
        Self::new(
            OperationType::Share,
            OperationData {
                project_id,
                ..OperationData::default()
            },
            UndoData::touched(previous_last_modified),
        )
    }

    /// A generic `unshare` operation, recorded when the last sharing channel
    /// is disabled on an item.
    pub fn unshare(project_id: String, previous_last_modified: i64) -> Self {
        Self::new(
            OperationType::Unshare,
            OperationData {
                project_id,
                ..OperationData::default()
            },
            UndoData::touched(previous_last_modified),
        )
    }

    /// An `add_shared_url` operation. The undo snapshot repeats the level
    /// being set, which is what the web client sends.
    pub fn add_shared_url(
        project_id: String,
        permission_level: i64,
        access_token: String,
        previous_last_modified: i64,
    ) -> Self {
        Self::new(
            OperationType::AddSharedUrl,
            OperationData {
                project_id,
                permission_level: Some(permission_level),
                access_token: Some(access_token),
                ..OperationData::default()
            },
            UndoData {
                previous_permission_level: Some(permission_level),
                ..UndoData::touched(previous_last_modified)
            },
        )
    }

    /// A `remove_shared_url` operation capturing the level being removed.
    pub fn remove_shared_url(
        project_id: String,
        permission_level: i64,
        previous_last_modified: i64,
    ) -> Self {
        Self::new(
            OperationType::RemoveSharedUrl,
            OperationData {
                project_id,
                ..OperationData::default()
            },
            UndoData {
                permission_level: Some(permission_level),
                ..UndoData::touched(previous_last_modified)
            },
        )
    }

    /// Returns a copy with `client_timestamp` set, used at flush time.
    pub fn with_client_timestamp(mut self, timestamp: i64) -> Self {
        self.client_timestamp = Some(timestamp);
        self
    }
}
