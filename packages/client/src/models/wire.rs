//! Wire payload types for the private WorkFlowy API
//!
//! These structs mirror the JSON shapes the server actually sends. Parsing
//! is fail-closed: a payload that does not match the expected shape is
//! rejected as a whole and the document model is never built from a
//! partially valid snapshot. Unknown extra fields are ignored, missing or
//! mistyped required fields are errors.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::operation::Operation;
use crate::models::share::{ItemShareInfo, PermissionLevel};

/// Envelope of `get_initialization_data`.
///
/// Only the main project tree info is consumed; the rest of the payload
/// (settings, feature flags) is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct InitializationPayload {
    #[serde(rename = "projectTreeData")]
    project_tree_data: ProjectTreeData,
}

#[derive(Debug, Clone, Deserialize)]
struct ProjectTreeData {
    #[serde(rename = "mainProjectTreeInfo")]
    main_project_tree_info: MainProjectTreeInfo,
}

#[derive(Debug, Clone, Deserialize)]
struct MainProjectTreeInfo {
    #[serde(rename = "dateJoinedTimestampInSeconds")]
    date_joined_timestamp_in_seconds: i64,
    #[serde(rename = "initialMostRecentOperationTransactionId")]
    initial_most_recent_operation_transaction_id: String,
    #[serde(rename = "ownerId")]
    owner_id: i64,
    #[serde(rename = "auxiliaryProjectTreeInfos", default)]
    auxiliary_project_tree_infos: Vec<AuxiliaryProjectTreeInfo>,
}

#[derive(Debug, Clone, Deserialize)]
struct AuxiliaryProjectTreeInfo {
    #[serde(rename = "shareId", default)]
    share_id: Option<String>,
}

/// Flattened initialization data consumed by the rest of the client.
#[derive(Debug, Clone, PartialEq)]
pub struct InitializationData {
    /// Epoch seconds of the account's join time; every raw timestamp in
    /// the tree payload is relative to this.
    pub date_joined_timestamp_in_seconds: i64,
    /// Transaction cursor for the main tree as of initialization.
    pub initial_most_recent_operation_transaction_id: String,
    /// Numeric id of the account owner, echoed back on every push.
    pub owner_id: i64,
    /// Share ids of trees shared with this account, used to seed
    /// shared-tree stitching.
    pub auxiliary_share_ids: Vec<String>,
}

impl From<InitializationPayload> for InitializationData {
    fn from(payload: InitializationPayload) -> Self {
        let info = payload.project_tree_data.main_project_tree_info;
        Self {
            date_joined_timestamp_in_seconds: info.date_joined_timestamp_in_seconds,
            initial_most_recent_operation_transaction_id: info
                .initial_most_recent_operation_transaction_id,
            owner_id: info.owner_id,
            auxiliary_share_ids: info
                .auxiliary_project_tree_infos
                .into_iter()
                .filter_map(|aux| aux.share_id)
                .collect(),
        }
    }
}

/// One flat item record of a `get_tree_data` response.
///
/// The server uses abbreviated field names; `prnt` is `null` for items at
/// the top level of their origin tree.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeItemData {
    pub id: String,
    #[serde(rename = "nm")]
    pub name: String,
    #[serde(rename = "no", default)]
    pub note: Option<String>,
    #[serde(rename = "prnt")]
    pub parent_id: Option<String>,
    #[serde(rename = "pr")]
    pub priority: i64,
    #[serde(rename = "cp", default)]
    pub completed_at: Option<i64>,
    #[serde(rename = "lm")]
    pub last_modified: i64,
    pub metadata: ItemMetadata,
}

/// Item metadata blob; only mirror bookkeeping is consumed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemMetadata {
    #[serde(default)]
    pub mirror: Option<MirrorMetadata>,
}

/// Mirror bookkeeping inside item metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MirrorMetadata {
    #[serde(rename = "originalId", default)]
    pub original_id: Option<String>,
    #[serde(rename = "isMirrorRoot", default)]
    pub is_mirror_root: Option<bool>,
}

/// Per-item sharing block of a tree payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SharedProjectInfo {
    /// Share id under which the subtree anchored at this item can be
    /// fetched as its own tree.
    #[serde(default)]
    pub share_id: Option<String>,
    #[serde(default)]
    pub url_shared_info: Option<UrlSharedInfo>,
    #[serde(default)]
    pub email_shared_info: Option<Value>,
}

/// URL-sharing details inside [`SharedProjectInfo`].
#[derive(Debug, Clone, Deserialize)]
pub struct UrlSharedInfo {
    pub access_token: String,
    pub permission_level: i64,
}

impl SharedProjectInfo {
    /// Derives the runtime sharing state from the wire block.
    pub fn to_share_info(&self) -> ItemShareInfo {
        ItemShareInfo {
            is_shared_via_url: self.url_shared_info.is_some(),
            url_access_token: self
                .url_shared_info
                .as_ref()
                .map(|info| info.access_token.clone()),
            url_permission_level: self
                .url_shared_info
                .as_ref()
                .map(|info| PermissionLevel::from_native(info.permission_level)),
            is_shared_via_email: self.email_shared_info.is_some(),
        }
    }
}

/// One tree snapshot: the user's own tree, or one shared tree.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeData {
    /// Transaction cursor for this tree as of the fetch.
    pub most_recent_operation_transaction_id: String,
    /// Flat, unordered item records.
    pub items: Vec<TreeItemData>,
    /// Sharing blocks keyed by item id.
    #[serde(default)]
    pub shared_projects: HashMap<String, SharedProjectInfo>,
}

/// One per-tree envelope inside the `push_poll_data` form field.
#[derive(Debug, Clone, Serialize)]
pub struct PushEnvelope {
    pub most_recent_operation_transaction_id: String,
    pub operations: Vec<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_id: Option<String>,
}

/// Outcome of one pushed envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationResult {
    /// True if the server rejected any operation of the batch.
    pub error_encountered_in_remote_operations: bool,
    /// Cursor to use for the next flush of the same tree.
    pub new_most_recent_operation_transaction_id: String,
}

/// Response of `push_and_poll`; the first result is the one that matters.
#[derive(Debug, Clone, Deserialize)]
pub struct PushPollResponse {
    pub results: Vec<OperationResult>,
}

impl PushPollResponse {
    /// Extracts the first (and in practice only) result.
    pub fn into_result(mut self) -> Option<OperationResult> {
        if self.results.is_empty() {
            None
        } else {
            Some(self.results.remove(0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_initialization_payload_flattens() {
        let payload: InitializationPayload = serde_json::from_value(json!({
            "projectTreeData": {
                "mainProjectTreeInfo": {
                    "dateJoinedTimestampInSeconds": 1_600_000_000,
                    "initialMostRecentOperationTransactionId": "tx-1",
                    "ownerId": 12345,
                    "auxiliaryProjectTreeInfos": [
                        { "shareId": "shr-1" },
                        { "shareId": null }
                    ]
                }
            },
            "settings": { "theme": "dark" }
        }))
        .unwrap();

        let data = InitializationData::from(payload);
        assert_eq!(data.date_joined_timestamp_in_seconds, 1_600_000_000);
        assert_eq!(data.initial_most_recent_operation_transaction_id, "tx-1");
        assert_eq!(data.owner_id, 12345);
        assert_eq!(data.auxiliary_share_ids, vec!["shr-1".to_string()]);
    }

    #[test]
    fn test_tree_item_short_names() {
        let item: TreeItemData = serde_json::from_value(json!({
            "id": "a",
            "nm": "Name",
            "no": "Note",
            "prnt": null,
            "pr": 7,
            "cp": 100,
            "lm": 200,
            "metadata": { "mirror": { "originalId": "b", "isMirrorRoot": true } }
        }))
        .unwrap();

        assert_eq!(item.name, "Name");
        assert_eq!(item.note.as_deref(), Some("Note"));
        assert_eq!(item.parent_id, None);
        assert_eq!(item.priority, 7);
        assert_eq!(item.completed_at, Some(100));
        assert_eq!(item.last_modified, 200);
        let mirror = item.metadata.mirror.unwrap();
        assert_eq!(mirror.original_id.as_deref(), Some("b"));
        assert_eq!(mirror.is_mirror_root, Some(true));
    }

    #[test]
    fn test_tree_item_rejects_missing_required_field() {
        // No `lm` field: the record must be rejected, not defaulted.
        let result: Result<TreeItemData, _> = serde_json::from_value(json!({
            "id": "a",
            "nm": "Name",
            "prnt": null,
            "pr": 0,
            "metadata": {}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_shared_project_info_to_share_info() {
        let info: SharedProjectInfo = serde_json::from_value(json!({
            "share_id": "shr-9",
            "url_shared_info": { "access_token": "tok", "permission_level": 2 }
        }))
        .unwrap();

        let share = info.to_share_info();
        assert!(share.is_shared_via_url);
        assert!(!share.is_shared_via_email);
        assert_eq!(share.url_access_token.as_deref(), Some("tok"));
        assert_eq!(
            share.url_permission_level,
            Some(PermissionLevel::EditAndComment)
        );
    }

    #[test]
    fn test_push_poll_response_first_result() {
        let response: PushPollResponse = serde_json::from_value(json!({
            "results": [
                {
                    "error_encountered_in_remote_operations": false,
                    "new_most_recent_operation_transaction_id": "tx-2"
                }
            ]
        }))
        .unwrap();

        let result = response.into_result().unwrap();
        assert!(!result.error_encountered_in_remote_operations);
        assert_eq!(result.new_most_recent_operation_transaction_id, "tx-2");
    }
}
