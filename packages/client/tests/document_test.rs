//! Integration tests for the document model
//!
//! Tests cover:
//! - Tree construction from a flat snapshot
//! - Mirror content resolution
//! - Local mutations and the operations they record
//! - Sharing state transitions
//! - Saving through the transport

use std::sync::Arc;

use regex::Regex;
use serde_json::json;
use workflowy_client::models::{InitializationData, TreeData};
use workflowy_client::{
    Document, DocumentError, MockTransport, OperationType, PermissionLevel, ROOT_ID,
};

const JOINED: i64 = 1_600_000_000;

fn initialization() -> InitializationData {
    InitializationData {
        date_joined_timestamp_in_seconds: JOINED,
        initial_most_recent_operation_transaction_id: "tx-0".to_string(),
        owner_id: 42,
        auxiliary_share_ids: Vec::new(),
    }
}

fn main_tree() -> TreeData {
    serde_json::from_value(json!({
        "most_recent_operation_transaction_id": "tx-main",
        "items": [
            { "id": "a", "nm": "List with sublist", "prnt": null, "pr": 0, "lm": 100, "metadata": {} },
            { "id": "a1", "nm": "One", "prnt": "a", "pr": 0, "lm": 100, "metadata": {} },
            { "id": "a2", "nm": "One", "prnt": "a", "pr": 1, "lm": 100, "metadata": {} },
            { "id": "b", "nm": "List with description", "no": "Two Description", "prnt": null, "pr": 1, "lm": 200, "metadata": {} },
            { "id": "c", "nm": "List completed", "prnt": null, "pr": 2, "cp": 300, "lm": 300, "metadata": {} },
            { "id": "d", "nm": "List mirrored", "prnt": null, "pr": 3, "lm": 400, "metadata": {} },
            { "id": "d1", "nm": "Sublist in mirror", "prnt": "d", "pr": 0, "lm": 400, "metadata": {} },
            { "id": "m", "nm": "", "prnt": null, "pr": 4, "lm": 400,
              "metadata": { "mirror": { "originalId": "d", "isMirrorRoot": true } } }
        ]
    }))
    .unwrap()
}

fn mock_document() -> (Arc<MockTransport>, Document) {
    let transport = Arc::new(MockTransport::new());
    let document = Document::from_snapshots(
        transport.clone(),
        initialization(),
        main_tree(),
        Vec::new(),
    );
    (transport, document)
}

// =========================================================================
// Tree construction
// =========================================================================

#[test]
fn test_load_tree() {
    let (_, document) = mock_document();

    let root = document.root();
    assert_eq!(root.id(), ROOT_ID);
    assert_eq!(root.name(), "Home");

    let items = root.items();
    assert_eq!(items.len(), 5);

    assert_eq!(items[0].name(), "List with sublist");
    assert_eq!(items[0].items().len(), 2);
    assert_eq!(items[0].items()[0].name(), "One");
    assert_eq!(items[0].items()[1].name(), "One");

    assert_eq!(items[1].name(), "List with description");
    assert_eq!(items[1].note(), "Two Description");

    assert_eq!(items[2].name(), "List completed");
    assert!(items[2].is_completed());
    assert!(items[2].completed_at().is_some());

    assert_eq!(items[3].name(), "List mirrored");
    assert!(!items[3].is_mirror());

    assert!(!items[1].is_completed());
    assert_eq!(items[1].completed_at(), None);
}

#[test]
fn test_mirror_resolves_content_but_keeps_identity() {
    let (_, document) = mock_document();
    let mirror = document.get_list("m").unwrap();
    let original = document.get_list("d").unwrap();

    // Content is the original's.
    assert_eq!(mirror.name(), "List mirrored");
    assert!(mirror.is_mirror());
    assert_eq!(mirror.original_id().as_deref(), Some("d"));
    assert_eq!(mirror.items().len(), 1);
    assert_eq!(mirror.items()[0].name(), "Sublist in mirror");
    assert_eq!(mirror.is_completed(), original.is_completed());

    // Identity and position are the mirror's own.
    assert_ne!(mirror.id(), original.id());
    assert_eq!(mirror.parent().unwrap().id(), ROOT_ID);
    assert_eq!(mirror.priority(), 4);
    assert_eq!(original.priority(), 3);
}

#[test]
fn test_timestamps_are_join_relative() {
    let (_, document) = mock_document();
    let completed = document.get_list("c").unwrap();

    let completed_at = completed.completed_at().unwrap();
    assert_eq!(completed_at.timestamp(), JOINED + 300);
    assert_eq!(completed.last_modified_at().timestamp(), JOINED + 300);
}

#[test]
fn test_find_children_by_pattern() {
    let (_, document) = mock_document();
    let root = document.root();

    let matches = root.find_all(&Regex::new("^List").unwrap(), None);
    assert_eq!(matches.len(), 5);

    let with_note = root.find_one(
        &Regex::new("description").unwrap(),
        Some(&Regex::new("^Two").unwrap()),
    );
    assert_eq!(with_note.unwrap().id(), "b");

    // The scan covers direct children only, not descendants.
    assert!(root
        .find_one(&Regex::new("Sublist in mirror").unwrap(), None)
        .is_none());
}

// =========================================================================
// Mutations and recorded operations
// =========================================================================

#[test]
fn test_create_list() {
    let (_, document) = mock_document();
    let root = document.root();

    let created = root.create_list(Some(1)).unwrap();

    assert_eq!(created.parent().unwrap().id(), ROOT_ID);
    assert_eq!(created.priority(), 1);
    assert_eq!(created.name(), "");
    assert_eq!(root.item_ids().len(), 6);

    let ops = document.pending_operations();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].kind, OperationType::Create);
    assert_eq!(ops[0].data.project_id, created.id());
    assert_eq!(ops[0].data.parent_id.as_deref(), Some(ROOT_ID));
    assert_eq!(ops[0].data.priority, Some(1));
    assert_eq!(ops[0].client_timestamp, None);
}

#[test]
fn test_create_list_appends_and_clamps() {
    let (_, document) = mock_document();
    let parent = document.get_list("a").unwrap();

    // Two existing children: append lands at index 2.
    let appended = parent.create_list(None).unwrap();
    assert_eq!(appended.priority(), 2);

    // An out-of-range position clamps to the new sibling count.
    let clamped = parent.create_item(Some(99)).unwrap();
    assert_eq!(clamped.priority(), 3);

    let ops = document.pending_operations();
    assert_eq!(ops[0].data.priority, Some(2));
    assert_eq!(ops[1].data.priority, Some(3));
}

#[test]
fn test_created_id_does_not_collide() {
    let (_, document) = mock_document();
    let root = document.root();

    let mut seen: Vec<String> = root.item_ids();
    for _ in 0..10 {
        let created = root.create_list(None).unwrap();
        assert!(!seen.iter().any(|id| id == created.id()));
        seen.push(created.id().to_string());
    }
}

#[test]
fn test_edit_records_previous_values() {
    let (_, document) = mock_document();
    let list = document.get_list("b").unwrap();

    list.set_name("New name")
        .unwrap()
        .set_note("New description")
        .unwrap();

    // Read-after-write consistency through any handle.
    let again = document.get_list("b").unwrap();
    assert_eq!(again.name(), "New name");
    assert_eq!(again.note(), "New description");

    let ops = document.pending_operations();
    assert_eq!(ops.len(), 2);

    assert_eq!(ops[0].kind, OperationType::Edit);
    assert_eq!(ops[0].data.project_id, "b");
    assert_eq!(ops[0].data.name.as_deref(), Some("New name"));
    assert_eq!(
        ops[0].undo_data.previous_name.as_deref(),
        Some("List with description")
    );
    assert_eq!(ops[0].undo_data.previous_last_modified, Some(200));

    assert_eq!(ops[1].data.description.as_deref(), Some("New description"));
    assert_eq!(
        ops[1].undo_data.previous_description.as_deref(),
        Some("Two Description")
    );
}

#[test]
fn test_edit_through_mirror_targets_original() {
    let (_, document) = mock_document();
    let mirror = document.get_list("m").unwrap();

    mirror.set_name("New name").unwrap();

    // Both views show the change.
    assert_eq!(document.get_list("m").unwrap().name(), "New name");
    assert_eq!(document.get_list("d").unwrap().name(), "New name");

    let ops = document.pending_operations();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].data.project_id, "d");
    assert_eq!(
        ops[0].undo_data.previous_name.as_deref(),
        Some("List mirrored")
    );
}

#[test]
fn test_move_list() {
    let (_, document) = mock_document();
    let source_parent = document.get_list("a").unwrap();
    let moved = document.get_list("a2").unwrap();
    let target = document.get_list("d").unwrap();

    assert_eq!(source_parent.items().len(), 2);
    assert_eq!(target.items().len(), 1);

    moved.move_to(&target, Some(0)).unwrap();

    assert_eq!(source_parent.items().len(), 1);
    assert_eq!(moved.parent().unwrap().id(), "d");
    assert_eq!(target.item_ids()[0], "a2");
    assert_eq!(target.items().len(), 2);

    let ops = document.pending_operations();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].kind, OperationType::Move);
    assert_eq!(ops[0].data.project_id, "a2");
    assert_eq!(ops[0].data.parent_id.as_deref(), Some("d"));
    assert_eq!(ops[0].data.priority, Some(0));
    assert_eq!(ops[0].undo_data.previous_parent_id.as_deref(), Some("a"));
    assert_eq!(ops[0].undo_data.previous_priority, Some(1));
}

#[test]
fn test_move_never_duplicates_membership() {
    let (_, document) = mock_document();
    let moved = document.get_list("a2").unwrap();
    let target = document.get_list("d").unwrap();

    moved.move_to(&target, Some(99)).unwrap();

    // Clamped into the target and gone from the old parent.
    assert_eq!(moved.priority(), 1);
    assert!(!document
        .get_list("a")
        .unwrap()
        .item_ids()
        .iter()
        .any(|id| id == "a2"));
}

#[test]
fn test_delete_list() {
    let (_, document) = mock_document();
    let root = document.root();
    let deleted = document.get_list("b").unwrap();

    assert_eq!(root.items().len(), 5);
    deleted.delete().unwrap();

    let items = root.items();
    assert_eq!(items.len(), 4);
    assert_eq!(items[1].name(), "List completed");

    // The arena entry stays behind, unreachable from the root.
    assert!(document.get_list("b").is_ok());

    let ops = document.pending_operations();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].kind, OperationType::Delete);
    assert_eq!(ops[0].data.project_id, "b");
    assert_eq!(ops[0].undo_data.parent_id.as_deref(), Some(ROOT_ID));
    assert_eq!(ops[0].undo_data.priority, Some(1));
}

#[test]
fn test_root_cannot_be_moved_or_deleted() {
    let (_, document) = mock_document();
    let root = document.root();
    let target = document.get_list("a").unwrap();

    assert!(matches!(
        root.delete(),
        Err(DocumentError::InvalidOperation { .. })
    ));
    assert!(matches!(
        root.move_to(&target, None),
        Err(DocumentError::InvalidOperation { .. })
    ));
    assert!(document.pending_operations().is_empty());
}

// =========================================================================
// Sharing
// =========================================================================

#[test]
fn test_share_via_url_then_unshare_restores_state_but_keeps_operations() {
    let (_, document) = mock_document();
    let list = document.get_list("b").unwrap();

    assert!(!list.is_shared_via_url());
    assert!(!list.is_shared_via_email());

    let url = list.share_via_url(PermissionLevel::View).unwrap();
    assert!(url.starts_with("https://workflowy.com/s/"));
    assert!(list.is_shared_via_url());
    assert_eq!(list.shared_url(), Some(url));
    assert_eq!(list.shared_url_permission_level(), PermissionLevel::View);

    list.unshare_via_url().unwrap();
    assert!(!list.is_shared_via_url());
    assert_eq!(list.shared_url(), None);
    assert_eq!(list.shared_url_permission_level(), PermissionLevel::None);

    // Net state is back to unshared, but every step stayed recorded.
    let kinds: Vec<OperationType> = document
        .pending_operations()
        .iter()
        .map(|op| op.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            OperationType::Share,
            OperationType::AddSharedUrl,
            OperationType::RemoveSharedUrl,
            OperationType::Unshare,
        ]
    );
}

#[test]
fn test_share_via_url_twice_records_twice() {
    let (_, document) = mock_document();
    let list = document.get_list("b").unwrap();

    let first = list.share_via_url(PermissionLevel::FullAccess).unwrap();
    let second = list.share_via_url(PermissionLevel::FullAccess).unwrap();

    // Same token, no local change, but the operation is re-recorded.
    assert_eq!(first, second);
    let kinds: Vec<OperationType> = document
        .pending_operations()
        .iter()
        .map(|op| op.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            OperationType::Share,
            OperationType::AddSharedUrl,
            OperationType::AddSharedUrl,
        ]
    );
}

#[test]
fn test_share_rejects_non_granting_level() {
    let (_, document) = mock_document();
    let list = document.get_list("b").unwrap();

    assert!(matches!(
        list.share_via_url(PermissionLevel::None),
        Err(DocumentError::InvalidPermissionLevel)
    ));
    assert!(document.pending_operations().is_empty());
    assert!(!list.is_shared_via_url());
}

#[test]
fn test_unshare_when_not_shared_is_a_no_op() {
    let (_, document) = mock_document();
    let list = document.get_list("b").unwrap();

    list.unshare_via_url().unwrap();
    assert!(document.pending_operations().is_empty());
}

#[test]
fn test_add_shared_url_operation_payload() {
    let (_, document) = mock_document();
    let list = document.get_list("b").unwrap();

    list.share_via_url(PermissionLevel::EditAndComment).unwrap();

    let ops = document.pending_operations();
    let add = &ops[1];
    assert_eq!(add.kind, OperationType::AddSharedUrl);
    assert_eq!(add.data.project_id, "b");
    assert_eq!(add.data.permission_level, Some(2));
    let token = add.data.access_token.as_deref().unwrap();
    assert_eq!(token.len(), 16);
    assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
}

// =========================================================================
// Saving
// =========================================================================

#[tokio::test]
async fn test_save_flushes_queue_and_advances_cursor() {
    let (transport, document) = mock_document();
    assert!(!document.is_dirty());

    document
        .get_list("b")
        .unwrap()
        .set_name("Renamed")
        .unwrap();
    assert!(document.is_dirty());

    document.save().await.unwrap();

    assert!(!document.is_dirty());
    assert!(document.pending_operations().is_empty());

    let pushes = transport.pushes();
    assert_eq!(pushes.len(), 1);
    assert_eq!(pushes[0].cursor, "tx-main");
    assert_eq!(pushes[0].share_id, None);
    assert_eq!(pushes[0].operations.len(), 1);
    // The timestamp is attached at flush time.
    assert!(pushes[0].operations[0].client_timestamp.is_some());

    // A second save has nothing to flush.
    document.save().await.unwrap();
    assert_eq!(transport.pushes().len(), 1);

    // The next flush of the same tree carries the advanced cursor.
    document.get_list("b").unwrap().set_name("Again").unwrap();
    document.save().await.unwrap();
    assert_eq!(transport.pushes()[1].cursor, "tx-main-next");
}

#[tokio::test]
async fn test_save_failure_drops_the_batch() {
    let (transport, document) = mock_document();
    transport.queue_push_result(workflowy_client::models::OperationResult {
        error_encountered_in_remote_operations: true,
        new_most_recent_operation_transaction_id: "tx-err".to_string(),
    });

    document.get_list("b").unwrap().set_name("Doomed").unwrap();

    let result = document.save().await;
    assert!(matches!(result, Err(DocumentError::RemoteOperationFailed)));

    // The batch is dropped, not restored; retry policy is the caller's.
    assert!(!document.is_dirty());
    assert_eq!(transport.pushes().len(), 1);
}
