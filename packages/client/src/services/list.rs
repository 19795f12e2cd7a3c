//! List handle API
//!
//! A [`List`] is a lightweight handle (item id plus shared document state)
//! for one node of the outline. Handles never copy item data; every read
//! goes through the arena, so a mutation made through one handle is
//! immediately visible through every other handle of the same document.
//!
//! Content reads and writes on a mirror are transparently redirected to
//! the mirrored item, while identity and position (`id`, `parent`,
//! `priority`) stay the mirror's own. Structural mutations (`move_to`,
//! `delete`) target the mirror itself.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use regex::Regex;
use uuid::Uuid;

use crate::export;
use crate::models::{
    create_access_token, shared_url, Item, ItemShareInfo, Operation, PermissionLevel, ROOT_ID,
};
use crate::services::document::{content_id, DocumentState};
use crate::services::error::DocumentError;

/// A node of a WorkFlowy document.
#[derive(Clone)]
pub struct List {
    id: String,
    state: Arc<DocumentState>,
}

impl List {
    pub(crate) fn new(id: String, state: Arc<DocumentState>) -> Self {
        Self { id, state }
    }

    fn with_items<R>(&self, read: impl FnOnce(&HashMap<String, Item>) -> R) -> R {
        let items = self.state.items.read().unwrap();
        read(&items)
    }

    /// Sharing state of the content item, defaulting to "unshared".
    fn share_info(&self) -> ItemShareInfo {
        let target = self.with_items(|items| content_id(items, &self.id));
        let shares = self.state.shares.read().unwrap();
        shares.get(&target).cloned().unwrap_or_default()
    }

    /// Item id of this handle.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// List name. For a mirror, the mirrored item's name.
    pub fn name(&self) -> String {
        self.with_items(|items| {
            items
                .get(&content_id(items, &self.id))
                .map(|item| item.name.clone())
                .unwrap_or_default()
        })
    }

    /// List note, empty if none is set.
    pub fn note(&self) -> String {
        self.with_items(|items| {
            items
                .get(&content_id(items, &self.id))
                .and_then(|item| item.note.clone())
                .unwrap_or_default()
        })
    }

    /// Time of the last modification.
    pub fn last_modified_at(&self) -> DateTime<Utc> {
        let raw = self.with_items(|items| {
            items
                .get(&content_id(items, &self.id))
                .map(|item| item.last_modified)
                .unwrap_or_default()
        });
        self.state.real_timestamp(raw)
    }

    /// Time of completion, or `None` if the list is not completed.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.with_items(|items| {
            items
                .get(&content_id(items, &self.id))
                .and_then(|item| item.completed_at)
        });
        raw.map(|value| self.state.real_timestamp(value))
    }

    /// True if the list is completed.
    pub fn is_completed(&self) -> bool {
        self.with_items(|items| {
            items
                .get(&content_id(items, &self.id))
                .is_some_and(|item| item.completed_at.is_some())
        })
    }

    /// True if the list is a mirror of another list.
    pub fn is_mirror(&self) -> bool {
        self.with_items(|items| {
            items
                .get(&self.id)
                .is_some_and(|item| item.is_mirror_root)
        })
    }

    /// Id of the mirrored list, if this list is a mirror.
    pub fn original_id(&self) -> Option<String> {
        self.with_items(|items| items.get(&self.id).and_then(|item| item.original_id.clone()))
    }

    /// The parent list, or `None` on the root.
    pub fn parent(&self) -> Option<List> {
        if self.id == ROOT_ID {
            return None;
        }
        let parent_id =
            self.with_items(|items| items.get(&self.id).map(|item| item.parent_id.clone()));
        parent_id.map(|id| List::new(id, self.state.clone()))
    }

    /// Position of this list among its siblings.
    pub fn priority(&self) -> usize {
        self.with_items(|items| {
            let Some(source) = items.get(&self.id) else {
                return 0;
            };
            if source.is_root() {
                return 0;
            }
            let holder = content_id(items, &source.parent_id);
            items
                .get(&holder)
                .and_then(|parent| parent.children.iter().position(|child| child == &self.id))
                .unwrap_or(0)
        })
    }

    /// Child lists, in sibling order. For a mirror, the mirrored children.
    pub fn items(&self) -> Vec<List> {
        self.item_ids()
            .into_iter()
            .map(|id| List::new(id, self.state.clone()))
            .collect()
    }

    /// Child item ids, in sibling order.
    pub fn item_ids(&self) -> Vec<String> {
        self.with_items(|items| {
            items
                .get(&content_id(items, &self.id))
                .map(|item| item.children.clone())
                .unwrap_or_default()
        })
    }

    /// True if the list is shared via a secret URL.
    pub fn is_shared_via_url(&self) -> bool {
        self.share_info().is_shared_via_url
    }

    /// True if the list is shared with specific accounts via email.
    pub fn is_shared_via_email(&self) -> bool {
        self.share_info().is_shared_via_email
    }

    /// The shared URL, if the list is shared via URL.
    pub fn shared_url(&self) -> Option<String> {
        let info = self.share_info();
        if !info.is_shared_via_url {
            return None;
        }
        info.url_access_token.map(|token| shared_url(&token))
    }

    /// Permission level granted by the shared URL.
    pub fn shared_url_permission_level(&self) -> PermissionLevel {
        self.share_info()
            .url_permission_level
            .unwrap_or(PermissionLevel::None)
    }

    /// Finds the first direct child whose name matches `name_pattern` and
    /// whose note matches `note_pattern` (any note if omitted). The scan is
    /// not recursive.
    pub fn find_one(&self, name_pattern: &Regex, note_pattern: Option<&Regex>) -> Option<List> {
        self.find_all(name_pattern, note_pattern).into_iter().next()
    }

    /// Finds all direct children matching both patterns, in sibling order.
    pub fn find_all(&self, name_pattern: &Regex, note_pattern: Option<&Regex>) -> Vec<List> {
        self.items()
            .into_iter()
            .filter(|candidate| {
                name_pattern.is_match(&candidate.name())
                    && note_pattern
                        .map(|pattern| pattern.is_match(&candidate.note()))
                        .unwrap_or(true)
            })
            .collect()
    }

    /// Creates a new empty sublist at the given position.
    ///
    /// `priority` is clamped into `[0, sibling count]`; `None` appends.
    /// Records a `create` operation carrying the final clamped position.
    pub fn create_list(&self, priority: Option<usize>) -> Result<List, DocumentError> {
        let new_id = Uuid::new_v4().to_string();

        let (parent_id, clamped, origin) = {
            let mut items = self.state.items.write().unwrap();
            let parent_id = content_id(&items, &self.id);
            let now = self.state.now();

            let parent = items
                .get_mut(&parent_id)
                .ok_or_else(|| DocumentError::item_not_found(&parent_id))?;
            let count = parent.children.len();
            let clamped = priority.unwrap_or(count).min(count);
            parent.children.insert(clamped, new_id.clone());
            let origin = parent.origin.clone();

            items.insert(
                new_id.clone(),
                Item {
                    id: new_id.clone(),
                    name: String::new(),
                    note: None,
                    parent_id: parent_id.clone(),
                    priority: 0,
                    completed_at: None,
                    last_modified: now,
                    is_mirror_root: false,
                    original_id: None,
                    share_id: None,
                    children: Vec::new(),
                    origin: origin.clone(),
                },
            );
            (parent_id, clamped, origin)
        };

        self.state.record(
            origin,
            Operation::create(new_id.clone(), parent_id, clamped as i64),
        );
        Ok(List::new(new_id, self.state.clone()))
    }

    /// Alias for [`List::create_list`], for when it feels odd to call an
    /// item a list.
    pub fn create_item(&self, priority: Option<usize>) -> Result<List, DocumentError> {
        self.create_list(priority)
    }

    /// Sets a new name, recording an `edit` operation against the content
    /// item. Chainable.
    pub fn set_name(&self, name: impl Into<String>) -> Result<&Self, DocumentError> {
        let name = name.into();
        let (target, previous_name, previous_last_modified, origin) = {
            let mut items = self.state.items.write().unwrap();
            let target = content_id(&items, &self.id);
            let item = items
                .get_mut(&target)
                .ok_or_else(|| DocumentError::item_not_found(&target))?;
            let previous_name = std::mem::replace(&mut item.name, name.clone());
            (target, previous_name, item.last_modified, item.origin.clone())
        };

        self.state.record(
            origin,
            Operation::edit_name(target, name, previous_name, previous_last_modified),
        );
        Ok(self)
    }

    /// Sets a new note, recording an `edit` operation against the content
    /// item. Chainable.
    pub fn set_note(&self, note: impl Into<String>) -> Result<&Self, DocumentError> {
        let note = note.into();
        let (target, previous_note, previous_last_modified, origin) = {
            let mut items = self.state.items.write().unwrap();
            let target = content_id(&items, &self.id);
            let item = items
                .get_mut(&target)
                .ok_or_else(|| DocumentError::item_not_found(&target))?;
            let previous_note = std::mem::replace(&mut item.note, Some(note.clone()));
            (target, previous_note, item.last_modified, item.origin.clone())
        };

        self.state.record(
            origin,
            Operation::edit_note(target, note, previous_note, previous_last_modified),
        );
        Ok(self)
    }

    /// Moves this list under a new parent.
    ///
    /// `priority` is clamped into `[0, target sibling count]`; `None`
    /// appends. Implemented as one removal plus one insertion so the item
    /// never sits in two `children` arrays at once.
    pub fn move_to(&self, target: &List, priority: Option<usize>) -> Result<(), DocumentError> {
        if self.id == ROOT_ID {
            return Err(DocumentError::invalid_operation("cannot move the root list"));
        }

        let (origin, operation) = {
            let mut items = self.state.items.write().unwrap();
            let target_id = content_id(&items, &target.id);
            let target_count = items
                .get(&target_id)
                .ok_or_else(|| DocumentError::item_not_found(&target_id))?
                .children
                .len();
            let requested = priority.unwrap_or(target_count).min(target_count);

            let source = items
                .get(&self.id)
                .ok_or_else(|| DocumentError::item_not_found(&self.id))?;
            let previous_parent_id = source.parent_id.clone();
            let origin = source.origin.clone();
            let previous_last_modified = items
                .get(&content_id(&items, &self.id))
                .map(|item| item.last_modified)
                .unwrap_or_default();

            let holder = content_id(&items, &previous_parent_id);
            let previous_priority = items
                .get(&holder)
                .and_then(|parent| parent.children.iter().position(|child| child == &self.id))
                .ok_or_else(|| {
                    DocumentError::invalid_operation("list is not attached to its parent")
                })?;

            if let Some(parent) = items.get_mut(&holder) {
                parent.children.remove(previous_priority);
            }
            if let Some(item) = items.get_mut(&self.id) {
                item.parent_id = target_id.clone();
            }
            if let Some(new_parent) = items.get_mut(&target_id) {
                let index = requested.min(new_parent.children.len());
                new_parent.children.insert(index, self.id.clone());
            }

            let operation = Operation::move_item(
                self.id.clone(),
                target_id,
                requested as i64,
                previous_parent_id,
                previous_priority as i64,
                previous_last_modified,
            );
            (origin, operation)
        };

        self.state.record(origin, operation);
        Ok(())
    }

    /// Deletes this list.
    ///
    /// The item is removed from its parent's children only; the arena
    /// entry stays behind, unreachable from the root, until the document
    /// is discarded.
    pub fn delete(&self) -> Result<(), DocumentError> {
        if self.id == ROOT_ID {
            return Err(DocumentError::invalid_operation(
                "cannot delete the root list",
            ));
        }

        let (origin, operation) = {
            let mut items = self.state.items.write().unwrap();
            let source = items
                .get(&self.id)
                .ok_or_else(|| DocumentError::item_not_found(&self.id))?;
            let previous_parent_id = source.parent_id.clone();
            let origin = source.origin.clone();
            let previous_last_modified = items
                .get(&content_id(&items, &self.id))
                .map(|item| item.last_modified)
                .unwrap_or_default();

            let holder = content_id(&items, &previous_parent_id);
            let previous_priority = items
                .get(&holder)
                .and_then(|parent| parent.children.iter().position(|child| child == &self.id))
                .ok_or_else(|| {
                    DocumentError::invalid_operation("list is not attached to its parent")
                })?;

            if let Some(parent) = items.get_mut(&holder) {
                parent.children.remove(previous_priority);
            }

            let operation = Operation::delete(
                self.id.clone(),
                previous_parent_id,
                previous_priority as i64,
                previous_last_modified,
            );
            (origin, operation)
        };

        self.state.record(origin, operation);
        Ok(())
    }

    /// Enables sharing via URL at the given permission level and returns
    /// the shared URL.
    ///
    /// The level must grant access; [`PermissionLevel::None`] is rejected
    /// before anything is recorded. A repeated call re-records the
    /// `add_shared_url` operation even when nothing changed locally.
    pub fn share_via_url(&self, level: PermissionLevel) -> Result<String, DocumentError> {
        if level == PermissionLevel::None {
            return Err(DocumentError::InvalidPermissionLevel);
        }

        let (target, previous_last_modified, origin) = self.content_snapshot()?;

        let (token, operations) = {
            let mut shares = self.state.shares.write().unwrap();
            let entry = shares.entry(target.clone()).or_default();

            let mut operations = Vec::new();
            // The generic share flag covers both channels; only flip it on
            // when neither is active yet.
            if !entry.is_shared_via_url && !entry.is_shared_via_email {
                operations.push(Operation::share(target.clone(), previous_last_modified));
            }

            entry.is_shared_via_url = true;
            if entry.url_access_token.is_none() {
                entry.url_access_token = Some(create_access_token());
            }
            entry.url_permission_level = Some(level);

            let token = entry.url_access_token.clone().unwrap_or_default();
            operations.push(Operation::add_shared_url(
                target,
                level.to_native(),
                token.clone(),
                previous_last_modified,
            ));
            (token, operations)
        };

        for operation in operations {
            self.state.record(origin.clone(), operation);
        }
        Ok(shared_url(&token))
    }

    /// Disables sharing via URL.
    ///
    /// A no-op when the list is not URL-shared. Otherwise records
    /// `remove_shared_url`, clears the local URL-share state, and — when
    /// the list is not also shared via email — records a closing
    /// `unshare`.
    pub fn unshare_via_url(&self) -> Result<(), DocumentError> {
        let (target, previous_last_modified, origin) = self.content_snapshot()?;

        let operations = {
            let mut shares = self.state.shares.write().unwrap();
            let Some(entry) = shares.get_mut(&target) else {
                return Ok(());
            };
            if !entry.is_shared_via_url {
                return Ok(());
            }

            let level = entry
                .url_permission_level
                .unwrap_or(PermissionLevel::None)
                .to_native();
            let mut operations = vec![Operation::remove_shared_url(
                target.clone(),
                level,
                previous_last_modified,
            )];

            entry.is_shared_via_url = false;
            entry.url_access_token = None;
            entry.url_permission_level = None;

            if !entry.is_shared_via_email {
                operations.push(Operation::unshare(target, previous_last_modified));
            }
            operations
        };

        for operation in operations {
            self.state.record(origin.clone(), operation);
        }
        Ok(())
    }

    /// Content id, last-modified timestamp and origin tree of the item
    /// backing this handle.
    fn content_snapshot(&self) -> Result<(String, i64, Option<String>), DocumentError> {
        let items = self.state.items.read().unwrap();
        let target = content_id(&items, &self.id);
        let item = items
            .get(&target)
            .ok_or_else(|| DocumentError::item_not_found(&target))?;
        Ok((target, item.last_modified, item.origin.clone()))
    }

    /// Renders the list as indented text; `omit_header` skips the list's
    /// own line and renders only its content.
    pub fn to_text(&self, omit_header: bool) -> String {
        export::to_text(self, omit_header)
    }

    /// Renders the list as plain text with tags stripped and entities
    /// decoded.
    pub fn to_plain_text(&self) -> String {
        export::to_plain_text(self)
    }

    /// Renders the list as a JSON tree.
    pub fn to_json(&self) -> serde_json::Value {
        export::to_json(self)
    }

    /// Renders the list as an OPML 2.0 document.
    pub fn to_opml(&self) -> String {
        export::to_opml(self)
    }
}

impl fmt::Display for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text(false))
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List").field("id", &self.id).finish()
    }
}
