//! In-memory WorkFlowy document
//!
//! A [`Document`] is built once per load from one or more flat tree
//! snapshots: the user's own tree plus every transitively referenced
//! shared tree, merged into a single id-to-item arena so shared subtrees
//! read like ordinary children. Mutations happen only in memory and are
//! recorded as pending operations, batched per origin tree; [`Document::save`]
//! flushes each tree's batch with that tree's transaction cursor.
//!
//! Nothing is persisted locally; the whole model is discarded with the
//! process.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::models::{
    InitializationData, Item, ItemShareInfo, Operation, TreeData, ROOT_ID, ROOT_NAME,
};
use crate::services::error::DocumentError;
use crate::services::list::List;
use crate::services::transport::Transport;

/// Pending mutations and sync cursor of one origin tree.
#[derive(Debug)]
struct TreeQueue {
    cursor: String,
    pending: Vec<Operation>,
}

/// Shared state behind every [`List`] handle of one document.
///
/// Handles are lightweight (item id plus an `Arc` of this state), so a
/// mutation through any handle is visible through all others.
pub(crate) struct DocumentState {
    pub(crate) items: RwLock<HashMap<String, Item>>,
    pub(crate) shares: RwLock<HashMap<String, ItemShareInfo>>,
    /// Per-origin-tree queues, keyed by share id (`None` = main tree).
    /// A `BTreeMap` keeps flush and inspection order deterministic, main
    /// tree first.
    queues: RwLock<BTreeMap<Option<String>, TreeQueue>>,
    initialization: InitializationData,
    transport: Arc<dyn Transport>,
}

impl DocumentState {
    /// Current time in seconds since the account join time.
    pub(crate) fn now(&self) -> i64 {
        Utc::now().timestamp() - self.initialization.date_joined_timestamp_in_seconds
    }

    /// Converts a raw account-relative timestamp to wall-clock time.
    pub(crate) fn real_timestamp(&self, raw: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(raw + self.initialization.date_joined_timestamp_in_seconds, 0)
            .unwrap_or_default()
    }

    /// Appends an operation to the queue of the given origin tree.
    pub(crate) fn record(&self, origin: Option<String>, operation: Operation) {
        let mut queues = self.queues.write().unwrap();
        queues
            .entry(origin)
            .or_insert_with(|| TreeQueue {
                cursor: String::new(),
                pending: Vec::new(),
            })
            .pending
            .push(operation);
    }
}

/// Redirects a mirror-root id to the id of the item whose content it
/// displays. Non-mirrors, the root, and mirrors with a dangling original
/// resolve to themselves.
pub(crate) fn content_id(items: &HashMap<String, Item>, id: &str) -> String {
    match items.get(id) {
        Some(item) if item.is_mirror_root => match item.original_id.as_deref() {
            Some(original) if items.contains_key(original) => original.to_string(),
            _ => id.to_string(),
        },
        _ => id.to_string(),
    }
}

/// Merges one flat snapshot into the arena.
///
/// Records are walked in ascending-priority order (stable, so ties keep
/// their input order) and parents are materialized lazily as placeholders,
/// which supports forward references. An item whose declared parent is
/// absent from every snapshot ends up under an empty placeholder that
/// stays unreachable from the root.
///
/// For a shared tree, `anchor` aliases the snapshot's top level onto the
/// item that carries the share, instead of creating a second root.
fn merge_tree(
    items: &mut HashMap<String, Item>,
    shares: &mut HashMap<String, ItemShareInfo>,
    tree: &TreeData,
    origin: Option<&str>,
    anchor: Option<&str>,
) {
    let mut records: Vec<_> = tree.items.iter().collect();
    records.sort_by_key(|record| record.priority);

    for record in records {
        let parent_id = match record.parent_id.as_deref() {
            None | Some(ROOT_ID) => anchor.unwrap_or(ROOT_ID).to_string(),
            Some(parent) => parent.to_string(),
        };

        items
            .entry(parent_id.clone())
            .or_insert_with(|| Item::placeholder(&parent_id))
            .children
            .push(record.id.clone());

        let entry = items
            .entry(record.id.clone())
            .or_insert_with(|| Item::placeholder(&record.id));
        entry.name = record.name.clone();
        entry.note = record.note.clone();
        entry.parent_id = parent_id;
        entry.priority = record.priority;
        entry.completed_at = record.completed_at;
        entry.last_modified = record.last_modified;
        let mirror = record.metadata.mirror.as_ref();
        entry.is_mirror_root = mirror.and_then(|data| data.is_mirror_root).unwrap_or(false);
        entry.original_id = mirror.and_then(|data| data.original_id.clone());
        entry.origin = origin.map(str::to_string);
    }

    for (item_id, info) in &tree.shared_projects {
        shares.insert(item_id.clone(), info.to_share_info());
        items
            .entry(item_id.clone())
            .or_insert_with(|| Item::placeholder(item_id))
            .share_id = info.share_id.clone();
    }
}

/// Share ids referenced by a snapshot's sharing blocks.
fn referenced_share_ids(tree: &TreeData) -> Vec<String> {
    tree.shared_projects
        .values()
        .filter_map(|info| info.share_id.clone())
        .collect()
}

/// An interactive WorkFlowy outline.
#[derive(Clone)]
pub struct Document {
    state: Arc<DocumentState>,
}

impl Document {
    /// Loads a full document: initialization data, the main tree, and every
    /// transitively referenced shared tree, each fetched exactly once.
    ///
    /// A failed shared-tree fetch fails the whole load; no partial document
    /// is ever returned.
    pub async fn load(transport: Arc<dyn Transport>) -> Result<Self, DocumentError> {
        let initialization = transport.fetch_initialization_data().await?;
        let main_tree = transport.fetch_tree_data(None).await?;

        let mut pending: VecDeque<String> = initialization
            .auxiliary_share_ids
            .iter()
            .cloned()
            .collect();
        pending.extend(referenced_share_ids(&main_tree));

        let mut visited: HashSet<String> = HashSet::new();
        let mut shared_trees = Vec::new();
        while let Some(share_id) = pending.pop_front() {
            if !visited.insert(share_id.clone()) {
                continue;
            }
            let tree = transport.fetch_tree_data(Some(&share_id)).await?;
            pending.extend(referenced_share_ids(&tree));
            shared_trees.push((share_id, tree));
        }

        info!(
            shared_trees = shared_trees.len(),
            "assembling WorkFlowy document"
        );
        Ok(Self::from_snapshots(
            transport,
            initialization,
            main_tree,
            shared_trees,
        ))
    }

    /// Assembles a document from already-fetched snapshots.
    ///
    /// Each shared tree is stitched under the item carrying its share id;
    /// a shared tree with no anchor item falls back to the root. Every
    /// tree keeps its own operation queue and transaction cursor.
    pub fn from_snapshots(
        transport: Arc<dyn Transport>,
        initialization: InitializationData,
        main_tree: TreeData,
        shared_trees: Vec<(String, TreeData)>,
    ) -> Self {
        // Anchor items first, across all snapshots, so shares nested inside
        // shares resolve no matter the fetch order.
        let mut anchors: HashMap<String, String> = HashMap::new();
        for tree in std::iter::once(&main_tree).chain(shared_trees.iter().map(|(_, tree)| tree)) {
            for (item_id, info) in &tree.shared_projects {
                if let Some(share_id) = &info.share_id {
                    anchors.insert(share_id.clone(), item_id.clone());
                }
            }
        }

        let mut items = HashMap::new();
        let mut shares = HashMap::new();
        items.insert(ROOT_ID.to_string(), Item::placeholder(ROOT_ID));

        merge_tree(&mut items, &mut shares, &main_tree, None, None);
        for (share_id, tree) in &shared_trees {
            let anchor = anchors.get(share_id).map(String::as_str);
            merge_tree(&mut items, &mut shares, tree, Some(share_id), anchor);
        }

        if let Some(root) = items.get_mut(ROOT_ID) {
            root.name = ROOT_NAME.to_string();
        }

        let mut queues = BTreeMap::new();
        queues.insert(
            None,
            TreeQueue {
                cursor: main_tree.most_recent_operation_transaction_id.clone(),
                pending: Vec::new(),
            },
        );
        for (share_id, tree) in &shared_trees {
            queues.insert(
                Some(share_id.clone()),
                TreeQueue {
                    cursor: tree.most_recent_operation_transaction_id.clone(),
                    pending: Vec::new(),
                },
            );
        }

        Self {
            state: Arc::new(DocumentState {
                items: RwLock::new(items),
                shares: RwLock::new(shares),
                queues: RwLock::new(queues),
                initialization,
                transport,
            }),
        }
    }

    /// The synthetic root of the outline.
    pub fn root(&self) -> List {
        List::new(ROOT_ID.to_string(), self.state.clone())
    }

    /// Top-level lists of the outline.
    pub fn items(&self) -> Vec<List> {
        self.root().items()
    }

    /// Returns a handle for an item id.
    pub fn get_list(&self, id: &str) -> Result<List, DocumentError> {
        let items = self.state.items.read().unwrap();
        if items.contains_key(id) {
            Ok(List::new(id.to_string(), self.state.clone()))
        } else {
            Err(DocumentError::item_not_found(id))
        }
    }

    /// True if any origin tree has unsaved changes.
    pub fn is_dirty(&self) -> bool {
        let queues = self.state.queues.read().unwrap();
        queues.values().any(|queue| !queue.pending.is_empty())
    }

    /// All pending operations across origin trees, main tree first, in
    /// recording order within each tree.
    pub fn pending_operations(&self) -> Vec<Operation> {
        let queues = self.state.queues.read().unwrap();
        queues
            .values()
            .flat_map(|queue| queue.pending.iter().cloned())
            .collect()
    }

    /// Flushes every non-empty queue, one batched request per origin tree.
    ///
    /// Each batch is swapped out before submission and is not restored on
    /// failure; a rejected flush leaves the local model ahead of the server
    /// and retry policy with the caller. On success the tree's transaction
    /// cursor advances to the one the server returned.
    pub async fn save(&self) -> Result<(), DocumentError> {
        let timestamp = self.state.now();

        let tree_keys: Vec<Option<String>> = {
            let queues = self.state.queues.read().unwrap();
            queues
                .iter()
                .filter(|(_, queue)| !queue.pending.is_empty())
                .map(|(share_id, _)| share_id.clone())
                .collect()
        };

        for share_id in tree_keys {
            // Swap this tree's batch out right before its submission, so a
            // failed flush of one tree leaves the other trees' queues intact.
            let Some((cursor, operations)) = ({
                let mut queues = self.state.queues.write().unwrap();
                queues.get_mut(&share_id).and_then(|queue| {
                    if queue.pending.is_empty() {
                        None
                    } else {
                        Some((queue.cursor.clone(), std::mem::take(&mut queue.pending)))
                    }
                })
            }) else {
                continue;
            };

            let operations: Vec<Operation> = operations
                .into_iter()
                .map(|operation| operation.with_client_timestamp(timestamp))
                .collect();

            info!(
                share_id = share_id.as_deref(),
                operations = operations.len(),
                "saving WorkFlowy document"
            );
            let result = self
                .state
                .transport
                .push_operations(&cursor, share_id.as_deref(), operations)
                .await?;

            if result.error_encountered_in_remote_operations {
                return Err(DocumentError::RemoteOperationFailed);
            }

            let mut queues = self.state.queues.write().unwrap();
            if let Some(queue) = queues.get_mut(&share_id) {
                queue.cursor = result.new_most_recent_operation_transaction_id;
            }
        }

        Ok(())
    }
}
