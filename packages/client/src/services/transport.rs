//! Remote-session abstraction
//!
//! The document model talks to WorkFlowy through the [`Transport`] trait
//! rather than a concrete HTTP client, so that document construction,
//! shared-tree stitching and flushing can be exercised against canned
//! payloads in tests. [`crate::services::client::Client`] is the real
//! implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::models::{InitializationData, Operation, OperationResult, TreeData};
use crate::services::error::ClientError;

/// A remote WorkFlowy session.
///
/// `share_id` selects the origin tree: `None` is the user's own tree,
/// `Some(id)` a tree shared under that id. Pushes are batched per origin
/// tree and carry that tree's transaction cursor for optimistic
/// concurrency.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches account-level initialization data.
    async fn fetch_initialization_data(&self) -> Result<InitializationData, ClientError>;

    /// Fetches one tree snapshot.
    async fn fetch_tree_data(&self, share_id: Option<&str>) -> Result<TreeData, ClientError>;

    /// Pushes a batch of operations for one origin tree.
    ///
    /// Partial application is never assumed: the outcome either carries a
    /// fresh cursor or reports a remote error for the whole batch.
    async fn push_operations(
        &self,
        cursor: &str,
        share_id: Option<&str>,
        operations: Vec<Operation>,
    ) -> Result<OperationResult, ClientError>;
}

/// A recorded `push_operations` call, for assertions.
#[derive(Debug, Clone)]
pub struct RecordedPush {
    /// Cursor the push was issued with.
    pub cursor: String,
    /// Origin tree of the batch.
    pub share_id: Option<String>,
    /// The flushed operations, timestamps attached.
    pub operations: Vec<Operation>,
}

/// A canned transport for tests and offline experimentation.
///
/// Trees are registered per share id; pushes are recorded and answered
/// with queued results, or with a generic success when none are queued.
#[derive(Default)]
pub struct MockTransport {
    initialization: Mutex<Option<InitializationData>>,
    trees: Mutex<HashMap<Option<String>, TreeData>>,
    push_results: Mutex<Vec<OperationResult>>,
    pushes: Mutex<Vec<RecordedPush>>,
}

impl MockTransport {
    /// Creates an empty mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initialization data served by the mock.
    pub fn set_initialization_data(&self, data: InitializationData) {
        *self.initialization.lock().unwrap() = Some(data);
    }

    /// Registers the tree served for `share_id` (`None` = main tree).
    pub fn set_tree_data(&self, share_id: Option<&str>, tree: TreeData) {
        self.trees
            .lock()
            .unwrap()
            .insert(share_id.map(str::to_string), tree);
    }

    /// Queues a result for the next push; queued results are consumed in
    /// order, after which pushes succeed with a generic cursor.
    pub fn queue_push_result(&self, result: OperationResult) {
        self.push_results.lock().unwrap().push(result);
    }

    /// Returns all pushes recorded so far.
    pub fn pushes(&self) -> Vec<RecordedPush> {
        self.pushes.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch_initialization_data(&self) -> Result<InitializationData, ClientError> {
        self.initialization
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ClientError::request_failed(500, "no initialization data registered"))
    }

    async fn fetch_tree_data(&self, share_id: Option<&str>) -> Result<TreeData, ClientError> {
        self.trees
            .lock()
            .unwrap()
            .get(&share_id.map(str::to_string))
            .cloned()
            .ok_or_else(|| {
                ClientError::request_failed(
                    404,
                    format!("no tree registered for share id {share_id:?}"),
                )
            })
    }

    async fn push_operations(
        &self,
        cursor: &str,
        share_id: Option<&str>,
        operations: Vec<Operation>,
    ) -> Result<OperationResult, ClientError> {
        self.pushes.lock().unwrap().push(RecordedPush {
            cursor: cursor.to_string(),
            share_id: share_id.map(str::to_string),
            operations,
        });

        let mut queued = self.push_results.lock().unwrap();
        if queued.is_empty() {
            Ok(OperationResult {
                error_encountered_in_remote_operations: false,
                new_most_recent_operation_transaction_id: format!("{cursor}-next"),
            })
        } else {
            Ok(queued.remove(0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn initialization() -> InitializationData {
        InitializationData {
            date_joined_timestamp_in_seconds: 1_600_000_000,
            initial_most_recent_operation_transaction_id: "tx-0".to_string(),
            owner_id: 1,
            auxiliary_share_ids: Vec::new(),
        }
    }

    #[test]
    fn test_mock_serves_registered_initialization() {
        let transport = MockTransport::new();
        transport.set_initialization_data(initialization());

        let data = tokio_test::block_on(transport.fetch_initialization_data()).unwrap();
        assert_eq!(data.owner_id, 1);
    }

    #[test]
    fn test_mock_missing_tree_is_an_error() {
        let transport = MockTransport::new();
        let result = tokio_test::block_on(transport.fetch_tree_data(Some("shr-1")));
        assert!(matches!(
            result,
            Err(ClientError::RequestFailed { status: 404, .. })
        ));
    }

    #[test]
    fn test_mock_records_pushes_and_answers_with_fresh_cursor() {
        let transport = MockTransport::new();
        let result =
            tokio_test::block_on(transport.push_operations("tx-0", None, Vec::new())).unwrap();

        assert!(!result.error_encountered_in_remote_operations);
        assert_eq!(result.new_most_recent_operation_transaction_id, "tx-0-next");
        assert_eq!(transport.pushes().len(), 1);
        assert_eq!(transport.pushes()[0].cursor, "tx-0");
    }
}
