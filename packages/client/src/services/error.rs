//! Service Layer Error Types
//!
//! Two error layers match the two halves of the crate: [`ClientError`] for
//! the remote boundary (authentication, requests, payload validation) and
//! [`DocumentError`] for the in-memory document model. All failures bubble
//! to the caller; nothing is logged-and-swallowed.

use thiserror::Error;

/// Remote boundary errors.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Login was rejected with the server-reported reasons. Not retried.
    #[error("WorkFlowy login failed: {reasons:?}")]
    LoginFailed { reasons: Vec<String> },

    /// An authenticated request failed even after one re-login retry.
    #[error("WorkFlowy request failed: {status} {detail}")]
    RequestFailed { status: u16, detail: String },

    /// The HTTP layer failed (connection, timeout, protocol).
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server payload did not match the expected shape. The snapshot
    /// is rejected as a whole; no partial data is accepted.
    #[error("unexpected WorkFlowy payload: {0}")]
    Schema(#[from] serde_json::Error),
}

impl ClientError {
    /// Create a login failure from the server-reported reasons.
    pub fn login_failed(reasons: Vec<String>) -> Self {
        Self::LoginFailed { reasons }
    }

    /// Create a request failure with status detail.
    pub fn request_failed(status: u16, detail: impl Into<String>) -> Self {
        Self::RequestFailed {
            status,
            detail: detail.into(),
        }
    }
}

/// Document model errors.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// A handle referenced an id that is not present in the item arena.
    #[error("unknown list: {id}")]
    ItemNotFound { id: String },

    /// A structural operation targeted the synthetic root.
    #[error("invalid operation: {reason}")]
    InvalidOperation { reason: String },

    /// `share_via_url` was called with a level that does not grant access.
    #[error("invalid permission level for URL sharing; use View, EditAndComment or FullAccess")]
    InvalidPermissionLevel,

    /// The server reported an error while applying a flushed batch. The
    /// batch is dropped, leaving the local model ahead of the server.
    #[error("error encountered in remote WorkFlowy operations")]
    RemoteOperationFailed,

    /// A remote call failed while loading or saving the document.
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl DocumentError {
    /// Create an unknown-item error.
    pub fn item_not_found(id: impl Into<String>) -> Self {
        Self::ItemNotFound { id: id.into() }
    }

    /// Create an invalid-operation error.
    pub fn invalid_operation(reason: impl Into<String>) -> Self {
        Self::InvalidOperation {
            reason: reason.into(),
        }
    }
}
