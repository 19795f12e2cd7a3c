//! Sharing metadata and helpers
//!
//! Sharing state is tracked in a side map keyed by item id, separate from
//! the item arena: the server reports it in a different part of the tree
//! payload and most items have none.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Length of generated URL access tokens.
const ACCESS_TOKEN_LENGTH: usize = 16;

/// Permission level attached to a shared URL.
///
/// The numeric values match the native WorkFlowy wire encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionLevel {
    /// Not shared, or unknown level.
    None,
    /// Read-only access.
    View,
    /// Edit and comment access.
    EditAndComment,
    /// Full access, including sharing controls.
    FullAccess,
}

impl PermissionLevel {
    /// Converts from the native numeric encoding. Unknown codes collapse
    /// to [`PermissionLevel::None`].
    pub fn from_native(level: i64) -> Self {
        match level {
            1 => PermissionLevel::View,
            2 => PermissionLevel::EditAndComment,
            3 => PermissionLevel::FullAccess,
            _ => PermissionLevel::None,
        }
    }

    /// Converts to the native numeric encoding.
    pub fn to_native(self) -> i64 {
        match self {
            PermissionLevel::None => 0,
            PermissionLevel::View => 1,
            PermissionLevel::EditAndComment => 2,
            PermissionLevel::FullAccess => 3,
        }
    }
}

/// Per-item sharing state.
///
/// The default value means "not shared at all"; entries are materialized
/// lazily the first time sharing state is read or written for an item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemShareInfo {
    /// True if the item is shared via a secret URL.
    pub is_shared_via_url: bool,
    /// Access token embedded in the shared URL, present iff URL-shared.
    pub url_access_token: Option<String>,
    /// Permission level granted to URL visitors.
    pub url_permission_level: Option<PermissionLevel>,
    /// True if the item is shared with specific accounts via email.
    pub is_shared_via_email: bool,
}

/// Generates a fresh URL access token: a fixed-length random string over
/// the 62-character alphanumeric alphabet.
pub fn create_access_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ACCESS_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Builds the public URL for a share access token.
pub fn shared_url(access_token: &str) -> String {
    format!("https://workflowy.com/s/{access_token}")
}
