//! Data Models
//!
//! This module contains the core data structures used throughout the client:
//!
//! - [`Item`] - a single entry of the outline tree, as held in the item arena
//! - [`Operation`] - a pending mutation to be pushed to WorkFlowy
//! - Sharing types ([`ItemShareInfo`], [`PermissionLevel`])
//! - Wire payload types mirroring the private API responses

mod item;
mod operation;
mod share;
mod wire;

pub use item::{Item, ROOT_ID, ROOT_NAME};
pub use operation::{Operation, OperationData, OperationType, UndoData};
pub use share::{create_access_token, shared_url, ItemShareInfo, PermissionLevel};
pub use wire::{
    InitializationData, InitializationPayload, ItemMetadata, MirrorMetadata, OperationResult,
    PushEnvelope, PushPollResponse, SharedProjectInfo, TreeData, TreeItemData, UrlSharedInfo,
};
