//! WorkFlowy client library
//!
//! This crate talks to the private WorkFlowy web API: it authenticates,
//! fetches the account's outline (the user's own tree plus every shared
//! tree, stitched into one namespace), exposes an in-memory mutable
//! document over it, and pushes local changes back as batched operations.
//!
//! # Architecture
//!
//! - **Item arena**: one `id -> Item` map per document; [`List`] handles
//!   are lightweight (id + shared state) so aliasing works like the web app
//! - **Mirrors**: content reads/writes redirect to the mirrored item,
//!   identity and position stay the mirror's own
//! - **Deferred operations**: every mutation appends to a per-origin-tree
//!   queue, flushed in one batched request per tree by [`Document::save`]
//!
//! # Modules
//!
//! - [`models`] - data structures (items, operations, wire payloads)
//! - [`services`] - HTTP client, transport seam, document and list API
//! - [`export`] - text, plain text, JSON and OPML exporters
//! - [`utils`] - text helpers shared by the exporters

pub mod export;
pub mod models;
pub mod services;
pub mod utils;

mod workflowy;

// Re-export commonly used types
pub use models::{Operation, OperationType, PermissionLevel, ROOT_ID};
pub use services::{
    Client, ClientConfig, ClientError, Document, DocumentError, List, MockTransport, Transport,
};
pub use workflowy::WorkFlowy;
