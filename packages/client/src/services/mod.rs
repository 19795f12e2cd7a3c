//! Business services
//!
//! - [`client`] - HTTP client for the private WorkFlowy API
//! - [`transport`] - remote-session abstraction consumed by the document
//! - [`document`] - in-memory mutable document over fetched tree snapshots
//! - [`list`] - node handle API for navigating and mutating the document

pub mod client;
pub mod document;
pub mod error;
pub mod list;
pub mod transport;

pub use client::{Client, ClientConfig};
pub use document::Document;
pub use error::{ClientError, DocumentError};
pub use list::List;
pub use transport::{MockTransport, RecordedPush, Transport};
