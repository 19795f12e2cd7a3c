//! Library entry point
//!
//! # Examples
//!
//! ```no_run
//! use workflowy_client::WorkFlowy;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let workflowy = WorkFlowy::new("username", "password")?;
//! let document = workflowy.get_document().await?;
//!
//! println!("{}", document.root().to_text(true));
//!
//! document.root().create_list(None)?.set_name("New list")?;
//! document.save().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::services::client::{Client, ClientConfig};
use crate::services::document::Document;
use crate::services::error::{ClientError, DocumentError};

/// Handle to a WorkFlowy account.
pub struct WorkFlowy {
    client: Arc<Client>,
}

impl WorkFlowy {
    /// Creates a handle with the default configuration.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client: Arc::new(Client::new(username, password)?),
        })
    }

    /// Creates a handle with an explicit client configuration.
    pub fn with_config(
        username: impl Into<String>,
        password: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client: Arc::new(Client::with_config(username, password, config)?),
        })
    }

    /// The underlying API client.
    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    /// Loads the account's outline, shared trees included, and builds an
    /// interactive document over it.
    pub async fn get_document(&self) -> Result<Document, DocumentError> {
        Document::load(self.client.clone()).await
    }
}
