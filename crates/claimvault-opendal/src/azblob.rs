//! Azure Blob Storage configuration.

use serde::{Deserialize, Serialize};

/// Azure Blob Storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AzureBlobConfig {
    /// Container name.
    pub container: String,
    /// Storage account name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    /// Storage account key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_key: Option<String>,
}

impl AzureBlobConfig {
    /// Creates a new Azure Blob configuration.
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            account_name: None,
            account_key: None,
        }
    }

    /// Sets the account credentials.
    pub fn with_credentials(
        mut self,
        account_name: impl Into<String>,
        account_key: impl Into<String>,
    ) -> Self {
        self.account_name = Some(account_name.into());
        self.account_key = Some(account_key.into());
        self
    }
}
