//! Application Configuration
//!
//! Configuration for the account dispatcher.

use std::env;

/// Account application configuration
#[derive(Debug, Clone)]
pub struct AccountConfig {
    /// Exchange name, used in export file names
    pub exchange_name: String,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            exchange_name: "exchange".to_string(),
        }
    }
}

impl AccountConfig {
    /// Create config for development
    pub fn development() -> Self {
        Self {
            exchange_name: "devexchange".to_string(),
        }
    }

    /// Read `EXCHANGE_NAME`, falling back to the default
    pub fn from_env() -> Self {
        let exchange_name = env::var("EXCHANGE_NAME")
            .ok()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| Self::default().exchange_name);

        Self { exchange_name }
    }

    /// File name of the login-history CSV export
    pub fn logins_filename(&self) -> String {
        format!("{}-logins.csv", self.exchange_name)
    }
}
