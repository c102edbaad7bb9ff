use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

/// Connection settings shared by the backends.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend connection string, e.g. `mongodb://localhost:27017`.
    pub connection_string: String,
    /// Database name.
    pub database: String,
    /// Retry policy for establishing the connection.
    pub retry: RetryPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            connection_string: "mongodb://localhost:27017".to_string(),
            database: "docrest".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}
