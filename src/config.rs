//! Environment-driven configuration.
//!
//! All knobs come from `CONVOKE_*` environment variables with sensible
//! defaults; there is no config-file layer. `CONVOKE_STORE_URL` is
//! optional — without it the context falls back to the in-memory document
//! store, which is useful for demos and tests.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Identity-provider base, e.g. `https://identitytoolkit.googleapis.com/v1`.
    pub identity_url: String,
    /// Provider api key, appended as a `key` query parameter.
    pub api_key: String,
    /// Document-store base URL; `None` selects the in-memory store.
    pub store_url: Option<String>,
    pub events_collection: String,
    /// Directory for persisted local state (session snapshot, display name).
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            identity_url: std::env::var("CONVOKE_IDENTITY_URL")
                .unwrap_or_else(|_| "https://identitytoolkit.googleapis.com/v1".to_string()),
            api_key: std::env::var("CONVOKE_API_KEY").unwrap_or_default(),
            store_url: std::env::var("CONVOKE_STORE_URL").ok(),
            events_collection: std::env::var("CONVOKE_EVENTS_COLLECTION")
                .unwrap_or_else(|_| "events".to_string()),
            data_dir: std::env::var("CONVOKE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".convoke")),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
