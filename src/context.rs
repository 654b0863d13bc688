//! Application context: the process-wide singletons, constructed once at
//! startup and handed to consumers by reference. No ambient globals.

use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::events::{DocumentStore, EventRepository, HttpDocumentStore, MemoryDocumentStore};
use crate::identity::{AuthProvider, HttpAuthProvider, SessionLifecycle, SessionStore};
use crate::notify::Notifier;
use crate::prefs::Prefs;
use crate::signal::LoadingSignal;

pub struct AppContext {
    pub config: Config,
    pub sessions: Arc<SessionStore>,
    pub signal: Arc<LoadingSignal>,
    pub notifier: Arc<Notifier>,
    pub lifecycle: Arc<SessionLifecycle>,
    pub events: Arc<EventRepository>,
}

impl AppContext {
    /// Wire the context over explicit boundary implementations; used by
    /// tests with mock providers and by `from_config` with the HTTP ones.
    pub fn new(
        config: Config,
        provider: Arc<dyn AuthProvider>,
        docs: Arc<dyn DocumentStore>,
    ) -> Result<Self> {
        let prefs = Arc::new(Prefs::open(&config.data_dir)?);
        let sessions = Arc::new(SessionStore::new());
        let signal = Arc::new(LoadingSignal::new());
        let notifier = Arc::new(Notifier::new());
        let lifecycle = Arc::new(SessionLifecycle::new(
            provider,
            Arc::clone(&sessions),
            prefs,
            Arc::clone(&signal),
        ));
        let events = Arc::new(EventRepository::new(
            docs,
            Arc::clone(&sessions),
            Arc::clone(&signal),
            config.events_collection.clone(),
        ));
        Ok(Self { config, sessions, signal, notifier, lifecycle, events })
    }

    /// Production wiring: HTTP identity provider, and the HTTP document
    /// store when a base URL is configured (in-memory store otherwise).
    pub fn from_config(config: Config) -> Result<Self> {
        let provider: Arc<dyn AuthProvider> =
            Arc::new(HttpAuthProvider::new(&config.identity_url, &config.api_key));
        let docs: Arc<dyn DocumentStore> = match config.store_url.as_deref() {
            Some(url) => Arc::new(HttpDocumentStore::new(url)),
            None => Arc::new(MemoryDocumentStore::new()),
        };
        Self::new(config, provider, docs)
    }
}
