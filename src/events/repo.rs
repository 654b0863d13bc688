//! CRUD façade over the document store, scoped to the current session's
//! identity.
//!
//! Ownership stamping (`createdBy`, `createdAt`, `updatedAt`) happens
//! here; remote failures are surfaced verbatim upward. Each remote call is
//! bracketed by the loading signal.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::identity::SessionStore;
use crate::signal::LoadingSignal;

use super::model::{Event, EventDraft, EventPatch};
use super::store::{DocumentStore, SortOrder};

pub struct EventRepository {
    docs: Arc<dyn DocumentStore>,
    sessions: Arc<SessionStore>,
    signal: Arc<LoadingSignal>,
    collection: String,
}

impl EventRepository {
    pub fn new(
        docs: Arc<dyn DocumentStore>,
        sessions: Arc<SessionStore>,
        signal: Arc<LoadingSignal>,
        collection: impl Into<String>,
    ) -> Self {
        Self { docs, sessions, signal, collection: collection.into() }
    }

    /// Owner email of the live session; `Unauthenticated` otherwise. The
    /// check runs before any remote call is issued.
    fn owner_email(&self) -> AppResult<String> {
        self.sessions
            .live()
            .map(|s| s.email)
            .ok_or_else(|| AppError::unauthenticated("You must be logged in."))
    }

    /// Stamp ownership and creation time, submit, return the generated id.
    pub async fn create(&self, draft: EventDraft) -> AppResult<String> {
        let email = self.owner_email()?;
        let event = Event::from_draft(draft, email, Utc::now());
        let _load = self.signal.guard();
        let id = self.docs.insert(&self.collection, event.to_document()).await?;
        info!(target: "events", "created event {id} ({})", event.title);
        Ok(id)
    }

    pub async fn get(&self, id: &str) -> AppResult<Event> {
        let _load = self.signal.guard();
        let doc = self.docs.fetch(&self.collection, id).await?;
        Event::from_document(id.to_string(), &doc)
    }

    /// All events owned by the current session's email, newest first.
    pub async fn list_mine(&self) -> AppResult<Vec<Event>> {
        let email = self.owner_email()?;
        let _load = self.signal.guard();
        let docs = self
            .docs
            .query_eq(&self.collection, "createdBy", json!(email), "createdAt", SortOrder::Descending)
            .await?;
        docs.into_iter()
            .map(|(id, doc)| Event::from_document(id, &doc))
            .collect()
    }

    /// Partial merge; stamps `updatedAt`.
    pub async fn update(&self, id: &str, patch: EventPatch) -> AppResult<()> {
        let fields = patch.into_fields(Utc::now());
        let _load = self.signal.guard();
        self.docs.patch(&self.collection, id, fields).await?;
        info!(target: "events", "updated event {id}");
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let _load = self.signal.guard();
        self.docs.remove(&self.collection, id).await?;
        info!(target: "events", "deleted event {id}");
        Ok(())
    }

    /// Pure predicate: the event's owner email case-sensitively equals the
    /// live session's email. False with no (or an expired) session.
    pub fn can_edit(&self, event: &Event) -> bool {
        self.sessions
            .live()
            .map(|s| s.email == event.created_by)
            .unwrap_or(false)
    }
}
