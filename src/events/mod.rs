//! Event records and their document-store plumbing.

mod model;
mod repo;
mod store;

pub use model::{partition_upcoming, Event, EventDraft, EventPatch};
pub use repo::EventRepository;
pub use store::{DocumentStore, HttpDocumentStore, MemoryDocumentStore, SortOrder};
