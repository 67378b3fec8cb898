//! Document storage backends.
//!
//! The normalizer only needs four operations from a store, so both the
//! MongoDB driver and the in-memory snapshot store sit behind
//! [`DocumentStore`].

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use async_trait::async_trait;
use bson::{Bson, Document};

use crate::error::Result;

/// What a keyed replace did to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// An existing document with the same `_id` was overwritten.
    Replaced,
    /// No document had that `_id`; it was inserted.
    Reinserted,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Human-readable target, used in logs.
    fn describe(&self) -> String;

    /// Set `field` to `placeholder` on every document where it is absent.
    /// Returns the number of documents modified.
    async fn backfill_missing(&self, field: &str, placeholder: &Bson) -> Result<u64>;

    /// Every document in the collection, materialized at once.
    async fn fetch_all(&self) -> Result<Vec<Document>>;

    /// Overwrite the document whose `_id` equals `id`, inserting `document`
    /// when no such document exists.
    async fn replace_by_id(&self, id: &Bson, document: Document) -> Result<ReplaceOutcome>;
}
