use async_trait::async_trait;
use bson::{doc, Bson, Document};
use futures::TryStreamExt;
use mongodb::options::ReplaceOptions;
use mongodb::{Client, Collection};
use tracing::{debug, info};

use super::{DocumentStore, ReplaceOutcome};
use crate::error::Result;
use crate::settings::NormalizerConfig;

/// A collection on a MongoDB server.
pub struct MongoStore {
    collection: Collection<Document>,
    target: String,
}

impl MongoStore {
    /// Connect, select the configured database and collection, and ping the
    /// server so connectivity problems surface before any phase starts.
    pub async fn connect(config: &NormalizerConfig) -> Result<Self> {
        info!("Connecting to {}", config.redacted_uri());
        let client = Client::with_uri_str(&config.uri).await?;

        let database = client.database(&config.database);
        database.run_command(doc! { "ping": 1 }).await?;
        debug!("Ping to database '{}' succeeded", config.database);

        Ok(Self::from_collection(
            database.collection::<Document>(&config.collection),
        ))
    }

    pub fn from_collection(collection: Collection<Document>) -> Self {
        let target = collection.namespace().to_string();
        Self { collection, target }
    }
}

/// `{field: {$exists: false}}`: documents that lack the field entirely.
pub fn missing_field_filter(field: &str) -> Document {
    let mut filter = Document::new();
    filter.insert(field, doc! { "$exists": false });
    filter
}

/// `{$set: {field: placeholder}}`
pub fn placeholder_update(field: &str, placeholder: &Bson) -> Document {
    let mut assignment = Document::new();
    assignment.insert(field, placeholder.clone());
    doc! { "$set": assignment }
}

pub fn id_filter(id: &Bson) -> Document {
    doc! { "_id": id.clone() }
}

/// Write-back inserts the document again when it vanished since the read.
pub fn upsert_options() -> ReplaceOptions {
    ReplaceOptions::builder().upsert(true).build()
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn describe(&self) -> String {
        format!("mongodb:{}", self.target)
    }

    async fn backfill_missing(&self, field: &str, placeholder: &Bson) -> Result<u64> {
        let result = self
            .collection
            .update_many(missing_field_filter(field), placeholder_update(field, placeholder))
            .await?;

        Ok(result.modified_count)
    }

    async fn fetch_all(&self) -> Result<Vec<Document>> {
        let cursor = self.collection.find(doc! {}).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        Ok(documents)
    }

    async fn replace_by_id(&self, id: &Bson, document: Document) -> Result<ReplaceOutcome> {
        let result = self
            .collection
            .replace_one(id_filter(id), document)
            .with_options(upsert_options())
            .await?;

        if result.upserted_id.is_some() {
            Ok(ReplaceOutcome::Reinserted)
        } else {
            Ok(ReplaceOutcome::Replaced)
        }
    }
}
