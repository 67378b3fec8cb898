use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::debug;

use super::{DocumentStore, ReplaceOutcome};
use crate::error::{NormalizerError, Result};
use crate::utils::constants::ID_FIELD;

/// An in-process collection. Backs snapshot mode (a `mongoexport --jsonArray`
/// file) and the test suite.
pub struct MemoryStore {
    documents: Mutex<Vec<Document>>,
    source: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::from_documents(Vec::new())
    }

    /// Documents without an `_id` are given a fresh `ObjectId`.
    pub fn from_documents(documents: Vec<Document>) -> Self {
        let documents = documents.into_iter().map(ensure_identity).collect();
        Self {
            documents: Mutex::new(documents),
            source: None,
        }
    }

    /// Load a JSON array of documents in MongoDB extended JSON.
    pub fn load_json(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let value: serde_json::Value = serde_json::from_reader(reader)?;

        let serde_json::Value::Array(items) = value else {
            return Err(NormalizerError::InvalidSnapshot(format!(
                "{} does not contain a JSON array of documents",
                path.display()
            )));
        };

        let mut documents = Vec::with_capacity(items.len());
        for (position, item) in items.into_iter().enumerate() {
            match Bson::try_from(item)? {
                Bson::Document(document) => documents.push(document),
                other => {
                    return Err(NormalizerError::InvalidSnapshot(format!(
                        "element {} of {} is a {:?}, not a document",
                        position,
                        path.display(),
                        other.element_type()
                    )))
                }
            }
        }

        debug!("Loaded {} documents from {}", documents.len(), path.display());

        let mut store = Self::from_documents(documents);
        store.source = Some(path.to_path_buf());
        Ok(store)
    }

    /// Write all documents as a pretty-printed JSON array in canonical
    /// extended JSON, so NaN survives as `{"$numberDouble": "NaN"}` and
    /// Int32/Int64 keep their width.
    ///
    /// The array goes to a temporary file next to `path` that replaces it
    /// only once fully written; a failed save leaves the old snapshot intact.
    pub async fn save_json(&self, path: &Path) -> Result<()> {
        let documents = self.documents.lock().await;
        let values: Vec<serde_json::Value> = documents
            .iter()
            .map(|document| Bson::Document(document.clone()).into_canonical_extjson())
            .collect();

        write_atomically(path, |writer| {
            serde_json::to_writer_pretty(&mut *writer, &values)?;
            writer.write_all(b"\n")?;
            Ok(())
        })?;

        debug!("Wrote {} documents to {}", values.len(), path.display());
        Ok(())
    }

    pub async fn documents(&self) -> Vec<Document> {
        self.documents.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.documents.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.lock().await.is_empty()
    }

}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&File>) -> Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let temp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        write(&mut writer)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;

    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(temp.path(), metadata.permissions())?;
    }

    temp.persist(path).map_err(|e| NormalizerError::Io(e.error))?;
    Ok(())
}

fn ensure_identity(mut document: Document) -> Document {
    if !document.contains_key(ID_FIELD) {
        document.insert(ID_FIELD, ObjectId::new());
    }
    document
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn describe(&self) -> String {
        match self.source {
            Some(ref path) => format!("snapshot:{}", path.display()),
            None => "memory".to_string(),
        }
    }

    /// Field names are matched as top-level keys. Configuration rejects
    /// dotted names, so this agrees with the server's `$exists` filter.
    async fn backfill_missing(&self, field: &str, placeholder: &Bson) -> Result<u64> {
        let mut documents = self.documents.lock().await;
        let mut modified = 0;

        for document in documents.iter_mut() {
            if !document.contains_key(field) {
                document.insert(field, placeholder.clone());
                modified += 1;
            }
        }

        Ok(modified)
    }

    async fn fetch_all(&self) -> Result<Vec<Document>> {
        Ok(self.documents.lock().await.clone())
    }

    async fn replace_by_id(&self, id: &Bson, mut document: Document) -> Result<ReplaceOutcome> {
        document.insert(ID_FIELD, id.clone());

        let mut documents = self.documents.lock().await;
        match documents
            .iter_mut()
            .find(|existing| existing.get(ID_FIELD) == Some(id))
        {
            Some(existing) => {
                *existing = document;
                Ok(ReplaceOutcome::Replaced)
            }
            None => {
                documents.push(document);
                Ok(ReplaceOutcome::Reinserted)
            }
        }
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Remove the document with the given `_id`, returning whether it existed.
    async fn remove(&self, id: &Bson) -> bool {
        let mut documents = self.documents.lock().await;
        let before = documents.len();
        documents.retain(|document| document.get(ID_FIELD) != Some(id));
        documents.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use std::io::Write as _;

    #[tokio::test]
    async fn test_backfill_only_touches_absent_fields() {
        let store = MemoryStore::from_documents(vec![
            doc! { "_id": 1, "tmin": "5,2" },
            doc! { "_id": 2 },
            doc! { "_id": 3, "tmin": Bson::Null },
        ]);

        let modified = store
            .backfill_missing("tmin", &Bson::String("N/A".to_string()))
            .await
            .unwrap();
        assert_eq!(modified, 1);

        let documents = store.documents().await;
        assert_eq!(documents[0].get_str("tmin").unwrap(), "5,2");
        assert_eq!(documents[1].get_str("tmin").unwrap(), "N/A");
        assert_eq!(documents[2].get("tmin"), Some(&Bson::Null));
    }

    #[tokio::test]
    async fn test_replace_and_reinsert() {
        let store = MemoryStore::from_documents(vec![doc! { "_id": 1, "tmax": "10" }]);

        let outcome = store
            .replace_by_id(&Bson::Int32(1), doc! { "_id": 1, "tmax": 10.0 })
            .await
            .unwrap();
        assert_eq!(outcome, ReplaceOutcome::Replaced);
        assert_eq!(store.len().await, 1);

        assert!(store.remove(&Bson::Int32(1)).await);
        let outcome = store
            .replace_by_id(&Bson::Int32(1), doc! { "_id": 1, "tmax": 10.0 })
            .await
            .unwrap();
        assert_eq!(outcome, ReplaceOutcome::Reinserted);
        assert_eq!(store.documents().await, vec![doc! { "_id": 1, "tmax": 10.0 }]);
    }

    #[tokio::test]
    async fn test_documents_without_id_get_one() {
        let store = MemoryStore::from_documents(vec![doc! { "tmin": "1,0" }]);
        let documents = store.fetch_all().await.unwrap();
        assert!(documents[0].get_object_id(ID_FIELD).is_ok());
    }

    #[tokio::test]
    async fn test_load_rejects_non_array() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{\"_id\": 1}}").unwrap();

        let result = MemoryStore::load_json(file.path());
        assert!(matches!(result, Err(NormalizerError::InvalidSnapshot(_))));
    }

    #[tokio::test]
    async fn test_json_round_trip_keeps_nan() {
        let store = MemoryStore::from_documents(vec![doc! {
            "_id": 7,
            "fecha": "2019-01-01",
            "tmed": f64::NAN,
            "prec": 0.4,
        }]);

        let file = NamedTempFile::new().unwrap();
        store.save_json(file.path()).await.unwrap();

        let reloaded = MemoryStore::load_json(file.path()).unwrap();
        let documents = reloaded.documents().await;
        assert_eq!(documents.len(), 1);
        assert!(documents[0].get_f64("tmed").unwrap().is_nan());
        assert_eq!(documents[0].get_f64("prec").unwrap(), 0.4);
        assert_eq!(documents[0].get_str("fecha").unwrap(), "2019-01-01");
        assert_eq!(reloaded.describe(), format!("snapshot:{}", file.path().display()));
    }

    #[tokio::test]
    async fn test_save_keeps_integer_widths() {
        let store = MemoryStore::from_documents(vec![doc! {
            "_id": 1_i64,
            "tmax": 10_i64,
            "indicativo": 3195_i32,
            "tmin": 5.0,
        }]);

        let file = NamedTempFile::new().unwrap();
        store.save_json(file.path()).await.unwrap();

        let reloaded = MemoryStore::load_json(file.path()).unwrap();
        let document = &reloaded.documents().await[0];
        assert_eq!(document.get("_id"), Some(&Bson::Int64(1)));
        assert_eq!(document.get("tmax"), Some(&Bson::Int64(10)));
        assert_eq!(document.get("indicativo"), Some(&Bson::Int32(3195)));
        assert_eq!(document.get("tmin"), Some(&Bson::Double(5.0)));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_snapshot_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let original = "[{\"_id\": 1, \"tmin\": \"5,2\"}]\n";
        fs::write(&path, original).unwrap();

        let result = write_atomically(&path, |writer| {
            writer.write_all(b"[{\"_id\": 1, \"tmin\"")?;
            writer.flush()?;
            Err(NormalizerError::Io(std::io::Error::other("disk full")))
        });

        assert!(matches!(result, Err(NormalizerError::Io(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);

        let store = MemoryStore::load_json(&path).unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_save_replaces_existing_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        fs::write(&path, "[{\"_id\": 1, \"tmin\": \"5,2\"}]").unwrap();

        let store = MemoryStore::load_json(&path).unwrap();
        store
            .replace_by_id(&Bson::Int32(1), doc! { "_id": 1, "tmin": 5.2 })
            .await
            .unwrap();
        store.save_json(&path).await.unwrap();

        let reloaded = MemoryStore::load_json(&path).unwrap();
        assert_eq!(reloaded.documents().await, vec![doc! { "_id": 1, "tmin": 5.2 }]);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
