use aemet_normalizer::cli::{execute, Commands};
use aemet_normalizer::error::{NormalizerError, Result};
use aemet_normalizer::processors::FieldNormalizer;
use aemet_normalizer::settings::NormalizerConfig;
use aemet_normalizer::store::{DocumentStore, MemoryStore, ReplaceOutcome};
use async_trait::async_trait;
use bson::{doc, Bson, Document};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::NamedTempFile;

const BACKFILLED: [&str; 7] = ["tmed", "prec", "velmedia", "racha", "sol", "presMax", "presMin"];

#[tokio::test]
async fn test_end_to_end_scenario() {
    let store = MemoryStore::from_documents(vec![doc! { "_id": 1, "tmin": "5,2", "tmax": 10 }]);
    let normalizer = FieldNormalizer::new(&store);

    normalizer.backfill(None).await.unwrap();
    let after_backfill = store.documents().await;
    assert_eq!(
        after_backfill[0],
        doc! {
            "_id": 1,
            "tmin": "5,2",
            "tmax": 10,
            "tmed": "N/A",
            "prec": "N/A",
            "velmedia": "N/A",
            "racha": "N/A",
            "sol": "N/A",
            "presMax": "N/A",
            "presMin": "N/A",
        }
    );

    let conversion = normalizer.convert(None).await.unwrap();
    let document = &store.documents().await[0];

    assert_eq!(document.get_i32("_id").unwrap(), 1);
    assert_eq!(document.get_f64("tmin").unwrap(), 5.2);
    assert_eq!(document.get("tmax"), Some(&Bson::Int32(10)));
    for field in BACKFILLED {
        assert!(document.get_f64(field).unwrap().is_nan(), "{} should be NaN", field);
    }

    assert_eq!(conversion.total_converted(), 1);
    assert_eq!(conversion.total_unparseable(), 7);
    assert_eq!(conversion.tally("tmax").unwrap().untouched, 1);
}

#[tokio::test]
async fn test_second_run_changes_nothing() {
    let store = MemoryStore::from_documents(vec![
        doc! { "_id": 1, "tmin": "5,2", "tmax": 10 },
        doc! { "_id": 2, "tmin": "-1,4", "prec": "Ip", "sol": "8,9" },
        doc! { "_id": 3 },
    ]);
    let normalizer = FieldNormalizer::new(&store);

    normalizer.run(None).await.unwrap();
    let first = store.documents().await;

    let report = normalizer.run(None).await.unwrap();
    let second = store.documents().await;

    assert_eq!(report.backfill.unwrap().total_backfilled(), 0);
    let conversion = report.conversion.unwrap();
    assert_eq!(conversion.total_converted(), 0);
    assert_eq!(conversion.total_unparseable(), 0);
    assert_eq!(conversion.documents_replaced, 3);
    assert_eq!(conversion.documents_unchanged, 3);

    assert_eq!(first.len(), second.len());
    for (before, after) in first.iter().zip(&second) {
        assert_eq!(before.keys().collect::<Vec<_>>(), after.keys().collect::<Vec<_>>());
        for (key, value) in before {
            match (value, after.get(key)) {
                (Bson::Double(a), Some(Bson::Double(b))) if a.is_nan() => {
                    assert!(b.is_nan(), "{} lost its NaN marker", key)
                }
                (value, other) => assert_eq!(Some(value), other),
            }
        }
    }
}

#[tokio::test]
async fn test_snapshot_round_trip_through_execute() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(
        file.path(),
        r#"[
  {"_id": {"$oid": "5c7e6f3a2b1d4e0012345678"}, "fecha": "2019-01-01", "indicativo": "3195",
   "tmin": "1,8", "tmax": "11,3", "prec": "Ip", "racha": "Varias"},
  {"_id": {"$oid": "5c7e6f3a2b1d4e0012345679"}, "fecha": "2019-01-02", "indicativo": "3195",
   "tmin": 2.0, "tmax": "12,0"}
]"#,
    )
    .unwrap();

    let config = NormalizerConfig::default();
    let store = MemoryStore::load_json(file.path()).unwrap();
    execute(&Commands::Run, &store, &config, true).await.unwrap();
    store.save_json(file.path()).await.unwrap();

    let reloaded = MemoryStore::load_json(file.path()).unwrap();
    let documents = reloaded.documents().await;
    assert_eq!(documents.len(), 2);

    let first = &documents[0];
    assert_eq!(first.get_f64("tmin").unwrap(), 1.8);
    assert_eq!(first.get_f64("tmax").unwrap(), 11.3);
    assert!(first.get_f64("prec").unwrap().is_nan());
    assert!(first.get_f64("racha").unwrap().is_nan());
    assert!(first.get_f64("presMin").unwrap().is_nan());
    assert_eq!(first.get_str("indicativo").unwrap(), "3195");
    assert!(first.get_object_id("_id").is_ok());

    let second = &documents[1];
    assert_eq!(second.get_f64("tmin").unwrap(), 2.0);
    assert_eq!(second.get_f64("tmax").unwrap(), 12.0);
    assert_eq!(second.get_str("fecha").unwrap(), "2019-01-02");
}

#[tokio::test]
async fn test_inspect_does_not_write() {
    let original = vec![doc! { "_id": 1, "tmin": "5,2" }];
    let store = MemoryStore::from_documents(original.clone());

    execute(&Commands::Inspect { samples: 3 }, &store, &NormalizerConfig::default(), true)
        .await
        .unwrap();

    assert_eq!(store.documents().await, original);
}

/// Returns documents from `fetch_all` that are no longer in the collection,
/// as if they were deleted between the read and the write-back.
struct StaleStore {
    inner: MemoryStore,
    stale: Vec<Document>,
}

#[async_trait]
impl DocumentStore for StaleStore {
    fn describe(&self) -> String {
        "stale".to_string()
    }

    async fn backfill_missing(&self, field: &str, placeholder: &Bson) -> Result<u64> {
        self.inner.backfill_missing(field, placeholder).await
    }

    async fn fetch_all(&self) -> Result<Vec<Document>> {
        let mut documents = self.inner.fetch_all().await?;
        documents.extend(self.stale.iter().cloned());
        Ok(documents)
    }

    async fn replace_by_id(&self, id: &Bson, document: Document) -> Result<ReplaceOutcome> {
        self.inner.replace_by_id(id, document).await
    }
}

#[tokio::test]
async fn test_vanished_documents_are_reinserted_with_same_id() {
    let store = StaleStore {
        inner: MemoryStore::from_documents(vec![doc! { "_id": 1, "tmin": "3,0" }]),
        stale: vec![doc! { "_id": 2, "tmin": "4,5" }],
    };
    let normalizer = FieldNormalizer::new(&store).with_fields(vec!["tmin".to_string()]);

    let summary = normalizer.convert(None).await.unwrap();
    assert_eq!(summary.documents_replaced, 1);
    assert_eq!(summary.documents_reinserted, 1);
    assert_eq!(summary.documents_written(), 2);

    assert_eq!(
        store.inner.documents().await,
        vec![doc! { "_id": 1, "tmin": 3.0 }, doc! { "_id": 2, "tmin": 4.5 }]
    );
}

/// Fails every write after the first `allowed` replaces.
struct FailingStore {
    inner: MemoryStore,
    allowed: usize,
    writes: AtomicUsize,
}

#[async_trait]
impl DocumentStore for FailingStore {
    fn describe(&self) -> String {
        "failing".to_string()
    }

    async fn backfill_missing(&self, field: &str, placeholder: &Bson) -> Result<u64> {
        self.inner.backfill_missing(field, placeholder).await
    }

    async fn fetch_all(&self) -> Result<Vec<Document>> {
        self.inner.fetch_all().await
    }

    async fn replace_by_id(&self, id: &Bson, document: Document) -> Result<ReplaceOutcome> {
        if self.writes.fetch_add(1, Ordering::SeqCst) >= self.allowed {
            return Err(NormalizerError::Io(std::io::Error::other("connection reset")));
        }
        self.inner.replace_by_id(id, document).await
    }
}

#[tokio::test]
async fn test_write_failure_aborts_and_leaves_partial_conversion() {
    let store = FailingStore {
        inner: MemoryStore::from_documents(vec![
            doc! { "_id": 1, "tmin": "1,5" },
            doc! { "_id": 2, "tmin": "2,5" },
            doc! { "_id": 3, "tmin": "3,5" },
        ]),
        allowed: 1,
        writes: AtomicUsize::new(0),
    };
    let normalizer = FieldNormalizer::new(&store).with_fields(vec!["tmin".to_string()]);

    let result = normalizer.convert(None).await;
    assert!(matches!(result, Err(NormalizerError::Io(_))));
    assert_eq!(store.writes.load(Ordering::SeqCst), 2);

    let documents = store.inner.documents().await;
    assert_eq!(documents[0].get_f64("tmin").unwrap(), 1.5);
    assert_eq!(documents[1].get_str("tmin").unwrap(), "2,5");
    assert_eq!(documents[2].get_str("tmin").unwrap(), "3,5");
}

#[tokio::test]
async fn test_document_without_identity_is_rejected() {
    struct AnonymousStore;

    #[async_trait]
    impl DocumentStore for AnonymousStore {
        fn describe(&self) -> String {
            "anonymous".to_string()
        }

        async fn backfill_missing(&self, _field: &str, _placeholder: &Bson) -> Result<u64> {
            Ok(0)
        }

        async fn fetch_all(&self) -> Result<Vec<Document>> {
            Ok(vec![doc! { "tmin": "1,0" }])
        }

        async fn replace_by_id(&self, _id: &Bson, _document: Document) -> Result<ReplaceOutcome> {
            Ok(ReplaceOutcome::Replaced)
        }
    }

    let store = AnonymousStore;
    let result = FieldNormalizer::new(&store).convert(None).await;
    assert!(matches!(
        result,
        Err(NormalizerError::MissingIdentity { position: 0 })
    ));
}
