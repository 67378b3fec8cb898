use bson::Bson;
use chrono::Utc;
use tracing::{debug, info, warn};

use super::converter::{convert_document, FieldOutcome};
use super::report::{BackfillSummary, ConversionSummary, NormalizationReport};
use crate::error::{NormalizerError, Result};
use crate::models::ClimateField;
use crate::settings::NormalizerConfig;
use crate::store::{DocumentStore, ReplaceOutcome};
use crate::utils::constants::{ID_FIELD, MISSING_PLACEHOLDER};
use crate::utils::progress::ProgressReporter;

/// Backfills absent tracked fields and converts comma-decimal text to
/// doubles. Every storage call is awaited before the next is issued.
pub struct FieldNormalizer<'a, S: DocumentStore> {
    store: &'a S,
    fields: Vec<String>,
    placeholder: String,
}

impl<'a, S: DocumentStore> FieldNormalizer<'a, S> {
    /// Normalizer over the nine AEMET fields with the `"N/A"` placeholder.
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            fields: ClimateField::default_keys(),
            placeholder: MISSING_PLACEHOLDER.to_string(),
        }
    }

    pub fn from_config(store: &'a S, config: &NormalizerConfig) -> Self {
        Self::new(store)
            .with_fields(config.fields.clone())
            .with_placeholder(&config.placeholder)
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = placeholder.to_string();
        self
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Set the placeholder on every document missing a tracked field, one
    /// bulk update per field.
    pub async fn backfill(&self, progress: Option<&ProgressReporter>) -> Result<BackfillSummary> {
        let placeholder = Bson::String(self.placeholder.clone());
        let mut summary = BackfillSummary {
            placeholder: self.placeholder.clone(),
            fields: Vec::with_capacity(self.fields.len()),
        };

        for field in &self.fields {
            if let Some(p) = progress {
                p.set_message(&format!("Backfilling '{}'...", field));
            }

            let modified = self.store.backfill_missing(field, &placeholder).await?;
            info!("Backfilled '{}' on {} documents", field, modified);
            summary.fields.push((field.clone(), modified));
        }

        Ok(summary)
    }

    /// Load the whole collection, convert every document and write each one
    /// back by `_id`. A storage error aborts the run; documents already
    /// written keep their converted values.
    pub async fn convert(&self, progress: Option<&ProgressReporter>) -> Result<ConversionSummary> {
        let documents = self.store.fetch_all().await?;
        info!(
            "Loaded {} documents from {}",
            documents.len(),
            self.store.describe()
        );

        if let Some(p) = progress {
            p.set_length(documents.len() as u64);
            p.set_message("Converting documents...");
        }

        let mut summary = ConversionSummary::new(self.fields.as_slice());

        for (position, document) in documents.into_iter().enumerate() {
            let id = document
                .get(ID_FIELD)
                .cloned()
                .ok_or(NormalizerError::MissingIdentity { position })?;

            let converted = convert_document(&document, self.fields.as_slice());
            for (field, outcome) in self.fields.iter().zip(&converted.outcomes) {
                if *outcome == FieldOutcome::Unparseable {
                    debug!(
                        "Document {} field '{}': {:?} is not numeric, stored NaN",
                        id,
                        field,
                        document.get(field)
                    );
                }
            }
            summary.record_document(&converted.outcomes);
            if !converted.changed() {
                summary.documents_unchanged += 1;
            }

            match self.store.replace_by_id(&id, converted.document).await? {
                ReplaceOutcome::Replaced => summary.documents_replaced += 1,
                ReplaceOutcome::Reinserted => {
                    warn!("Document {} vanished during conversion and was reinserted", id);
                    summary.documents_reinserted += 1;
                }
            }

            if let Some(p) = progress {
                p.increment(1);
            }
        }

        info!(
            "Converted {} values, {} stored as NaN, across {} documents ({} unchanged, {} written)",
            summary.total_converted(),
            summary.total_unparseable(),
            summary.documents_scanned,
            summary.documents_unchanged,
            summary.documents_written()
        );

        Ok(summary)
    }

    /// Backfill followed by conversion.
    pub async fn run(&self, progress: Option<&ProgressReporter>) -> Result<NormalizationReport> {
        let started_at = Utc::now();

        let backfill = self.backfill(progress).await?;
        let conversion = self.convert(progress).await?;

        Ok(NormalizationReport {
            target: self.store.describe(),
            started_at,
            finished_at: Utc::now(),
            backfill: Some(backfill),
            conversion: Some(conversion),
        })
    }
}
