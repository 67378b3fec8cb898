use chrono::{DateTime, Utc};

use super::converter::FieldOutcome;
use crate::models::ClimateField;

/// Documents modified per field by the backfill phase, in field order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackfillSummary {
    pub placeholder: String,
    pub fields: Vec<(String, u64)>,
}

impl BackfillSummary {
    pub fn total_backfilled(&self) -> u64 {
        self.fields.iter().map(|(_, count)| count).sum()
    }

    pub fn backfilled(&self, field: &str) -> Option<u64> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, count)| *count)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTally {
    pub field: String,
    pub converted: usize,
    pub unparseable: usize,
    pub untouched: usize,
    pub missing: usize,
}

impl FieldTally {
    pub fn new(field: &str) -> Self {
        Self {
            field: field.to_string(),
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: &FieldOutcome) {
        match outcome {
            FieldOutcome::Converted(_) => self.converted += 1,
            FieldOutcome::Unparseable => self.unparseable += 1,
            FieldOutcome::Untouched => self.untouched += 1,
            FieldOutcome::Missing => self.missing += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    pub documents_scanned: usize,
    /// Documents with no textual tracked field; written back as they were.
    pub documents_unchanged: usize,
    pub documents_replaced: usize,
    pub documents_reinserted: usize,
    pub field_tallies: Vec<FieldTally>,
}

impl ConversionSummary {
    pub fn new<S: AsRef<str>>(fields: &[S]) -> Self {
        Self {
            field_tallies: fields.iter().map(|f| FieldTally::new(f.as_ref())).collect(),
            ..Default::default()
        }
    }

    /// Fold the per-field outcomes of one document into the tallies. Outcomes
    /// are positional, matching the field order given to [`Self::new`].
    pub fn record_document(&mut self, outcomes: &[FieldOutcome]) {
        self.documents_scanned += 1;
        for (tally, outcome) in self.field_tallies.iter_mut().zip(outcomes) {
            tally.record(outcome);
        }
    }

    pub fn tally(&self, field: &str) -> Option<&FieldTally> {
        self.field_tallies.iter().find(|t| t.field == field)
    }

    pub fn total_converted(&self) -> usize {
        self.field_tallies.iter().map(|t| t.converted).sum()
    }

    pub fn total_unparseable(&self) -> usize {
        self.field_tallies.iter().map(|t| t.unparseable).sum()
    }

    pub fn documents_written(&self) -> usize {
        self.documents_replaced + self.documents_reinserted
    }
}

#[derive(Debug, Clone)]
pub struct NormalizationReport {
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub backfill: Option<BackfillSummary>,
    pub conversion: Option<ConversionSummary>,
}

impl NormalizationReport {
    pub fn elapsed_seconds(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

/// Render a report in the same block layout as the other CLI summaries.
pub fn generate_summary(report: &NormalizationReport) -> String {
    let mut summary = String::new();

    summary.push_str("=== Normalization Report ===\n");
    summary.push_str(&format!("Target: {}\n", report.target));
    summary.push_str(&format!(
        "Started: {}  Elapsed: {:.1}s\n",
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.elapsed_seconds()
    ));

    if let Some(ref backfill) = report.backfill {
        summary.push_str(&format!(
            "\nBackfill (placeholder \"{}\"): {} fields set\n",
            backfill.placeholder,
            backfill.total_backfilled()
        ));
        for (field, count) in &backfill.fields {
            summary.push_str(&format!(
                "  {:<40} {:>8}\n",
                ClimateField::label_for(field),
                count
            ));
        }
    }

    if let Some(ref conversion) = report.conversion {
        summary.push_str(&format!(
            "\nConversion: {} documents scanned ({} unchanged), {} written ({} replaced, {} reinserted)\n",
            conversion.documents_scanned,
            conversion.documents_unchanged,
            conversion.documents_written(),
            conversion.documents_replaced,
            conversion.documents_reinserted
        ));
        summary.push_str(&format!(
            "  {:<40} {:>9} {:>11} {:>9} {:>8}\n",
            "Field", "Converted", "Unparseable", "Untouched", "Missing"
        ));
        for tally in &conversion.field_tallies {
            summary.push_str(&format!(
                "  {:<40} {:>9} {:>11} {:>9} {:>8}\n",
                ClimateField::label_for(&tally.field),
                tally.converted,
                tally.unparseable,
                tally.untouched,
                tally.missing
            ));
        }
        summary.push_str(&format!(
            "Total: {} converted, {} stored as NaN\n",
            conversion.total_converted(),
            conversion.total_unparseable()
        ));
    }

    summary
}
