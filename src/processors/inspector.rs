use bson::Document;

use crate::error::Result;
use crate::models::{ClimateField, FieldValue};
use crate::store::DocumentStore;
use crate::utils::constants::SUMMARY_TOP_N;
use crate::utils::parsing::parse_comma_decimal;

/// How one tracked field is represented across the collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSurvey {
    pub field: String,
    pub missing: usize,
    pub text: usize,
    pub numeric: usize,
    pub nan: usize,
    pub other: usize,
    /// Text values that would become NaN on conversion.
    pub unparseable_text: usize,
    /// Distinct unparseable texts, first seen first.
    pub samples: Vec<String>,
}

impl FieldSurvey {
    fn new(field: &str) -> Self {
        Self {
            field: field.to_string(),
            ..Default::default()
        }
    }

    fn observe(&mut self, value: FieldValue, max_samples: usize) {
        match value {
            FieldValue::Missing => self.missing += 1,
            FieldValue::Text(text) => {
                self.text += 1;
                if parse_comma_decimal(&text).is_nan() {
                    self.unparseable_text += 1;
                    if self.samples.len() < max_samples && !self.samples.contains(&text) {
                        self.samples.push(text);
                    }
                }
            }
            FieldValue::Number(n) if n.is_nan() => self.nan += 1,
            FieldValue::Number(_) => self.numeric += 1,
            FieldValue::Other(_) => self.other += 1,
        }
    }

    /// Whether a conversion pass would change anything for this field.
    pub fn needs_normalization(&self) -> bool {
        self.missing > 0 || self.text > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionSurvey {
    pub target: String,
    pub documents: usize,
    pub fields: Vec<FieldSurvey>,
}

impl CollectionSurvey {
    pub fn field(&self, field: &str) -> Option<&FieldSurvey> {
        self.fields.iter().find(|s| s.field == field)
    }

    pub fn is_normalized(&self) -> bool {
        !self.fields.iter().any(FieldSurvey::needs_normalization)
    }
}

/// Read-only survey of tracked fields over a set of documents.
pub fn survey_documents<S: AsRef<str>>(
    documents: &[Document],
    fields: &[S],
    max_samples: usize,
) -> CollectionSurvey {
    let mut surveys: Vec<FieldSurvey> = fields.iter().map(|f| FieldSurvey::new(f.as_ref())).collect();

    for document in documents {
        for survey in surveys.iter_mut() {
            let value = FieldValue::read(document, &survey.field);
            survey.observe(value, max_samples);
        }
    }

    CollectionSurvey {
        target: String::new(),
        documents: documents.len(),
        fields: surveys,
    }
}

/// Fetch the collection and survey it without writing anything back.
pub async fn survey_store<D: DocumentStore, S: AsRef<str>>(
    store: &D,
    fields: &[S],
    max_samples: usize,
) -> Result<CollectionSurvey> {
    let documents = store.fetch_all().await?;
    let mut survey = survey_documents(&documents, fields, max_samples);
    survey.target = store.describe();
    Ok(survey)
}

pub fn generate_survey_summary(survey: &CollectionSurvey) -> String {
    let mut summary = String::new();

    summary.push_str("=== Collection Survey ===\n");
    summary.push_str(&format!("Target: {}\n", survey.target));
    summary.push_str(&format!("Documents: {}\n\n", survey.documents));
    summary.push_str(&format!(
        "  {:<40} {:>8} {:>8} {:>8} {:>8} {:>8} {:>11}\n",
        "Field", "Missing", "Text", "Numeric", "NaN", "Other", "Unparseable"
    ));

    for field in &survey.fields {
        summary.push_str(&format!(
            "  {:<40} {:>8} {:>8} {:>8} {:>8} {:>8} {:>11}\n",
            ClimateField::label_for(&field.field),
            field.missing,
            field.text,
            field.numeric,
            field.nan,
            field.other,
            field.unparseable_text
        ));
    }

    let with_samples: Vec<&FieldSurvey> = survey
        .fields
        .iter()
        .filter(|f| !f.samples.is_empty())
        .take(SUMMARY_TOP_N)
        .collect();
    if !with_samples.is_empty() {
        summary.push_str("\nUnparseable text samples:\n");
        for field in with_samples {
            summary.push_str(&format!("  {}: {:?}\n", field.field, field.samples));
        }
    }

    if survey.is_normalized() {
        summary.push_str("\n✅ All tracked fields are present and non-textual\n");
    } else {
        summary.push_str("\n⚠️  Collection needs normalization\n");
    }

    summary
}
