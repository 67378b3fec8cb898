use bson::Document;

use crate::models::FieldValue;

/// What happened to one tracked field of one document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldOutcome {
    /// Text parsed to a number.
    Converted(f64),
    /// Text with no numeric prefix; stored as NaN.
    Unparseable,
    /// Already non-textual; left as it was.
    Untouched,
    /// Key absent; left absent.
    Missing,
}

/// A document after conversion, with one outcome per tracked field in the
/// order the fields were given.
#[derive(Debug, Clone)]
pub struct ConvertedDocument {
    pub document: Document,
    pub outcomes: Vec<FieldOutcome>,
}

impl ConvertedDocument {
    pub fn changed(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o, FieldOutcome::Converted(_) | FieldOutcome::Unparseable))
    }
}

/// Produce a new document in which every textual tracked field holds its
/// comma-decimal value as a double. Other fields and non-textual values are
/// copied through unchanged.
pub fn convert_document<S: AsRef<str>>(document: &Document, fields: &[S]) -> ConvertedDocument {
    let mut converted = document.clone();
    let mut outcomes = Vec::with_capacity(fields.len());

    for field in fields {
        let key = field.as_ref();
        let outcome = match FieldValue::read(document, key) {
            FieldValue::Missing => FieldOutcome::Missing,
            value @ FieldValue::Text(_) => {
                let parsed = value.converted();
                let outcome = match parsed {
                    FieldValue::Number(n) if !n.is_nan() => FieldOutcome::Converted(n),
                    _ => FieldOutcome::Unparseable,
                };
                if let Some(bson) = parsed.into_bson() {
                    converted.insert(key, bson);
                }
                outcome
            }
            FieldValue::Number(_) | FieldValue::Other(_) => FieldOutcome::Untouched,
        };
        outcomes.push(outcome);
    }

    ConvertedDocument {
        document: converted,
        outcomes,
    }
}
