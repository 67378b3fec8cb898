use bson::{Bson, Document};

use crate::utils::parsing::parse_comma_decimal;

/// State of one tracked field inside a document.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Missing,
    Text(String),
    Number(f64),
    /// Any other BSON type (integers, null, dates, ...). Never converted.
    Other(Bson),
}

impl FieldValue {
    pub fn from_bson(value: Option<&Bson>) -> Self {
        match value {
            None => FieldValue::Missing,
            Some(Bson::String(text)) => FieldValue::Text(text.clone()),
            Some(Bson::Double(number)) => FieldValue::Number(*number),
            Some(other) => FieldValue::Other(other.clone()),
        }
    }

    pub fn read(document: &Document, key: &str) -> Self {
        Self::from_bson(document.get(key))
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, FieldValue::Number(n) if n.is_nan())
    }

    /// Textual values are parsed as comma-decimal numbers; everything else is
    /// returned unchanged.
    pub fn converted(self) -> Self {
        match self {
            FieldValue::Text(text) => FieldValue::Number(parse_comma_decimal(&text)),
            other => other,
        }
    }

    /// BSON representation, or `None` when the field should stay absent.
    pub fn into_bson(self) -> Option<Bson> {
        match self {
            FieldValue::Missing => None,
            FieldValue::Text(text) => Some(Bson::String(text)),
            FieldValue::Number(number) => Some(Bson::Double(number)),
            FieldValue::Other(value) => Some(value),
        }
    }
}
