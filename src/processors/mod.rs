pub mod converter;
pub mod inspector;
pub mod normalizer;
pub mod report;

pub use converter::{convert_document, ConvertedDocument, FieldOutcome};
pub use inspector::{generate_survey_summary, survey_documents, survey_store, CollectionSurvey, FieldSurvey};
pub use normalizer::FieldNormalizer;
pub use report::{generate_summary, BackfillSummary, ConversionSummary, FieldTally, NormalizationReport};
