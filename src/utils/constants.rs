/// Storage defaults
pub const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_DATABASE: &str = "aemet";
pub const DEFAULT_COLLECTION: &str = "climatologicos";

/// Value written to tracked fields that are absent from a document
pub const MISSING_PLACEHOLDER: &str = "N/A";

/// Document identity key
pub const ID_FIELD: &str = "_id";

/// Environment variable prefix for configuration overrides (AEMET_DATABASE, ...)
pub const ENV_PREFIX: &str = "AEMET";

/// Reporting defaults
pub const DEFAULT_SAMPLE_COUNT: usize = 5;
pub const SUMMARY_TOP_N: usize = 10;
