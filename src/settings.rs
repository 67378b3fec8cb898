use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::{Validate, ValidationError};

use crate::error::Result;
use crate::models::ClimateField;
use crate::utils::constants::{
    DEFAULT_COLLECTION, DEFAULT_DATABASE, DEFAULT_MONGO_URI, ENV_PREFIX, MISSING_PLACEHOLDER,
};

/// Where to normalize and what to normalize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NormalizerConfig {
    #[validate(length(min = 1))]
    pub uri: String,

    #[validate(length(min = 1))]
    pub database: String,

    #[validate(length(min = 1))]
    pub collection: String,

    /// Tracked field keys, processed in this order. Top-level keys only.
    #[validate(length(min = 1), custom(function = "validate_field_keys"))]
    pub fields: Vec<String>,

    /// Value written to tracked fields that are absent.
    pub placeholder: String,
}

/// Command-line values that take precedence over file and environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub uri: Option<String>,
    pub database: Option<String>,
    pub collection: Option<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_MONGO_URI.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            fields: ClimateField::default_keys(),
            placeholder: MISSING_PLACEHOLDER.to_string(),
        }
    }
}

impl NormalizerConfig {
    /// Build the configuration from defaults, an optional file, `AEMET_*`
    /// environment variables and finally command-line overrides.
    pub fn load(file: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let defaults = Self::default();

        let mut builder = Config::builder()
            .set_default("uri", defaults.uri)?
            .set_default("database", defaults.database)?
            .set_default("collection", defaults.collection)?
            .set_default("fields", defaults.fields)?
            .set_default("placeholder", defaults.placeholder)?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("fields"),
        );

        let mut config: NormalizerConfig = builder.build()?.try_deserialize()?;
        config.apply_overrides(overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref uri) = overrides.uri {
            self.uri = uri.clone();
        }
        if let Some(ref database) = overrides.database {
            self.database = database.clone();
        }
        if let Some(ref collection) = overrides.collection {
            self.collection = collection.clone();
        }
    }

    /// Connection string with any credentials masked, for logging.
    pub fn redacted_uri(&self) -> String {
        match (self.uri.find("://"), self.uri.rfind('@')) {
            (Some(scheme_end), Some(at)) if at > scheme_end => {
                format!("{}://***{}", &self.uri[..scheme_end], &self.uri[at..])
            }
            _ => self.uri.clone(),
        }
    }
}

/// Keys must name a top-level field: not empty, no `.` path separator and no
/// leading `$`. MongoDB reads those as paths or operators.
fn validate_field_keys(fields: &[String]) -> std::result::Result<(), ValidationError> {
    for field in fields {
        if field.is_empty() || field.contains('.') || field.starts_with('$') {
            let mut error = ValidationError::new("top_level_field");
            error.add_param("field".into(), field);
            return Err(error);
        }
    }
    Ok(())
}
