use serde::{Deserialize, Serialize};

/// Daily climatological measurements published by AEMET, keyed as they
/// appear in the `climatologicos` documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClimateField {
    MinTemperature,
    MaxTemperature,
    MeanTemperature,
    Precipitation,
    MeanWindSpeed,
    WindGust,
    Sunshine,
    MaxPressure,
    MinPressure,
}

impl ClimateField {
    /// All fields in the order the normalizer processes them.
    pub const ALL: [ClimateField; 9] = [
        ClimateField::MinTemperature,
        ClimateField::MaxTemperature,
        ClimateField::MeanTemperature,
        ClimateField::Precipitation,
        ClimateField::MeanWindSpeed,
        ClimateField::WindGust,
        ClimateField::Sunshine,
        ClimateField::MaxPressure,
        ClimateField::MinPressure,
    ];

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "tmin" => Some(ClimateField::MinTemperature),
            "tmax" => Some(ClimateField::MaxTemperature),
            "tmed" => Some(ClimateField::MeanTemperature),
            "prec" => Some(ClimateField::Precipitation),
            "velmedia" => Some(ClimateField::MeanWindSpeed),
            "racha" => Some(ClimateField::WindGust),
            "sol" => Some(ClimateField::Sunshine),
            "presMax" => Some(ClimateField::MaxPressure),
            "presMin" => Some(ClimateField::MinPressure),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            ClimateField::MinTemperature => "tmin",
            ClimateField::MaxTemperature => "tmax",
            ClimateField::MeanTemperature => "tmed",
            ClimateField::Precipitation => "prec",
            ClimateField::MeanWindSpeed => "velmedia",
            ClimateField::WindGust => "racha",
            ClimateField::Sunshine => "sol",
            ClimateField::MaxPressure => "presMax",
            ClimateField::MinPressure => "presMin",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ClimateField::MinTemperature => "Temperature (Min)",
            ClimateField::MaxTemperature => "Temperature (Max)",
            ClimateField::MeanTemperature => "Temperature (Mean)",
            ClimateField::Precipitation => "Precipitation",
            ClimateField::MeanWindSpeed => "Wind Speed (Mean)",
            ClimateField::WindGust => "Wind Gust",
            ClimateField::Sunshine => "Sunshine",
            ClimateField::MaxPressure => "Pressure (Max)",
            ClimateField::MinPressure => "Pressure (Min)",
        }
    }

    pub fn units(&self) -> &'static str {
        match self {
            ClimateField::MinTemperature
            | ClimateField::MaxTemperature
            | ClimateField::MeanTemperature => "°C",
            ClimateField::Precipitation => "mm",
            ClimateField::MeanWindSpeed | ClimateField::WindGust => "m/s",
            ClimateField::Sunshine => "h",
            ClimateField::MaxPressure | ClimateField::MinPressure => "hPa",
        }
    }

    /// Default tracked keys, as owned strings for configuration.
    pub fn default_keys() -> Vec<String> {
        Self::ALL.iter().map(|f| f.key().to_string()).collect()
    }

    /// Label for a document key: known fields get their name and units,
    /// anything else is shown as-is.
    pub fn label_for(key: &str) -> String {
        match Self::from_key(key) {
            Some(field) => format!("{} [{}, {}]", key, field.display_name(), field.units()),
            None => key.to_string(),
        }
    }
}

impl std::fmt::Display for ClimateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}
