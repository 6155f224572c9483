use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

/// Format of the upstream `dt_txt` field.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Forecast returned by `/data/2.5/forecast`, entries in upstream order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    #[serde(rename = "list")]
    pub entries: Vec<ForecastEntry>,
}

/// One forecast record for a single future timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    #[serde(rename = "main", default, deserialize_with = "null_as_default")]
    pub measurements: Measurements,

    #[serde(rename = "weather", default, deserialize_with = "null_as_default")]
    pub conditions: Vec<WeatherCondition>,

    /// Stored verbatim, e.g. `2025-10-31 18:00:00`.
    #[serde(rename = "dt_txt")]
    pub timestamp: String,
}

/// Metric measurements; upstream may omit any of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    #[serde(rename = "temp", default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feels_like: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_min: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_max: Option<f64>,

    /// Percentage, 0..=100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
}

/// Upstream label and text; either may be missing, which leaves it empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherCondition {
    #[serde(rename = "main", default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

/// Treat an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl ForecastResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ForecastEntry {
    /// Parse the verbatim timestamp. Returns `None` if upstream changed its format.
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT).ok()
    }

    /// Description of the first condition that has one.
    pub fn summary(&self) -> Option<&str> {
        self.conditions
            .iter()
            .map(|c| c.description.as_str())
            .find(|d| !d.is_empty())
    }
}
