use crate::models::priority::{predicted_failure, Priority};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{de, Deserialize, Deserializer, Serialize};

/// Parse the calendar date of an ISO-8601 date or datetime.
///
/// Accepts `2024-01-01`, `2024-01-01T06:30:00`, `2024-01-01 06:30:00`
/// (optionally with fractional seconds) and RFC 3339 timestamps. The time of
/// day is dropped.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .map(|datetime| datetime.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_date(&text).ok_or_else(|| de::Error::custom(format!("invalid date '{}'", text)))
}

/// One raw sensor row for an asset on a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Asset identifier (many rows per asset)
    #[serde(rename = "Asset_ID")]
    pub asset_id: String,

    /// Observation date; a datetime in the source keeps only its date
    #[serde(rename = "Date", deserialize_with = "deserialize_date")]
    pub date: NaiveDate,

    /// Cumulative usage hours
    #[serde(rename = "Usage_Hours")]
    pub usage_hours: f64,

    /// Temperature reading
    #[serde(rename = "Temperature")]
    pub temperature: f64,

    /// Pressure reading
    #[serde(rename = "Pressure")]
    pub pressure: f64,

    /// Ground-truth failure flag (0 or 1)
    #[serde(rename = "Failure")]
    pub failure: u8,
}

impl SensorReading {
    pub fn new(
        asset_id: impl Into<String>,
        date: NaiveDate,
        usage_hours: f64,
        temperature: f64,
        pressure: f64,
        failure: u8,
    ) -> Self {
        Self {
            asset_id: asset_id.into(),
            date,
            usage_hours,
            temperature,
            pressure,
            failure,
        }
    }

    /// Whether the ground truth records a failure
    pub fn failed(&self) -> bool {
        self.failure == 1
    }
}

/// A sensor row extended with its score, tier and explanation.
///
/// Fields are flat so the row maps one-to-one onto the output CSV columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredReading {
    #[serde(rename = "Asset_ID")]
    pub asset_id: String,

    #[serde(rename = "Date", deserialize_with = "deserialize_date")]
    pub date: NaiveDate,

    #[serde(rename = "Usage_Hours")]
    pub usage_hours: f64,

    #[serde(rename = "Temperature")]
    pub temperature: f64,

    #[serde(rename = "Pressure")]
    pub pressure: f64,

    #[serde(rename = "Failure")]
    pub failure: u8,

    /// Estimated failure probability in [0, 1]
    #[serde(rename = "Failure_Prob")]
    pub failure_prob: f64,

    /// `failure_prob > 0.5`
    #[serde(rename = "Predicted_Failure")]
    pub predicted_failure: bool,

    #[serde(rename = "Priority")]
    pub priority: Priority,

    #[serde(rename = "Explanation")]
    pub explanation: String,
}

impl ScoredReading {
    /// Attach a probability to a reading, deriving the flag and tier.
    /// The explanation starts empty and is filled by the explain stage.
    pub fn from_reading(reading: SensorReading, failure_prob: f64) -> Self {
        Self {
            asset_id: reading.asset_id,
            date: reading.date,
            usage_hours: reading.usage_hours,
            temperature: reading.temperature,
            pressure: reading.pressure,
            failure: reading.failure,
            failure_prob,
            predicted_failure: predicted_failure(failure_prob),
            priority: Priority::from_probability(failure_prob),
            explanation: String::new(),
        }
    }

    pub fn with_explanation(mut self, explanation: String) -> Self {
        self.explanation = explanation;
        self
    }

    /// The original sensor columns of this row
    pub fn reading(&self) -> SensorReading {
        SensorReading {
            asset_id: self.asset_id.clone(),
            date: self.date,
            usage_hours: self.usage_hours,
            temperature: self.temperature,
            pressure: self.pressure,
            failure: self.failure,
        }
    }
}
