//! Prediction service data models
//!
//! `PredictionPayload` mirrors the wire format, where every field may be
//! missing. `PredictionResult` is the normalized record handed to callers.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::Endpoint;
use crate::error::AttemptFailure;

/// Reading names reported by the prediction service
pub const TEMPERATURE_F: &str = "Temperature(F)";
pub const HUMIDITY_PCT: &str = "Humidity(%)";
pub const VISIBILITY_MI: &str = "Visibility(mi)";
pub const WIND_SPEED_MPH: &str = "Wind_Speed(mph)";
pub const PRECIPITATION_IN: &str = "Precipitation(in)";

/// Response body of `GET /predict` as sent on the wire
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionPayload {
    #[serde(default)]
    pub risk: Option<String>,

    #[serde(default)]
    pub weather: Option<BTreeMap<String, Option<f64>>>,

    #[serde(default)]
    pub daylight_status: Option<String>,

    #[serde(default)]
    pub location: Option<LocationPayload>,

    #[serde(default)]
    pub probability: Option<f64>,

    #[serde(default)]
    pub safety_tips: Option<Vec<String>>,
}

/// Wire form of a coordinate pair
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationPayload {
    #[serde(default)]
    pub latitude: Option<f64>,

    #[serde(default)]
    pub longitude: Option<f64>,
}

impl PredictionPayload {
    /// Fill every absent field with its default
    pub fn normalize(self) -> PredictionResult {
        let weather = self.weather
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(name, reading)| reading.map(|value| (name, value)))
            .collect();

        let location = self.location
            .map(|loc| Coordinates {
                latitude: loc.latitude.unwrap_or_default(),
                longitude: loc.longitude.unwrap_or_default(),
            })
            .unwrap_or_default();

        PredictionResult {
            risk: self.risk.unwrap_or_default(),
            weather: WeatherSnapshot(weather),
            daylight_status: self.daylight_status.unwrap_or_default(),
            location,
            probability: self.probability.unwrap_or_default(),
            safety_tips: self.safety_tips.unwrap_or_default(),
        }
    }
}

/// Named numeric weather readings; a reading missing from the map was not reported
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeatherSnapshot(pub BTreeMap<String, f64>);

impl WeatherSnapshot {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn temperature_f(&self) -> Option<f64> {
        self.get(TEMPERATURE_F)
    }

    pub fn humidity_pct(&self) -> Option<f64> {
        self.get(HUMIDITY_PCT)
    }

    pub fn visibility_mi(&self) -> Option<f64> {
        self.get(VISIBILITY_MI)
    }

    pub fn wind_speed_mph(&self) -> Option<f64> {
        self.get(WIND_SPEED_MPH)
    }

    pub fn precipitation_in(&self) -> Option<f64> {
        self.get(PRECIPITATION_IN)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Geographic coordinate pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Normalized prediction record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Risk label, e.g. "High Accident Risk"
    pub risk: String,

    /// Weather readings the prediction was based on
    pub weather: WeatherSnapshot,

    /// Daylight status, e.g. "Day" or "Night"
    pub daylight_status: String,

    /// Where the prediction applies
    pub location: Coordinates,

    /// Model probability, expected in 0..=1
    pub probability: f64,

    /// Safety tips in the order the service returned them
    pub safety_tips: Vec<String>,
}

impl PredictionResult {
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_label(&self.risk)
    }
}

/// Coarse classification of the open set of risk labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Low,
    Unknown,
}

impl RiskLevel {
    /// Any label mentioning "High" is high risk; any other non-empty label is low risk
    pub fn from_label(label: &str) -> Self {
        if label.contains("High") {
            RiskLevel::High
        } else if label.is_empty() {
            RiskLevel::Unknown
        } else {
            RiskLevel::Low
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "High"),
            Self::Low => write!(f, "Low"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A successful fallback scan with its diagnostics
#[derive(Debug)]
pub struct ScanOutcome {
    /// The normalized prediction
    pub prediction: PredictionResult,

    /// Endpoint that served the prediction
    pub endpoint: Endpoint,

    /// Wall time of the whole scan, failed attempts included
    pub elapsed: Duration,

    /// Endpoints tried before the one that answered
    pub failures: Vec<AttemptFailure>,
}
