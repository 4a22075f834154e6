//! Spoken safety advisories
//!
//! Turns a prediction into the sentence read out to the driver. Only the
//! text is produced here; playing it back is up to the caller.

use super::models::PredictionResult;

const RAIN_THRESHOLD_IN: f64 = 0.1;
const LOW_VISIBILITY_MI: f64 = 2.0;
const HIGH_WIND_MPH: f64 = 25.0;

const HIGH_RISK_LABEL: &str = "High Accident Risk";
const HIGH_RISK_PREFIX: &str = "Warning! High accident risk detected. ";
const LOW_RISK_LABEL: &str = "Low Accident Risk";
const LOW_RISK_MESSAGE: &str = "Low accident risk. Maintain emergency protocols and drive safely.";

/// Conditions that sharpen a high-risk warning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RiskFactors {
    pub raining: bool,
    pub low_visibility: bool,
    pub high_wind: bool,
    pub dark: bool,
}

impl RiskFactors {
    /// Absent readings never count as a risk factor
    pub fn from_prediction(prediction: &PredictionResult) -> Self {
        let weather = &prediction.weather;

        Self {
            raining: weather.precipitation_in().map_or(false, |p| p > RAIN_THRESHOLD_IN),
            low_visibility: weather.visibility_mi().map_or(false, |v| v < LOW_VISIBILITY_MI),
            high_wind: weather.wind_speed_mph().map_or(false, |w| w > HIGH_WIND_MPH),
            dark: prediction.daylight_status == "Night",
        }
    }

    fn guidance(&self) -> &'static str {
        if self.raining && self.low_visibility {
            "Heavy rain and low visibility. Reduce speed, use emergency lights, and exercise extreme caution."
        } else if self.raining {
            "Wet road conditions. Increase following distance and reduce emergency response speed by 15%."
        } else if self.low_visibility {
            "Poor visibility conditions. Use all emergency lighting and proceed with caution."
        } else if self.high_wind {
            "High wind conditions affecting vehicle stability. Maintain firm steering control."
        } else if self.dark {
            "Nighttime high-risk conditions. Use full emergency lighting and watch for impaired drivers."
        } else {
            "Multiple risk factors present. Consider alternate route if available."
        }
    }
}

/// Advisory for a prediction, or `None` when the risk label warrants no announcement
pub fn advisory_for(prediction: &PredictionResult) -> Option<String> {
    match prediction.risk.as_str() {
        HIGH_RISK_LABEL => {
            let factors = RiskFactors::from_prediction(prediction);
            Some(format!("{}{}", HIGH_RISK_PREFIX, factors.guidance()))
        }
        LOW_RISK_LABEL => Some(LOW_RISK_MESSAGE.to_string()),
        _ => None,
    }
}
