//! Prediction result data structures

use serde::{Deserialize, Serialize};

/// Credit risk label produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLabel {
    Good,
    Bad,
}

impl RiskLabel {
    /// Determine the label from a probability of being a good risk.
    ///
    /// Exactly 0.5 maps to `Good`.
    pub fn from_probability(probability: f64) -> Self {
        if probability >= 0.5 {
            RiskLabel::Good
        } else {
            RiskLabel::Bad
        }
    }
}

/// Result of scoring one applicant. Derived per request, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted risk label
    #[serde(rename = "prediction")]
    pub label: RiskLabel,

    /// Probability of the applicant being a good risk (0.0 - 1.0)
    pub probability: f64,
}
