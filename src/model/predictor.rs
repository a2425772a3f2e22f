//! Predictor: artifact loading and inference orchestration.

use crate::error::{Result, ScoringError};
use crate::features::FittedTransformer;
use crate::model::loader::WeightState;
use crate::model::network::{ModelConfig, ScoringNetwork};
use crate::types::{ApplicantRecord, PredictionResult, RiskLabel};
use ndarray::Array2;
use std::path::Path;
use tracing::{debug, info};

/// Owns the fitted transformer and the scoring network for the process
/// lifetime.
///
/// Built once at startup by [`Predictor::initialize`]; there is no reload.
/// `predict` only reads the loaded artifacts, so a `Predictor` can be shared
/// across request handlers behind an `Arc` without locking.
pub struct Predictor {
    transformer: FittedTransformer,
    network: ScoringNetwork,
}

impl Predictor {
    /// Load both artifacts, reconstruct the configured architecture, apply
    /// the trained weights, and switch to evaluation mode.
    ///
    /// Any failure here is fatal: the caller must not serve traffic.
    pub fn initialize(
        transformer_path: &Path,
        weights_path: &Path,
        config: &ModelConfig,
    ) -> Result<Self> {
        let transformer = FittedTransformer::load(transformer_path)?;
        info!(
            path = %transformer_path.display(),
            features = transformer.feature_count(),
            "Transformer loaded"
        );

        if transformer.feature_count() != config.num_features {
            return Err(ScoringError::ArchitectureMismatch(format!(
                "transformer produces {} features but the network expects {}",
                transformer.feature_count(),
                config.num_features
            )));
        }

        let mut network = ScoringNetwork::build(config)?;
        info!(
            units = network.units().len(),
            hidden_layers = ?config.hidden_layers,
            "Network constructed"
        );

        WeightState::load(weights_path)?.apply(&mut network)?;
        network.set_eval();
        info!("Predictor initialized, network in evaluation mode");

        Ok(Self {
            transformer,
            network,
        })
    }

    /// Score one applicant: transform, forward pass, sigmoid, threshold.
    pub fn predict(&self, record: &ApplicantRecord) -> Result<PredictionResult> {
        let features = self.transformer.transform(record)?;
        let width = features.len();
        let input = Array2::from_shape_vec((1, width), features)
            .map_err(|e| ScoringError::InferenceFailure(e.to_string()))?;

        let output = self.network.forward(&input)?;
        let logit = output[[0, 0]];
        if !logit.is_finite() {
            return Err(ScoringError::InferenceFailure(
                "network produced a non-finite logit".to_string(),
            ));
        }

        let probability = sigmoid(logit as f64);
        let label = RiskLabel::from_probability(probability);
        debug!(?label, probability, "Prediction generated");

        Ok(PredictionResult { label, probability })
    }

    /// Number of features the loaded transformer produces.
    pub fn feature_count(&self) -> usize {
        self.transformer.feature_count()
    }
}

/// Logistic function mapping a raw logit to a probability.
fn sigmoid(logit: f64) -> f64 {
    1.0 / (1.0 + (-logit).exp())
}
