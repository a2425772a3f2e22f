//! Scoring network construction and forward pass.
//!
//! The network topology is built deterministically from a [`ModelConfig`]:
//! each hidden width produces a Linear / optional BatchNorm / Activation /
//! Dropout block, followed by one final Linear projecting to a single raw
//! logit. The sigmoid is applied by the caller, not here.

use crate::error::{Result, ScoringError};
use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Activation function applied after each hidden linear transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    ReLU,
    Tanh,
    Sigmoid,
}

impl Activation {
    /// Element-wise activation.
    pub fn apply(&self, x: f32) -> f32 {
        match self {
            Activation::ReLU => {
                if x > 0.0 {
                    x
                } else {
                    0.0
                }
            }
            Activation::Tanh => x.tanh(),
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
        }
    }
}

/// Network architecture configuration.
///
/// Versioned together with the transformer and weight artifacts; the
/// topology it describes must match the persisted weights exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Input width; must equal the fitted transformer's feature count
    pub num_features: usize,
    /// Hidden layer widths, in order
    pub hidden_layers: Vec<usize>,
    /// Dropout rate in [0, 1)
    pub dropout_rate: f64,
    /// Whether each hidden block carries a batch normalization unit
    pub use_batch_norm: bool,
    /// Activation function for hidden blocks
    pub activation: Activation,
}

impl ModelConfig {
    /// Reject configurations that cannot describe a valid network.
    pub fn validate(&self) -> Result<()> {
        if self.num_features == 0 {
            return Err(ScoringError::InvalidConfig(
                "num_features must be positive".to_string(),
            ));
        }
        if self.hidden_layers.is_empty() {
            return Err(ScoringError::InvalidConfig(
                "hidden_layers must not be empty".to_string(),
            ));
        }
        if self.hidden_layers.iter().any(|&w| w == 0) {
            return Err(ScoringError::InvalidConfig(
                "hidden layer widths must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.dropout_rate) {
            return Err(ScoringError::InvalidConfig(format!(
                "dropout_rate {} is outside [0, 1)",
                self.dropout_rate
            )));
        }
        Ok(())
    }
}

/// Fully-connected layer with weight shape (out, in).
#[derive(Debug, Clone)]
pub struct Linear {
    pub weight: Array2<f32>,
    pub bias: Array1<f32>,
}

impl Linear {
    /// He initialization: N(0, sqrt(2 / fan_in)). The sampled values are
    /// placeholders until trained weights are loaded over them.
    pub fn new(in_width: usize, out_width: usize) -> Self {
        let mut rng = rand::thread_rng();
        let std_dev = (2.0 / in_width as f64).sqrt();
        let weight = Array2::from_shape_fn((out_width, in_width), |_| {
            (sample_standard_normal(&mut rng) * std_dev) as f32
        });
        let bias = Array1::zeros(out_width);
        Self { weight, bias }
    }

    pub fn in_width(&self) -> usize {
        self.weight.ncols()
    }

    pub fn out_width(&self) -> usize {
        self.weight.nrows()
    }

    fn forward(&self, input: &Array2<f32>) -> Array2<f32> {
        input.dot(&self.weight.t()) + &self.bias
    }
}

/// Samples a single value from N(0, 1) using the Box-Muller transform.
fn sample_standard_normal(rng: &mut ThreadRng) -> f64 {
    // Draw two independent uniform samples in (0, 1] to avoid log(0).
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = 1.0 - rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Batch normalization over the feature axis.
#[derive(Debug, Clone)]
pub struct BatchNorm {
    pub gamma: Array1<f32>,
    pub beta: Array1<f32>,
    pub running_mean: Array1<f32>,
    pub running_var: Array1<f32>,
}

impl BatchNorm {
    pub const EPS: f32 = 1e-5;

    pub fn new(width: usize) -> Self {
        Self {
            gamma: Array1::ones(width),
            beta: Array1::zeros(width),
            running_mean: Array1::zeros(width),
            running_var: Array1::ones(width),
        }
    }

    pub fn width(&self) -> usize {
        self.gamma.len()
    }

    /// Normalize with batch statistics in training mode and with the stored
    /// running statistics in evaluation mode.
    pub fn forward(&self, input: &Array2<f32>, training: bool) -> Array2<f32> {
        let (mean, var) = if training {
            let mean = input.mean_axis(Axis(0)).expect("batch is non-empty");
            let var = input.var_axis(Axis(0), 0.0);
            (mean, var)
        } else {
            (self.running_mean.clone(), self.running_var.clone())
        };
        let denom = (&var + Self::EPS).mapv(f32::sqrt);
        let normalized = (input - &mean) / &denom;
        normalized * &self.gamma + &self.beta
    }
}

/// Inverted dropout; identity in evaluation mode.
#[derive(Debug, Clone)]
pub struct Dropout {
    pub rate: f64,
}

impl Dropout {
    pub fn forward(&self, input: &Array2<f32>, training: bool) -> Array2<f32> {
        if !training || self.rate == 0.0 {
            return input.clone();
        }
        let keep = 1.0 - self.rate;
        let inv_keep = (1.0 / keep) as f32;
        let mut rng = rand::thread_rng();
        input.mapv(|v| {
            if rng.gen::<f64>() < keep {
                v * inv_keep
            } else {
                0.0
            }
        })
    }
}

/// One unit in the network's layer chain.
#[derive(Debug, Clone)]
pub enum LayerUnit {
    Linear(Linear),
    BatchNorm(BatchNorm),
    Activation(Activation),
    Dropout(Dropout),
}

/// Feed-forward credit scoring classifier.
///
/// Constructed in training mode; [`ScoringNetwork::set_eval`] must be called
/// before serving so dropout and batch statistics are disabled.
#[derive(Debug, Clone)]
pub struct ScoringNetwork {
    units: Vec<LayerUnit>,
    num_features: usize,
    training: bool,
}

impl ScoringNetwork {
    /// Build the layer chain described by the configuration.
    pub fn build(config: &ModelConfig) -> Result<Self> {
        config.validate()?;

        let mut units = Vec::new();
        let mut in_width = config.num_features;
        for &out_width in &config.hidden_layers {
            units.push(LayerUnit::Linear(Linear::new(in_width, out_width)));
            if config.use_batch_norm {
                units.push(LayerUnit::BatchNorm(BatchNorm::new(out_width)));
            }
            units.push(LayerUnit::Activation(config.activation));
            units.push(LayerUnit::Dropout(Dropout {
                rate: config.dropout_rate,
            }));
            in_width = out_width;
        }
        // Final projection to one raw logit, no activation.
        units.push(LayerUnit::Linear(Linear::new(in_width, 1)));

        Ok(Self {
            units,
            num_features: config.num_features,
            training: true,
        })
    }

    /// Switch to evaluation mode: dropout becomes identity and batch
    /// normalization uses running statistics.
    pub fn set_eval(&mut self) {
        self.training = false;
    }

    pub fn is_training(&self) -> bool {
        self.training
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn units(&self) -> &[LayerUnit] {
        &self.units
    }

    pub(crate) fn units_mut(&mut self) -> &mut [LayerUnit] {
        &mut self.units
    }

    /// Forward pass over a batch of shape (batch, num_features); returns raw
    /// logits of shape (batch, 1).
    pub fn forward(&self, input: &Array2<f32>) -> Result<Array2<f32>> {
        if input.ncols() != self.num_features {
            return Err(ScoringError::MalformedInput(format!(
                "input has {} features, network expects {}",
                input.ncols(),
                self.num_features
            )));
        }

        let mut current = input.clone();
        for unit in &self.units {
            current = match unit {
                LayerUnit::Linear(linear) => linear.forward(&current),
                LayerUnit::BatchNorm(norm) => norm.forward(&current, self.training),
                LayerUnit::Activation(activation) => current.mapv(|x| activation.apply(x)),
                LayerUnit::Dropout(dropout) => dropout.forward(&current, self.training),
            };
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> ModelConfig {
        ModelConfig {
            num_features: 25,
            hidden_layers: vec![128, 64],
            dropout_rate: 0.2,
            use_batch_norm: true,
            activation: Activation::ReLU,
        }
    }

    fn random_batch(rows: usize, cols: usize) -> Array2<f32> {
        let mut rng = rand::thread_rng();
        Array2::from_shape_fn((rows, cols), |_| rng.gen::<f32>() * 2.0 - 1.0)
    }

    #[test]
    fn test_unit_count_with_batch_norm() {
        let network = ScoringNetwork::build(&base_config()).unwrap();
        // (Linear, BatchNorm, Activation, Dropout) per hidden block plus the
        // final Linear: 4k + 1.
        assert_eq!(network.units().len(), 9);
    }

    #[test]
    fn test_unit_count_without_batch_norm() {
        let config = ModelConfig {
            use_batch_norm: false,
            ..base_config()
        };
        let network = ScoringNetwork::build(&config).unwrap();
        assert_eq!(network.units().len(), 7);
    }

    #[test]
    fn test_block_structure_and_widths() {
        let network = ScoringNetwork::build(&base_config()).unwrap();
        let units = network.units();

        match &units[0] {
            LayerUnit::Linear(l) => {
                assert_eq!(l.in_width(), 25);
                assert_eq!(l.out_width(), 128);
            }
            other => panic!("expected Linear, got {:?}", other),
        }
        assert!(matches!(&units[1], LayerUnit::BatchNorm(n) if n.width() == 128));
        assert!(matches!(&units[2], LayerUnit::Activation(Activation::ReLU)));
        assert!(matches!(&units[3], LayerUnit::Dropout(d) if d.rate == 0.2));

        match &units[4] {
            LayerUnit::Linear(l) => {
                assert_eq!(l.in_width(), 128);
                assert_eq!(l.out_width(), 64);
            }
            other => panic!("expected Linear, got {:?}", other),
        }

        match units.last().unwrap() {
            LayerUnit::Linear(l) => {
                assert_eq!(l.in_width(), 64);
                assert_eq!(l.out_width(), 1);
            }
            other => panic!("expected Linear, got {:?}", other),
        }
    }

    #[test]
    fn test_topology_is_a_chain() {
        let config = ModelConfig {
            num_features: 7,
            hidden_layers: vec![16, 8, 4],
            dropout_rate: 0.1,
            use_batch_norm: true,
            activation: Activation::Tanh,
        };
        let network = ScoringNetwork::build(&config).unwrap();

        let mut width = config.num_features;
        for unit in network.units() {
            match unit {
                LayerUnit::Linear(l) => {
                    assert_eq!(l.in_width(), width);
                    width = l.out_width();
                }
                LayerUnit::BatchNorm(n) => assert_eq!(n.width(), width),
                _ => {}
            }
        }
        assert_eq!(width, 1);
    }

    #[test]
    fn test_forward_output_shape() {
        let mut network = ScoringNetwork::build(&base_config()).unwrap();
        network.set_eval();

        let batch = random_batch(10, 25);
        let output = network.forward(&batch).unwrap();
        assert_eq!(output.dim(), (10, 1));
    }

    #[test]
    fn test_eval_forward_is_deterministic() {
        let mut network = ScoringNetwork::build(&base_config()).unwrap();
        network.set_eval();

        let batch = random_batch(6, 25);
        let first = network.forward(&batch).unwrap();
        let second = network.forward(&batch).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_train_dropout_is_stochastic() {
        let config = ModelConfig {
            num_features: 25,
            hidden_layers: vec![128],
            dropout_rate: 0.5,
            use_batch_norm: false,
            activation: Activation::ReLU,
        };
        let network = ScoringNetwork::build(&config).unwrap();
        assert!(network.is_training());

        let batch = random_batch(8, 25);
        let first = network.forward(&batch).unwrap();
        let second = network.forward(&batch).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_batch_norm_modes() {
        let norm = BatchNorm::new(2);
        let input = ndarray::arr2(&[[1.0_f32, 10.0], [3.0, 30.0]]);

        // Eval mode uses the stored running stats (mean 0, var 1), which
        // leaves this input essentially unchanged.
        let eval_out = norm.forward(&input, false);
        for (a, b) in eval_out.iter().zip(input.iter()) {
            assert!((a - b).abs() < 1e-3);
        }

        // Training mode normalizes with batch statistics: column means go
        // to zero.
        let train_out = norm.forward(&input, true);
        let means = train_out.mean_axis(Axis(0)).unwrap();
        for m in means.iter() {
            assert!(m.abs() < 1e-5);
        }
    }

    #[test]
    fn test_forward_rejects_wrong_input_width() {
        let mut network = ScoringNetwork::build(&base_config()).unwrap();
        network.set_eval();

        let batch = random_batch(2, 7);
        assert!(matches!(
            network.forward(&batch),
            Err(ScoringError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_invalid_configs_fail_fast() {
        let no_hidden = ModelConfig {
            hidden_layers: vec![],
            ..base_config()
        };
        assert!(matches!(
            ScoringNetwork::build(&no_hidden),
            Err(ScoringError::InvalidConfig(_))
        ));

        let no_features = ModelConfig {
            num_features: 0,
            ..base_config()
        };
        assert!(ScoringNetwork::build(&no_features).is_err());

        let zero_width = ModelConfig {
            hidden_layers: vec![64, 0],
            ..base_config()
        };
        assert!(ScoringNetwork::build(&zero_width).is_err());

        let bad_dropout = ModelConfig {
            dropout_rate: 1.0,
            ..base_config()
        };
        assert!(ScoringNetwork::build(&bad_dropout).is_err());
    }

    #[test]
    fn test_activation_functions() {
        assert_eq!(Activation::ReLU.apply(-2.0), 0.0);
        assert_eq!(Activation::ReLU.apply(3.0), 3.0);
        assert!((Activation::Sigmoid.apply(0.0) - 0.5).abs() < 1e-6);
        assert!(Activation::Tanh.apply(0.0).abs() < 1e-6);
    }
}
