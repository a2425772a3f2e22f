//! Model construction, weight loading, and inference components

pub mod loader;
pub mod network;
pub mod predictor;

pub use loader::WeightState;
pub use network::{Activation, ModelConfig, ScoringNetwork};
pub use predictor::Predictor;
