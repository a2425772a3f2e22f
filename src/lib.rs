//! Credit Scoring Service Library
//!
//! Preprocesses tabular applicant data, runs it through a feed-forward
//! neural classifier, and serves credit risk predictions over HTTP.

pub mod config;
pub mod error;
pub mod features;
pub mod metrics;
pub mod model;
pub mod server;
pub mod types;

pub use config::AppConfig;
pub use error::ScoringError;
pub use features::FittedTransformer;
pub use model::{ModelConfig, Predictor, ScoringNetwork};
pub use types::{ApplicantRecord, PredictionResult, RiskLabel};
