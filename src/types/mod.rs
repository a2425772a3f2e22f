//! Type definitions for the credit scoring service

pub mod prediction;
pub mod record;

pub use prediction::{PredictionResult, RiskLabel};
pub use record::ApplicantRecord;
