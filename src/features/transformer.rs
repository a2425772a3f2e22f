//! Feature preprocessing for credit risk model inference.
//!
//! The transformer is fitted once offline (see `tools/fit_transformer`) and
//! loaded as a read-only artifact by the predictor at startup. Its output
//! column order is a hard contract with the configured network input width.

use crate::error::{Result, ScoringError};
use crate::types::ApplicantRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

/// Numeric dataset columns, in output order.
pub const NUMERIC_COLUMNS: [&str; 4] = ["Age", "Job", "Credit amount", "Duration"];

/// Categorical dataset columns, in output order after the numeric block.
pub const CATEGORICAL_COLUMNS: [&str; 5] = [
    "Sex",
    "Housing",
    "Saving accounts",
    "Checking account",
    "Purpose",
];

/// Target column, excluded from the feature matrix.
pub const TARGET_COLUMN: &str = "Risk";

/// Map a target value to its training label (bad = 0, good = 1).
pub fn map_target(value: &str) -> Option<u8> {
    match value {
        "bad" => Some(0),
        "good" => Some(1),
        _ => None,
    }
}

/// Scaling parameters for one numeric column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnScaler {
    pub column: String,
    pub mean: f64,
    pub scale: f64,
}

/// One-hot vocabulary for one categorical column.
///
/// Categories are sorted at fit time; values outside the vocabulary encode
/// as an all-zero block at transform time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnVocabulary {
    pub column: String,
    pub categories: Vec<String>,
}

/// Fitted feature transformer: standard scaling over numeric columns plus
/// unknown-tolerant one-hot encoding over categorical columns.
///
/// Stateless at inference; the only mutation happens at fit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedTransformer {
    numeric: Vec<ColumnScaler>,
    categorical: Vec<ColumnVocabulary>,
    pub fitted_at: DateTime<Utc>,
}

impl FittedTransformer {
    /// Fit scaling parameters and category vocabularies on a training set.
    pub fn fit(records: &[ApplicantRecord]) -> Result<Self> {
        if records.is_empty() {
            return Err(ScoringError::InvalidConfig(
                "cannot fit transformer on an empty dataset".to_string(),
            ));
        }

        let n = records.len() as f64;
        let mut numeric = Vec::with_capacity(NUMERIC_COLUMNS.len());
        for (idx, column) in NUMERIC_COLUMNS.iter().enumerate() {
            let values: Vec<f64> = records.iter().map(|r| r.numeric_values()[idx]).collect();
            let mean = values.iter().sum::<f64>() / n;
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std_dev = variance.sqrt();
            // A constant column scales by 1.0 so transform stays finite.
            let scale = if std_dev > 0.0 { std_dev } else { 1.0 };
            numeric.push(ColumnScaler {
                column: column.to_string(),
                mean,
                scale,
            });
        }

        let mut categorical = Vec::with_capacity(CATEGORICAL_COLUMNS.len());
        for (idx, column) in CATEGORICAL_COLUMNS.iter().enumerate() {
            let distinct: BTreeSet<String> = records
                .iter()
                .map(|r| r.categorical_values()[idx].to_string())
                .collect();
            categorical.push(ColumnVocabulary {
                column: column.to_string(),
                categories: distinct.into_iter().collect(),
            });
        }

        Ok(Self {
            numeric,
            categorical,
            fitted_at: Utc::now(),
        })
    }

    /// Transform one record into the fixed-length feature vector.
    ///
    /// Numeric columns are standardized; categorical values one-hot encode
    /// into their learned position. Unknown categories produce an all-zero
    /// block and never fail the request.
    pub fn transform(&self, record: &ApplicantRecord) -> Result<Vec<f32>> {
        let mut features = Vec::with_capacity(self.feature_count());

        let raw = record.numeric_values();
        for (scaler, value) in self.numeric.iter().zip(raw.iter()) {
            if !value.is_finite() {
                return Err(ScoringError::MalformedInput(format!(
                    "column '{}' is not a finite number",
                    scaler.column
                )));
            }
            features.push(((value - scaler.mean) / scaler.scale) as f32);
        }

        let categories = record.categorical_values();
        for (vocab, value) in self.categorical.iter().zip(categories.iter()) {
            let hit = vocab.categories.iter().position(|c| c == value);
            for position in 0..vocab.categories.len() {
                features.push(if hit == Some(position) { 1.0 } else { 0.0 });
            }
        }

        Ok(features)
    }

    /// Number of output features (numeric columns + one-hot positions).
    pub fn feature_count(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|v| v.categories.len())
                .sum::<usize>()
    }

    /// Output feature names in column order.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.numeric.iter().map(|s| s.column.clone()).collect();
        for vocab in &self.categorical {
            for category in &vocab.categories {
                names.push(format!("{}_{}", vocab.column, category));
            }
        }
        names
    }

    /// Serialize the fitted transformer to a JSON artifact.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path).map_err(|e| ScoringError::ArtifactCorrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self).map_err(|e| ScoringError::ArtifactCorrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        info!(path = %path.display(), features = self.feature_count(), "Transformer artifact written");
        Ok(())
    }

    /// Load a fitted transformer from a JSON artifact.
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScoringError::ArtifactNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ScoringError::ArtifactCorrupt {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }
            }
        })?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| ScoringError::ArtifactCorrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        age: i64,
        credit_amount: f64,
        sex: &str,
        housing: &str,
        purpose: &str,
    ) -> ApplicantRecord {
        ApplicantRecord {
            age,
            job: 2,
            credit_amount,
            duration: 12,
            sex: sex.to_string(),
            housing: housing.to_string(),
            saving_accounts: "little".to_string(),
            checking_account: "moderate".to_string(),
            purpose: purpose.to_string(),
        }
    }

    fn training_set() -> Vec<ApplicantRecord> {
        vec![
            record(20, 1000.0, "male", "own", "car"),
            record(30, 2000.0, "female", "rent", "education"),
            record(40, 3000.0, "male", "own", "car"),
        ]
    }

    #[test]
    fn test_fit_rejects_empty_dataset() {
        assert!(FittedTransformer::fit(&[]).is_err());
    }

    #[test]
    fn test_feature_count_and_names() {
        let transformer = FittedTransformer::fit(&training_set()).unwrap();

        // 4 numeric + Sex{female,male} + Housing{own,rent} + 1 saving
        // + 1 checking + Purpose{car,education}
        assert_eq!(transformer.feature_count(), 12);

        let names = transformer.feature_names();
        assert_eq!(names.len(), 12);
        assert_eq!(names[0], "Age");
        assert!(names.contains(&"Sex_female".to_string()));
        assert!(names.contains(&"Purpose_education".to_string()));
    }

    #[test]
    fn test_numeric_standardization() {
        let transformer = FittedTransformer::fit(&training_set()).unwrap();
        let features = transformer.transform(&record(30, 2000.0, "male", "own", "car")).unwrap();

        // Age 30 and amount 2000 are the fit-set means, so they scale to 0.
        assert!(features[0].abs() < 1e-6);
        assert!(features[2].abs() < 1e-6);
    }

    #[test]
    fn test_constant_column_scales_by_one() {
        let transformer = FittedTransformer::fit(&training_set()).unwrap();
        // Duration is 12 in every training record; mean 12, scale 1.0.
        let features = transformer.transform(&record(30, 2000.0, "male", "own", "car")).unwrap();
        assert!((features[3] - 0.0).abs() < 1e-6);

        let shifted = transformer.transform(&ApplicantRecord {
            duration: 15,
            ..record(30, 2000.0, "male", "own", "car")
        });
        assert!((shifted.unwrap()[3] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_one_hot_position() {
        let transformer = FittedTransformer::fit(&training_set()).unwrap();
        let features = transformer.transform(&record(25, 1500.0, "female", "rent", "car")).unwrap();

        // Sorted vocabulary: Sex = [female, male] directly after the 4
        // numeric columns.
        assert_eq!(features[4], 1.0);
        assert_eq!(features[5], 0.0);
    }

    #[test]
    fn test_unknown_category_encodes_as_zeros() {
        let transformer = FittedTransformer::fit(&training_set()).unwrap();
        let features = transformer
            .transform(&record(25, 1500.0, "male", "houseboat", "car"))
            .unwrap();

        // Housing block is all zero for the unseen value.
        assert_eq!(features[6], 0.0);
        assert_eq!(features[7], 0.0);
        // The rest of the vector is unaffected.
        assert_eq!(features.len(), transformer.feature_count());
    }

    #[test]
    fn test_non_finite_numeric_is_malformed_input() {
        let transformer = FittedTransformer::fit(&training_set()).unwrap();
        let result = transformer.transform(&record(25, f64::NAN, "male", "own", "car"));
        assert!(matches!(result, Err(ScoringError::MalformedInput(_))));
    }

    #[test]
    fn test_save_load_round_trip() {
        let transformer = FittedTransformer::fit(&training_set()).unwrap();
        let path = std::env::temp_dir().join(format!(
            "credit_transformer_test_{}.json",
            std::process::id()
        ));

        transformer.save(&path).unwrap();
        let loaded = FittedTransformer::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.feature_count(), transformer.feature_count());
        assert_eq!(loaded.feature_names(), transformer.feature_names());

        let record = record(25, 1500.0, "female", "own", "education");
        assert_eq!(
            loaded.transform(&record).unwrap(),
            transformer.transform(&record).unwrap()
        );
    }

    #[test]
    fn test_load_missing_artifact() {
        let result = FittedTransformer::load(Path::new("/nonexistent/transformer.json"));
        assert!(matches!(result, Err(ScoringError::ArtifactNotFound { .. })));
    }

    #[test]
    fn test_target_mapping() {
        assert_eq!(map_target("bad"), Some(0));
        assert_eq!(map_target("good"), Some(1));
        assert_eq!(map_target("unknown"), None);
    }
}
