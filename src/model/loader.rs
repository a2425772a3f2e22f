//! Weight artifact loading.
//!
//! Trained parameters are persisted independently of the architecture
//! configuration as a named tensor map. Loading applies each tensor into a
//! freshly constructed network and fails on any shape disagreement, so a
//! mismatched config/weights pair can never serve traffic.

use crate::error::{Result, ScoringError};
use crate::model::network::{LayerUnit, ScoringNetwork};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::info;

/// One persisted tensor: row-major data with its shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TensorData {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

/// Named tensor map persisted as the weight artifact.
///
/// Keys: `linear{i}.weight` / `linear{i}.bias` for hidden layers,
/// `norm{i}.gamma` / `.beta` / `.running_mean` / `.running_var` for batch
/// norm units, and `output.weight` / `output.bias` for the final projection.
/// Linear weights use shape (out, in).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeightState {
    pub tensors: BTreeMap<String, TensorData>,
}

impl WeightState {
    /// Load a weight artifact from a JSON file.
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
        let state: WeightState =
            serde_json::from_reader(reader).map_err(|e| ScoringError::ArtifactCorrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        info!(
            path = %path.display(),
            tensors = state.tensors.len(),
            "Weight artifact loaded"
        );
        Ok(state)
    }

    /// Serialize the weight state to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path).map_err(|e| ScoringError::ArtifactCorrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self).map_err(|e| ScoringError::ArtifactCorrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Snapshot a network's parameters into a weight state.
    pub fn from_network(network: &ScoringNetwork) -> Self {
        let mut tensors = BTreeMap::new();
        let total_linears = count_linears(network.units());
        let mut linear_idx = 0;
        let mut norm_idx = 0;

        for unit in network.units() {
            match unit {
                LayerUnit::Linear(linear) => {
                    let prefix = linear_prefix(linear_idx, total_linears);
                    tensors.insert(format!("{prefix}.weight"), tensor2(&linear.weight));
                    tensors.insert(format!("{prefix}.bias"), tensor1(&linear.bias));
                    linear_idx += 1;
                }
                LayerUnit::BatchNorm(norm) => {
                    tensors.insert(format!("norm{norm_idx}.gamma"), tensor1(&norm.gamma));
                    tensors.insert(format!("norm{norm_idx}.beta"), tensor1(&norm.beta));
                    tensors.insert(
                        format!("norm{norm_idx}.running_mean"),
                        tensor1(&norm.running_mean),
                    );
                    tensors.insert(
                        format!("norm{norm_idx}.running_var"),
                        tensor1(&norm.running_var),
                    );
                    norm_idx += 1;
                }
                _ => {}
            }
        }

        Self { tensors }
    }

    /// Apply every tensor into the constructed network, validating shapes.
    ///
    /// Every network parameter must be present and every persisted tensor
    /// must be consumed; anything else is an architecture mismatch.
    pub fn apply(&self, network: &mut ScoringNetwork) -> Result<()> {
        let total_linears = count_linears(network.units());
        let mut consumed: BTreeSet<String> = BTreeSet::new();
        let mut linear_idx = 0;
        let mut norm_idx = 0;

        for unit in network.units_mut() {
            match unit {
                LayerUnit::Linear(linear) => {
                    let prefix = linear_prefix(linear_idx, total_linears);
                    let shape = (linear.out_width(), linear.in_width());
                    linear.weight =
                        self.take2(&format!("{prefix}.weight"), shape, &mut consumed)?;
                    linear.bias = self.take1(&format!("{prefix}.bias"), shape.0, &mut consumed)?;
                    linear_idx += 1;
                }
                LayerUnit::BatchNorm(norm) => {
                    let width = norm.width();
                    norm.gamma = self.take1(&format!("norm{norm_idx}.gamma"), width, &mut consumed)?;
                    norm.beta = self.take1(&format!("norm{norm_idx}.beta"), width, &mut consumed)?;
                    norm.running_mean =
                        self.take1(&format!("norm{norm_idx}.running_mean"), width, &mut consumed)?;
                    norm.running_var =
                        self.take1(&format!("norm{norm_idx}.running_var"), width, &mut consumed)?;
                    norm_idx += 1;
                }
                _ => {}
            }
        }

        if let Some(extra) = self.tensors.keys().find(|k| !consumed.contains(*k)) {
            return Err(ScoringError::ArchitectureMismatch(format!(
                "weight artifact contains tensor '{extra}' with no place in the configured topology"
            )));
        }

        Ok(())
    }

    fn take2(
        &self,
        name: &str,
        expected: (usize, usize),
        consumed: &mut BTreeSet<String>,
    ) -> Result<Array2<f32>> {
        let tensor = self.get(name)?;
        if tensor.shape != [expected.0, expected.1]
            || tensor.data.len() != expected.0 * expected.1
        {
            return Err(shape_mismatch(name, &[expected.0, expected.1], &tensor.shape));
        }
        consumed.insert(name.to_string());
        Array2::from_shape_vec(expected, tensor.data.clone()).map_err(|e| {
            ScoringError::ArchitectureMismatch(format!("tensor '{name}': {e}"))
        })
    }

    fn take1(
        &self,
        name: &str,
        expected: usize,
        consumed: &mut BTreeSet<String>,
    ) -> Result<Array1<f32>> {
        let tensor = self.get(name)?;
        if tensor.shape != [expected] || tensor.data.len() != expected {
            return Err(shape_mismatch(name, &[expected], &tensor.shape));
        }
        consumed.insert(name.to_string());
        Ok(Array1::from_vec(tensor.data.clone()))
    }

    fn get(&self, name: &str) -> Result<&TensorData> {
        self.tensors.get(name).ok_or_else(|| {
            ScoringError::ArchitectureMismatch(format!(
                "weight artifact is missing tensor '{name}'"
            ))
        })
    }
}

fn count_linears(units: &[LayerUnit]) -> usize {
    units
        .iter()
        .filter(|u| matches!(u, LayerUnit::Linear(_)))
        .count()
}

fn linear_prefix(index: usize, total: usize) -> String {
    if index + 1 == total {
        "output".to_string()
    } else {
        format!("linear{index}")
    }
}

fn shape_mismatch(name: &str, expected: &[usize], actual: &[usize]) -> ScoringError {
    ScoringError::ArchitectureMismatch(format!(
        "tensor '{name}' has shape {actual:?}, expected {expected:?}"
    ))
}

fn tensor2(array: &Array2<f32>) -> TensorData {
    TensorData {
        shape: vec![array.nrows(), array.ncols()],
        data: array.iter().copied().collect(),
    }
}

fn tensor1(array: &Array1<f32>) -> TensorData {
    TensorData {
        shape: vec![array.len()],
        data: array.to_vec(),
    }
}
