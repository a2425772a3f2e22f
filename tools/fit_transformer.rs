//! Transformer Fitting Tool
//!
//! Fits the feature preprocessing artifact on a labeled German Credit CSV
//! and writes it to disk. Run once offline per model version; the serving
//! process loads the resulting artifact at startup.
//!
//! Usage: fit-transformer <dataset.csv> <output.json>

use anyhow::{bail, Context, Result};
use credit_scoring_service::features::transformer::{
    map_target, CATEGORICAL_COLUMNS, NUMERIC_COLUMNS, TARGET_COLUMN,
};
use credit_scoring_service::features::FittedTransformer;
use credit_scoring_service::types::ApplicantRecord;
use std::path::PathBuf;
use tracing::{info, warn};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let (input, output) = match (args.next(), args.next()) {
        (Some(input), Some(output)) => (PathBuf::from(input), PathBuf::from(output)),
        _ => bail!("usage: fit-transformer <dataset.csv> <output.json>"),
    };

    let text = std::fs::read_to_string(&input)
        .with_context(|| format!("failed to read dataset from {}", input.display()))?;
    let (records, labels) = parse_dataset(&text)?;

    let good = labels.iter().filter(|&&l| l == 1).count();
    info!(
        rows = records.len(),
        good,
        bad = records.len() - good,
        "Dataset parsed"
    );

    let transformer = FittedTransformer::fit(&records)?;
    transformer.save(&output)?;
    info!(
        features = transformer.feature_count(),
        path = %output.display(),
        "Transformer fitted"
    );

    Ok(())
}

/// Parse the labeled dataset into applicant records and training labels
/// (bad = 0, good = 1). Rows with an unmappable target are skipped.
fn parse_dataset(text: &str) -> Result<(Vec<ApplicantRecord>, Vec<u8>)> {
    let mut lines = text.lines();
    let header = lines.next().context("dataset is empty")?;
    let columns = parse_row(header);

    let mut numeric_idx = Vec::with_capacity(NUMERIC_COLUMNS.len());
    for name in NUMERIC_COLUMNS {
        numeric_idx.push(find_column(&columns, name)?);
    }
    let mut categorical_idx = Vec::with_capacity(CATEGORICAL_COLUMNS.len());
    for name in CATEGORICAL_COLUMNS {
        categorical_idx.push(find_column(&columns, name)?);
    }
    let target_idx = find_column(&columns, TARGET_COLUMN)?;

    let mut records = Vec::new();
    let mut labels = Vec::new();
    for (row_num, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let cells = parse_row(line);
        if cells.len() != columns.len() {
            bail!(
                "row {}: expected {} columns, got {}",
                row_num + 2,
                columns.len(),
                cells.len()
            );
        }

        let label = match map_target(cells[target_idx].trim()) {
            Some(label) => label,
            None => {
                warn!(
                    row = row_num + 2,
                    value = %cells[target_idx],
                    "Skipping row with unmappable target"
                );
                continue;
            }
        };

        let numeric: Vec<f64> = numeric_idx
            .iter()
            .map(|&i| {
                cells[i].trim().parse::<f64>().with_context(|| {
                    format!("row {}: '{}' is not a number", row_num + 2, cells[i])
                })
            })
            .collect::<Result<_>>()?;

        records.push(ApplicantRecord {
            age: numeric[0] as i64,
            job: numeric[1] as i64,
            credit_amount: numeric[2],
            duration: numeric[3] as i64,
            sex: cells[categorical_idx[0]].trim().to_string(),
            housing: cells[categorical_idx[1]].trim().to_string(),
            saving_accounts: cells[categorical_idx[2]].trim().to_string(),
            checking_account: cells[categorical_idx[3]].trim().to_string(),
            purpose: cells[categorical_idx[4]].trim().to_string(),
        });
        labels.push(label);
    }

    if records.is_empty() {
        bail!("dataset contains no usable rows");
    }
    Ok((records, labels))
}

fn find_column(columns: &[String], name: &str) -> Result<usize> {
    columns
        .iter()
        .position(|c| c.trim() == name)
        .with_context(|| format!("dataset is missing column '{name}'"))
}

/// Parses a single CSV row, handling double-quoted fields.
fn parse_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    // Escaped quote inside a quoted field.
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                fields.push(current.clone());
                current.clear();
            }
            c => current.push(c),
        }
    }
    fields.push(current);
    fields
}
