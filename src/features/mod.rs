//! Feature preprocessing components

pub mod transformer;

pub use transformer::{FittedTransformer, CATEGORICAL_COLUMNS, NUMERIC_COLUMNS, TARGET_COLUMN};
