//! Data structures shared by the loader, encoders, models, and reports.
//!
//! `FeatureSchema` is the named column layout of a table. It is built once
//! when a table is read and carried alongside the values, so downstream
//! stages address columns by position and compare schemas instead of
//! looking columns up by name.
use ndarray::{Array2, ArrayView1};

use crate::error::{Result, StemError};

/// Whether a table is used to fit encoders and the model, or only scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableRole {
    Training,
    Scoring,
}

/// Names of the non-feature columns in a sample table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumns {
    /// Target label column. Required for the training table.
    pub label_column: String,
    /// Optional sample identifier column. When `None`, identifiers are
    /// synthesized as `sample_<row>`.
    pub sample_column: Option<String>,
}

impl TableColumns {
    pub fn new(label_column: impl Into<String>, sample_column: Option<String>) -> Self {
        Self {
            label_column: label_column.into(),
            sample_column,
        }
    }
}

/// Ordered feature column names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name(&self, idx: usize) -> &str {
        &self.names[idx]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Fail unless `other` has the same columns in the same order.
    pub fn ensure_matches(&self, other: &FeatureSchema) -> Result<()> {
        if self.names != other.names {
            return Err(StemError::SchemaMismatch {
                expected: self.names.clone(),
                found: other.names.clone(),
            });
        }
        Ok(())
    }
}

/// A loaded sample table before feature encoding.
///
/// Feature values are kept as raw strings, column-major, one entry per
/// schema column. Labels, when present, are already encoded.
#[derive(Debug, Clone)]
pub struct SampleTable {
    /// File name used in error and log messages.
    pub source: String,
    pub sample_ids: Vec<String>,
    pub schema: FeatureSchema,
    pub columns: Vec<Vec<String>>,
    pub labels: Option<Vec<usize>>,
}

impl SampleTable {
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    pub fn n_features(&self) -> usize {
        self.schema.len()
    }

    pub fn column(&self, idx: usize) -> &[String] {
        &self.columns[idx]
    }

    pub fn has_labels(&self) -> bool {
        self.labels.is_some()
    }
}

/// Numeric feature matrix (rows = samples) tagged with its column schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    schema: FeatureSchema,
    values: Array2<f64>,
}

impl FeatureMatrix {
    pub fn new(schema: FeatureSchema, values: Array2<f64>) -> Result<Self> {
        if values.ncols() != schema.len() {
            return Err(StemError::LengthMismatch {
                expected: schema.len(),
                found: values.ncols(),
            });
        }
        Ok(Self { schema, values })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn row(&self, idx: usize) -> ArrayView1<'_, f64> {
        self.values.row(idx)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[[row, col]]
    }
}
