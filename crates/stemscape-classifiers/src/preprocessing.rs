//! Label and feature encoders.
//!
//! Both encoders are fit once on the training table and then only applied
//! to later tables. A value that was not seen during fitting is an error
//! rather than a freshly assigned code, so the same literal always maps to
//! the same integer in every matrix the model sees.
use std::collections::BTreeSet;

use ndarray::Array2;

use crate::data_handling::{FeatureMatrix, FeatureSchema, SampleTable};
use crate::error::{Result, StemError};

/// Maps label strings to `0..n_classes`, classes sorted lexicographically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn the class vocabulary from `values` and encode them.
    pub fn fit_transform(&mut self, values: &[String]) -> Vec<usize> {
        let unique: BTreeSet<&str> = values.iter().map(String::as_str).collect();
        self.classes = unique.into_iter().map(str::to_string).collect();
        values
            .iter()
            .map(|v| self.code_of(v).unwrap_or_default())
            .collect()
    }

    /// Encode `values` with the fitted vocabulary.
    pub fn transform(&self, values: &[String]) -> Result<Vec<usize>> {
        values
            .iter()
            .map(|v| {
                self.code_of(v)
                    .ok_or_else(|| StemError::UnseenLabel { value: v.clone() })
            })
            .collect()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    fn code_of(&self, value: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
    }
}

/// How a single feature column is turned into numbers.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnEncoding {
    /// Values are parsed as `f64` and passed through.
    Numeric,
    /// Values are replaced by their index in the sorted training categories.
    Categorical { categories: Vec<String> },
}

impl ColumnEncoding {
    pub fn is_categorical(&self) -> bool {
        matches!(self, ColumnEncoding::Categorical { .. })
    }
}

/// Per-column feature encoding fit on the training table.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureEncoder {
    schema: FeatureSchema,
    encodings: Vec<ColumnEncoding>,
}

impl FeatureEncoder {
    /// Decide the kind of every column and learn categorical vocabularies.
    ///
    /// A column is numeric when every non-empty value parses as a finite
    /// number and at least one value is non-empty.
    pub fn fit(table: &SampleTable) -> Self {
        let encodings = table
            .columns
            .iter()
            .map(|values| {
                if is_numeric_column(values) {
                    ColumnEncoding::Numeric
                } else {
                    let unique: BTreeSet<&str> = values.iter().map(String::as_str).collect();
                    ColumnEncoding::Categorical {
                        categories: unique.into_iter().map(str::to_string).collect(),
                    }
                }
            })
            .collect();

        Self {
            schema: table.schema.clone(),
            encodings,
        }
    }

    /// Encode `table` into a numeric matrix using the fitted encodings.
    pub fn transform(&self, table: &SampleTable) -> Result<FeatureMatrix> {
        self.schema.ensure_matches(&table.schema)?;

        let nrows = table.n_samples();
        let ncols = self.schema.len();
        let mut values = Array2::<f64>::zeros((nrows, ncols));

        for (col, encoding) in self.encodings.iter().enumerate() {
            let name = self.schema.name(col);
            for (row, raw) in table.column(col).iter().enumerate() {
                values[[row, col]] = match encoding {
                    ColumnEncoding::Numeric => parse_numeric(name, row, raw)?,
                    ColumnEncoding::Categorical { categories } => categories
                        .binary_search_by(|c| c.as_str().cmp(raw.as_str()))
                        .map(|code| code as f64)
                        .map_err(|_| StemError::UnseenCategory {
                            column: name.to_string(),
                            value: raw.clone(),
                        })?,
                };
            }
        }

        FeatureMatrix::new(self.schema.clone(), values)
    }

    pub fn fit_transform(table: &SampleTable) -> Result<(Self, FeatureMatrix)> {
        let encoder = Self::fit(table);
        let matrix = encoder.transform(table)?;
        Ok((encoder, matrix))
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn encodings(&self) -> &[ColumnEncoding] {
        &self.encodings
    }

    pub fn n_categorical(&self) -> usize {
        self.encodings.iter().filter(|e| e.is_categorical()).count()
    }
}

fn is_numeric_column(values: &[String]) -> bool {
    let mut seen_value = false;
    for v in values {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            continue;
        }
        match trimmed.parse::<f64>() {
            Ok(x) if x.is_finite() => seen_value = true,
            _ => return false,
        }
    }
    seen_value
}

fn parse_numeric(column: &str, row: usize, raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StemError::MissingValue {
            column: column.to_string(),
            row: row + 1,
        });
    }
    match trimmed.parse::<f64>() {
        Ok(x) if x.is_finite() => Ok(x),
        _ => Err(StemError::InvalidValue {
            column: column.to_string(),
            row: row + 1,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn table(columns: Vec<(&str, Vec<&str>)>) -> SampleTable {
        let n = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        SampleTable {
            source: "test.tsv".to_string(),
            sample_ids: (0..n).map(|i| format!("sample_{}", i)).collect(),
            schema: FeatureSchema::new(columns.iter().map(|(n, _)| n.to_string()).collect()),
            columns: columns.into_iter().map(|(_, v)| strings(&v)).collect(),
            labels: None,
        }
    }

    #[test]
    fn label_encoder_sorts_classes() {
        let mut le = LabelEncoder::new();
        let codes = le.fit_transform(&strings(&["yes", "no", "yes", "no"]));
        assert_eq!(le.classes(), &["no".to_string(), "yes".to_string()]);
        assert_eq!(codes, vec![1, 0, 1, 0]);
        assert_eq!(le.transform(&strings(&["no", "yes"])).unwrap(), vec![0, 1]);
    }

    #[test]
    fn label_encoder_rejects_unseen_value() {
        let mut le = LabelEncoder::new();
        le.fit_transform(&strings(&["yes", "no"]));
        match le.transform(&strings(&["maybe"])) {
            Err(StemError::UnseenLabel { value }) => assert_eq!(value, "maybe"),
            other => panic!("expected unseen label, got {:?}", other),
        }
    }

    #[test]
    fn numeric_columns_pass_through() {
        let t = table(vec![("age", vec!["1.5", "2", " 3 "])]);
        let (enc, m) = FeatureEncoder::fit_transform(&t).unwrap();
        assert_eq!(enc.encodings()[0], ColumnEncoding::Numeric);
        assert_eq!(m.values().column(0).to_vec(), vec![1.5, 2.0, 3.0]);
    }

    #[test]
    fn categorical_codes_are_distinct_and_reused() {
        let train = table(vec![("grade", vec!["B", "A", "C", "A"])]);
        let (enc, m) = FeatureEncoder::fit_transform(&train).unwrap();
        assert_eq!(enc.n_categorical(), 1);
        assert_eq!(m.values().column(0).to_vec(), vec![1.0, 0.0, 2.0, 0.0]);

        // scoring data sees only a subset, in another order, and keeps the codes
        let test = table(vec![("grade", vec!["C", "B"])]);
        let m = enc.transform(&test).unwrap();
        assert_eq!(m.values().column(0).to_vec(), vec![2.0, 1.0]);
    }

    #[test]
    fn unseen_category_is_an_error() {
        let train = table(vec![("tissue", vec!["liver", "lung"])]);
        let enc = FeatureEncoder::fit(&train);
        let test = table(vec![("tissue", vec!["brain"])]);
        assert!(matches!(
            enc.transform(&test),
            Err(StemError::UnseenCategory { .. })
        ));
    }

    #[test]
    fn numeric_column_with_text_in_scoring_table_fails() {
        let enc = FeatureEncoder::fit(&table(vec![("age", vec!["1", "2"])]));
        assert!(matches!(
            enc.transform(&table(vec![("age", vec!["old"])])),
            Err(StemError::InvalidValue { row: 1, .. })
        ));
        assert!(matches!(
            enc.transform(&table(vec![("age", vec!["3", ""])])),
            Err(StemError::MissingValue { row: 2, .. })
        ));
    }

    #[test]
    fn mixed_column_is_categorical() {
        let enc = FeatureEncoder::fit(&table(vec![("x", vec!["1", "two"])]));
        assert!(enc.encodings()[0].is_categorical());
    }

    #[test]
    fn schema_change_is_rejected() {
        let enc = FeatureEncoder::fit(&table(vec![("a", vec!["1"]), ("b", vec!["2"])]));
        let swapped = table(vec![("b", vec!["2"]), ("a", vec!["1"])]);
        assert!(matches!(
            enc.transform(&swapped),
            Err(StemError::SchemaMismatch { .. })
        ));
    }
}
