//! Tab-separated sample table reader.
use std::collections::HashSet;
use std::path::Path;

use csv::StringRecord;
use log::debug;

use crate::data_handling::{FeatureSchema, SampleTable, TableColumns, TableRole};
use crate::error::{Result, StemError};
use crate::preprocessing::LabelEncoder;

/// Read a TSV sample table and split identifiers, features, and labels.
///
/// In the [`TableRole::Training`] role the label column is required and
/// `label_encoder` is fit on it. In the [`TableRole::Scoring`] role the label
/// column is optional and, when present, encoded with the already fitted
/// `label_encoder`.
pub fn load_sample_table<P: AsRef<Path>>(
    path: P,
    columns: &TableColumns,
    role: TableRole,
    label_encoder: &mut LabelEncoder,
) -> Result<SampleTable> {
    let path = path.as_ref();
    let source = source_name(path);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    ensure_unique_headers(&headers, &source)?;

    let label_idx = find_column(&headers, &columns.label_column);
    if role == TableRole::Training && label_idx.is_none() {
        return Err(StemError::MissingLabelColumn {
            column: columns.label_column.clone(),
            file: source,
        });
    }

    let sample_idx = match &columns.sample_column {
        Some(name) => Some(find_column(&headers, name).ok_or_else(|| {
            StemError::MissingColumn {
                column: name.clone(),
                file: source.clone(),
            }
        })?),
        None => None,
    };

    let feature_indices: Vec<usize> = (0..headers.len())
        .filter(|&idx| Some(idx) != label_idx && Some(idx) != sample_idx)
        .collect();
    if feature_indices.is_empty() {
        return Err(StemError::EmptyTable { file: source });
    }

    let schema = FeatureSchema::new(
        feature_indices
            .iter()
            .map(|&idx| headers.get(idx).unwrap_or_default().to_string())
            .collect(),
    );

    let mut sample_ids = Vec::new();
    let mut raw_labels = Vec::new();
    let mut feature_columns: Vec<Vec<String>> = vec![Vec::new(); feature_indices.len()];

    for (row_idx, result) in reader.records().enumerate() {
        let record = result?;

        let sample_id = match sample_idx {
            Some(idx) => field(&record, idx).to_string(),
            None => format!("sample_{}", row_idx),
        };
        sample_ids.push(sample_id);

        if let Some(idx) = label_idx {
            raw_labels.push(field(&record, idx).to_string());
        }

        for (col, &idx) in feature_indices.iter().enumerate() {
            feature_columns[col].push(field(&record, idx).to_string());
        }
    }

    let labels = match (label_idx, role) {
        (None, _) => None,
        (Some(_), TableRole::Training) => Some(label_encoder.fit_transform(&raw_labels)),
        (Some(_), TableRole::Scoring) => Some(label_encoder.transform(&raw_labels)?),
    };

    debug!(
        "Loaded '{}': {} samples, {} features, labels {}",
        source,
        sample_ids.len(),
        schema.len(),
        if labels.is_some() { "present" } else { "absent" }
    );

    Ok(SampleTable {
        source,
        sample_ids,
        schema,
        columns: feature_columns,
        labels,
    })
}

/// Base file name of `path`, used to name tables in messages.
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|header| header == name)
}

fn ensure_unique_headers(headers: &StringRecord, source: &str) -> Result<()> {
    let mut seen = HashSet::with_capacity(headers.len());
    for header in headers.iter() {
        if !seen.insert(header) {
            return Err(StemError::DuplicateColumn {
                column: header.to_string(),
                file: source.to_string(),
            });
        }
    }
    Ok(())
}

fn field<'r>(record: &'r StringRecord, idx: usize) -> &'r str {
    record.get(idx).unwrap_or_default()
}
