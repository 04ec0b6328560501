use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::data_handling::FeatureSchema;
use crate::error::{Result, StemError};
use crate::report::format_float;

pub const FEATURE_IMPORTANCE_FILE: &str = "feature_importance_vs_shap.tsv";

/// Native forest importance next to the mean absolute attribution of a feature.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureImportanceRow {
    pub feature: String,
    pub rf_importance: f64,
    pub mean_abs_shap: f64,
}

/// Join per-feature importances and sort by native importance, descending.
///
/// Ties keep schema order.
pub fn build_importance_table(
    schema: &FeatureSchema,
    rf_importance: &[f64],
    mean_abs_shap: &[f64],
) -> Result<Vec<FeatureImportanceRow>> {
    for len in [rf_importance.len(), mean_abs_shap.len()] {
        if len != schema.len() {
            return Err(StemError::LengthMismatch {
                expected: schema.len(),
                found: len,
            });
        }
    }

    let mut rows: Vec<FeatureImportanceRow> = schema
        .names()
        .iter()
        .zip(rf_importance.iter().zip(mean_abs_shap))
        .map(|(name, (&rf, &shap))| FeatureImportanceRow {
            feature: name.clone(),
            rf_importance: rf,
            mean_abs_shap: shap,
        })
        .collect();
    rows.sort_by(|a, b| b.rf_importance.total_cmp(&a.rf_importance));
    Ok(rows)
}

pub fn write_importance_table<P: AsRef<Path>>(path: P, rows: &[FeatureImportanceRow]) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(BufWriter::new(file));

    writer.write_record(["Feature", "RF_FeatureImportance", "MeanAbsSHAP"])?;
    for row in rows {
        writer.write_record([
            row.feature.clone(),
            format_float(row.rf_importance),
            format_float(row.mean_abs_shap),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
