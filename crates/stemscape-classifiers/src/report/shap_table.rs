use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::data_handling::FeatureSchema;
use crate::error::{Result, StemError};
use crate::explain::PositiveClassShap;
use crate::report::format_float;

pub const TRAINING_SHAP_FILE: &str = "training_shap.tsv";
pub const TESTING_SHAP_FILE: &str = "testing_shap.tsv";

pub const SAMPLE_ID_COLUMN: &str = "SampleID";
pub const BASELINE_COLUMN: &str = "baseline_value";
pub const STEMNESS_COLUMN: &str = "StemSCAPE-SI";

/// Write one row per sample: identifier, shared baseline, stemness index,
/// then one attribution column per feature.
pub fn write_shap_table<P: AsRef<Path>>(
    path: P,
    sample_ids: &[String],
    predictions: &[f64],
    shap: &PositiveClassShap,
    schema: &FeatureSchema,
) -> Result<()> {
    let n = sample_ids.len();
    if predictions.len() != n {
        return Err(StemError::LengthMismatch {
            expected: n,
            found: predictions.len(),
        });
    }
    if shap.values.dim() != (n, schema.len()) {
        return Err(StemError::LengthMismatch {
            expected: n * schema.len(),
            found: shap.values.len(),
        });
    }

    let file = File::create(path.as_ref())?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(BufWriter::new(file));

    let mut header = vec![SAMPLE_ID_COLUMN, BASELINE_COLUMN, STEMNESS_COLUMN];
    header.extend(schema.names().iter().map(String::as_str));
    writer.write_record(&header)?;

    let baseline = format_float(shap.baseline);
    for (r, sample_id) in sample_ids.iter().enumerate() {
        let mut record = Vec::with_capacity(schema.len() + 3);
        record.push(sample_id.clone());
        record.push(baseline.clone());
        record.push(format_float(predictions[r]));
        record.extend(shap.values.row(r).iter().map(|&v| format_float(v)));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}
