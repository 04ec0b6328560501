//! TSV writers for per-sample attributions and feature importances.
pub mod importance;
pub mod shap_table;

pub use importance::{
    build_importance_table, write_importance_table, FeatureImportanceRow,
    FEATURE_IMPORTANCE_FILE,
};
pub use shap_table::{write_shap_table, TESTING_SHAP_FILE, TRAINING_SHAP_FILE};

fn format_float(v: f64) -> String {
    v.to_string()
}
