use ndarray::Array2;

use crate::data_handling::{FeatureMatrix, FeatureSchema};
use crate::error::Result;

/// Class index treated as the positive ("stem-like") class.
pub const POSITIVE_CLASS: usize = 1;

/// Contract shared by fitted classifiers used by the stemness pipeline.
///
/// Implementations are immutable once fitted and must reject matrices whose
/// schema differs from the one they were fit on.
pub trait ClassifierModel {
    /// Class probabilities, shape `(n_samples, n_classes)`.
    fn predict_proba(&self, x: &FeatureMatrix) -> Result<Array2<f64>>;

    /// Native per-feature importance, in schema order.
    fn feature_importances(&self) -> Vec<f64>;

    /// Feature schema the model was fit on.
    fn feature_schema(&self) -> &FeatureSchema;

    fn n_classes(&self) -> usize;

    /// Probability of [`POSITIVE_CLASS`] per row (the stemness index).
    ///
    /// Falls back to the only column when the model has a single class.
    fn predict_positive_probability(&self, x: &FeatureMatrix) -> Result<Vec<f64>> {
        let proba = self.predict_proba(x)?;
        let class = POSITIVE_CLASS.min(proba.ncols().saturating_sub(1));
        Ok(proba.column(class).to_vec())
    }

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}
