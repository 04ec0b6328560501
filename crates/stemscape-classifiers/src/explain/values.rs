use ndarray::{s, Array2, Array3, Axis};

use crate::error::{Result, StemError};
use crate::models::POSITIVE_CLASS;

/// Attributions for every (sample, feature, class) plus one expected value
/// per class.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapValues {
    values: Array3<f64>,
    expected_value: Vec<f64>,
}

/// Attribution matrix and baseline reported for the positive class.
#[derive(Debug, Clone, PartialEq)]
pub struct PositiveClassShap {
    /// Shape `(n_samples, n_features)`.
    pub values: Array2<f64>,
    pub baseline: f64,
}

impl ShapValues {
    pub fn new(values: Array3<f64>, expected_value: Vec<f64>) -> Result<Self> {
        let n_classes = values.len_of(Axis(2));
        if expected_value.len() != n_classes {
            return Err(StemError::LengthMismatch {
                expected: n_classes,
                found: expected_value.len(),
            });
        }
        Ok(Self {
            values,
            expected_value,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.values.len_of(Axis(0))
    }

    pub fn n_features(&self) -> usize {
        self.values.len_of(Axis(1))
    }

    pub fn n_classes(&self) -> usize {
        self.values.len_of(Axis(2))
    }

    pub fn values(&self) -> &Array3<f64> {
        &self.values
    }

    pub fn expected_value(&self) -> &[f64] {
        &self.expected_value
    }

    /// Attribution matrix of one class.
    pub fn class_values(&self, class: usize) -> Array2<f64> {
        self.values.slice(s![.., .., class]).to_owned()
    }

    /// Select the positive class when at least two classes are present,
    /// otherwise the only available output.
    pub fn positive_class(&self) -> PositiveClassShap {
        let class = if self.n_classes() >= 2 { POSITIVE_CLASS } else { 0 };
        let baseline_idx = if self.expected_value.len() > 1 { POSITIVE_CLASS } else { 0 };
        PositiveClassShap {
            values: self.class_values(class),
            baseline: self.expected_value[baseline_idx],
        }
    }
}

impl PositiveClassShap {
    /// Baseline plus the row's attributions.
    pub fn reconstruct(&self, row: usize) -> f64 {
        self.baseline + self.values.row(row).sum()
    }

    /// Mean absolute attribution per feature.
    pub fn mean_abs(&self) -> Vec<f64> {
        let n = self.values.nrows();
        if n == 0 {
            return vec![0.0; self.values.ncols()];
        }
        self.values
            .mapv(f64::abs)
            .sum_axis(Axis(0))
            .mapv(|v| v / n as f64)
            .to_vec()
    }

    /// Largest `|baseline + sum(attributions) - prediction|` over all rows.
    pub fn max_additivity_error(&self, predictions: &[f64]) -> f64 {
        predictions
            .iter()
            .enumerate()
            .map(|(row, p)| (self.reconstruct(row) - p).abs())
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn per_class_output_selects_index_one() {
        // one sample, two features, two classes
        let values = array![[[1.0, -1.0], [2.0, -2.0]]];
        let shap = ShapValues::new(values, vec![0.7, 0.3]).unwrap();
        let pos = shap.positive_class();
        assert_eq!(pos.values, array![[-1.0, -2.0]]);
        assert_eq!(pos.baseline, 0.3);
    }

    #[test]
    fn single_output_is_used_as_is() {
        let values = array![[[0.5], [-0.25]], [[0.1], [0.0]]];
        let shap = ShapValues::new(values, vec![0.4]).unwrap();
        assert_eq!(shap.n_classes(), 1);
        let pos = shap.positive_class();
        assert_eq!(pos.values, array![[0.5, -0.25], [0.1, 0.0]]);
        assert_eq!(pos.baseline, 0.4);
        assert!((pos.reconstruct(0) - 0.65).abs() < 1e-12);
    }

    #[test]
    fn mean_abs_is_per_feature() {
        let pos = PositiveClassShap {
            values: array![[1.0, -2.0], [-3.0, 0.0]],
            baseline: 0.0,
        };
        assert_eq!(pos.mean_abs(), vec![2.0, 1.0]);
    }

    #[test]
    fn expected_value_length_must_match_classes() {
        let values = Array3::<f64>::zeros((1, 2, 2));
        assert!(ShapValues::new(values, vec![0.5]).is_err());
    }
}
