use log::info;
use ndarray::{Array3, ArrayView1};
use rayon::prelude::*;

use crate::data_handling::FeatureMatrix;
use crate::error::Result;
use crate::explain::path::{extend_path, unwind_path, unwound_path_sum, PathElement};
use crate::explain::values::ShapValues;
use crate::models::tree::{DecisionTree, NodeIndex, NodeKind};
use crate::models::{ClassifierModel, RandomForestClassifier};

/// Path-dependent TreeSHAP explainer for a fitted random forest.
///
/// Built once per model; the expected value of every class is computed at
/// construction and shared by every call to [`TreeExplainer::shap_values`].
#[derive(Debug)]
pub struct TreeExplainer<'m> {
    model: &'m RandomForestClassifier,
    expected_value: Vec<f64>,
}

impl<'m> TreeExplainer<'m> {
    pub fn new(model: &'m RandomForestClassifier) -> Self {
        let n_classes = model.n_classes();
        let n_trees = model.trees().len() as f64;

        let mut expected_value = vec![0.0; n_classes];
        for tree in model.trees() {
            for (e, v) in expected_value.iter_mut().zip(&tree.root().value) {
                *e += v;
            }
        }
        expected_value.iter_mut().for_each(|e| *e /= n_trees);

        let max_depth = model.trees().iter().map(DecisionTree::depth).max().unwrap_or(0);
        info!(
            "Built tree explainer over {} trees (max depth {}), expected value {:?}",
            model.trees().len(),
            max_depth,
            expected_value
        );

        Self {
            model,
            expected_value,
        }
    }

    pub fn expected_value(&self) -> &[f64] {
        &self.expected_value
    }

    /// Attributions for every row of `x`.
    pub fn shap_values(&self, x: &FeatureMatrix) -> Result<ShapValues> {
        self.model.feature_schema().ensure_matches(x.schema())?;

        let n_features = x.ncols();
        let n_classes = self.model.n_classes();
        let n_trees = self.model.trees().len() as f64;

        let rows: Vec<Vec<f64>> = (0..x.nrows())
            .into_par_iter()
            .map(|r| {
                let row = x.row(r);
                let mut phi = vec![0.0; n_features * n_classes];
                for tree in self.model.trees() {
                    tree_shap(tree, row, &mut phi, n_classes, 0, &[], 1.0, 1.0, None);
                }
                phi.iter_mut().for_each(|v| *v /= n_trees);
                phi
            })
            .collect();

        let mut values = Array3::<f64>::zeros((x.nrows(), n_features, n_classes));
        for (r, phi) in rows.iter().enumerate() {
            for f in 0..n_features {
                for c in 0..n_classes {
                    values[[r, f, c]] = phi[f * n_classes + c];
                }
            }
        }

        ShapValues::new(values, self.expected_value.clone())
    }
}

/// Recursive TreeSHAP over one tree; adds into `phi` (feature-major, class-minor).
#[allow(clippy::too_many_arguments)]
fn tree_shap(
    tree: &DecisionTree,
    row: ArrayView1<'_, f64>,
    phi: &mut [f64],
    n_classes: usize,
    node: NodeIndex,
    parent_path: &[PathElement],
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
) {
    let mut path = Vec::with_capacity(parent_path.len() + 1);
    path.extend_from_slice(parent_path);
    extend_path(&mut path, zero_fraction, one_fraction, feature);

    let nodes = tree.nodes();
    let current = &nodes[node];

    match current.kind {
        NodeKind::Leaf => {
            for i in 1..path.len() {
                let weight = unwound_path_sum(&path, i);
                let el = path[i];
                if let Some(f) = el.feature {
                    let scale = weight * (el.one_fraction - el.zero_fraction);
                    for (c, v) in current.value.iter().enumerate() {
                        phi[f * n_classes + c] += scale * v;
                    }
                }
            }
        }
        NodeKind::Split {
            feature: split,
            threshold,
            left,
            right,
        } => {
            let (hot, cold) = if row[split] <= threshold {
                (left, right)
            } else {
                (right, left)
            };
            let hot_zero = nodes[hot].cover / current.cover;
            let cold_zero = nodes[cold].cover / current.cover;

            let mut incoming_zero = 1.0;
            let mut incoming_one = 1.0;
            if let Some(k) = path.iter().position(|e| e.feature == Some(split)) {
                incoming_zero = path[k].zero_fraction;
                incoming_one = path[k].one_fraction;
                unwind_path(&mut path, k);
            }

            tree_shap(
                tree,
                row,
                phi,
                n_classes,
                hot,
                &path,
                hot_zero * incoming_zero,
                incoming_one,
                Some(split),
            );
            tree_shap(
                tree,
                row,
                phi,
                n_classes,
                cold,
                &path,
                cold_zero * incoming_zero,
                0.0,
                Some(split),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForestConfig;
    use crate::data_handling::FeatureSchema;
    use ndarray::Array2;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn synthetic(n: usize, seed: u64) -> (FeatureMatrix, Vec<usize>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut values = Array2::<f64>::zeros((n, 4));
        let mut y = Vec::with_capacity(n);
        for r in 0..n {
            for c in 0..4 {
                values[[r, c]] = rng.gen_range(0.0..1.0);
            }
            values[[r, 3]] = (values[[r, 3]] * 3.0).floor();
            let signal = values[[r, 0]] + 0.5 * values[[r, 1]] + 0.2 * rng.gen_range(0.0..1.0);
            y.push(usize::from(signal > 0.8));
        }
        let schema = FeatureSchema::new(vec!["a".into(), "b".into(), "c".into(), "d".into()]);
        (FeatureMatrix::new(schema, values).unwrap(), y)
    }

    #[test]
    fn attributions_add_up_to_predictions() {
        let (x, y) = synthetic(60, 7);
        let cfg = ForestConfig {
            n_estimators: 15,
            ..ForestConfig::default()
        };
        let model = RandomForestClassifier::fit(&cfg, &x, &y).unwrap();
        let explainer = TreeExplainer::new(&model);
        let shap = explainer.shap_values(&x).unwrap();
        let proba = model.predict_proba(&x).unwrap();

        for class in 0..shap.n_classes() {
            let values = shap.class_values(class);
            for r in 0..x.nrows() {
                let total = shap.expected_value()[class] + values.row(r).sum();
                assert!(
                    (total - proba[[r, class]]).abs() < 1e-9,
                    "row {} class {}: {} vs {}",
                    r,
                    class,
                    total,
                    proba[[r, class]]
                );
            }
        }
    }

    #[test]
    fn class_attributions_are_mirrored_for_binary_output() {
        let (x, y) = synthetic(40, 11);
        let cfg = ForestConfig {
            n_estimators: 5,
            ..ForestConfig::default()
        };
        let model = RandomForestClassifier::fit(&cfg, &x, &y).unwrap();
        let shap = TreeExplainer::new(&model).shap_values(&x).unwrap();
        let c0 = shap.class_values(0);
        let c1 = shap.class_values(1);
        for (a, b) in c0.iter().zip(c1.iter()) {
            assert!((a + b).abs() < 1e-9);
        }
    }

    #[test]
    fn unused_feature_gets_zero_attribution() {
        let (x, y) = synthetic(50, 3);
        // stumps consult at most one column per tree
        let cfg = ForestConfig {
            n_estimators: 3,
            max_depth: Some(1),
            max_features: crate::config::MaxFeatures::All,
            ..ForestConfig::default()
        };
        let model = RandomForestClassifier::fit(&cfg, &x, &y).unwrap();
        let mut used = [false; 4];
        for tree in model.trees() {
            for node in tree.nodes() {
                if let NodeKind::Split { feature, .. } = node.kind {
                    used[feature] = true;
                }
            }
        }
        let shap = TreeExplainer::new(&model).shap_values(&x).unwrap().positive_class();
        for (f, was_used) in used.iter().enumerate() {
            if !was_used {
                assert!(shap.values.column(f).iter().all(|v| *v == 0.0));
            }
        }
    }

    #[test]
    fn schema_mismatch_is_rejected() {
        let (x, y) = synthetic(20, 5);
        let cfg = ForestConfig {
            n_estimators: 2,
            ..ForestConfig::default()
        };
        let model = RandomForestClassifier::fit(&cfg, &x, &y).unwrap();
        let explainer = TreeExplainer::new(&model);
        let other = FeatureMatrix::new(
            FeatureSchema::new(vec!["a".into(), "b".into(), "d".into(), "c".into()]),
            x.values().clone(),
        )
        .unwrap();
        assert!(explainer.shap_values(&other).is_err());
    }
}
