//! Bagged ensemble of CART trees with optional balanced class weights.
use log::{debug, info};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::config::{ClassWeight, ForestConfig};
use crate::data_handling::{FeatureMatrix, FeatureSchema};
use crate::error::{Result, StemError};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::tree::{DecisionTree, TreeParams};

/// Random forest classifier. Probabilities are the mean of the per-tree leaf
/// class proportions.
#[derive(Debug, Clone)]
pub struct RandomForestClassifier {
    config: ForestConfig,
    schema: FeatureSchema,
    n_classes: usize,
    trees: Vec<DecisionTree>,
    importances: Vec<f64>,
}

impl RandomForestClassifier {
    /// Fit a forest on `x` with class codes `y` (in `0..n_classes`).
    pub fn fit(config: &ForestConfig, x: &FeatureMatrix, y: &[usize]) -> Result<Self> {
        config.validate()?;
        if y.len() != x.nrows() {
            return Err(StemError::LengthMismatch {
                expected: x.nrows(),
                found: y.len(),
            });
        }

        let n_classes = y.iter().max().map_or(0, |&m| m + 1);
        let mut class_counts = vec![0usize; n_classes];
        for &label in y {
            class_counts[label] += 1;
        }
        let distinct = class_counts.iter().filter(|&&c| c > 0).count();
        if distinct < 2 {
            return Err(StemError::TooFewClasses { found: distinct });
        }

        let class_weights = class_weights(config.class_weight, &class_counts, y.len());
        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
            max_features: config.max_features.resolve(x.ncols()),
        };

        info!(
            "Fitting random forest: {} trees on {} samples x {} features (max_features={}, class weights {:?})",
            config.n_estimators,
            x.nrows(),
            x.ncols(),
            params.max_features,
            class_weights
        );

        // Draw every tree seed up front so the result does not depend on
        // how rayon schedules the trees.
        let mut master = StdRng::seed_from_u64(config.seed);
        let seeds: Vec<u64> = (0..config.n_estimators).map(|_| master.gen()).collect();

        let values = x.values();
        let trees: Vec<DecisionTree> = seeds
            .par_iter()
            .map(|&seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let sample_weight =
                    bootstrap_weights(config.bootstrap, y, &class_weights, &mut rng);
                DecisionTree::fit(values, y, &sample_weight, n_classes, &params, &mut rng)
            })
            .collect();

        for (i, tree) in trees.iter().enumerate() {
            debug!(
                "Tree {}: {} nodes, depth {}",
                i,
                tree.n_nodes(),
                tree.depth()
            );
        }

        let importances = forest_importances(&trees, x.ncols());

        Ok(Self {
            config: config.clone(),
            schema: x.schema().clone(),
            n_classes,
            trees,
            importances,
        })
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    fn check_schema(&self, x: &FeatureMatrix) -> Result<()> {
        self.schema.ensure_matches(x.schema())
    }
}

impl ClassifierModel for RandomForestClassifier {
    fn predict_proba(&self, x: &FeatureMatrix) -> Result<Array2<f64>> {
        self.check_schema(x)?;

        let n_trees = self.trees.len() as f64;
        let rows: Vec<Vec<f64>> = (0..x.nrows())
            .into_par_iter()
            .map(|r| {
                let row = x.row(r);
                let mut acc = vec![0.0; self.n_classes];
                for tree in &self.trees {
                    for (a, v) in acc.iter_mut().zip(tree.predict_value(row)) {
                        *a += v;
                    }
                }
                acc.into_iter().map(|a| a / n_trees).collect()
            })
            .collect();

        let mut proba = Array2::<f64>::zeros((x.nrows(), self.n_classes));
        for (r, row) in rows.into_iter().enumerate() {
            for (c, v) in row.into_iter().enumerate() {
                proba[[r, c]] = v;
            }
        }
        Ok(proba)
    }

    fn feature_importances(&self) -> Vec<f64> {
        self.importances.clone()
    }

    fn feature_schema(&self) -> &FeatureSchema {
        &self.schema
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}

/// Per-class weights indexed by class code.
fn class_weights(mode: ClassWeight, class_counts: &[usize], n_samples: usize) -> Vec<f64> {
    match mode {
        ClassWeight::None => vec![1.0; class_counts.len()],
        ClassWeight::Balanced => {
            let present = class_counts.iter().filter(|&&c| c > 0).count() as f64;
            class_counts
                .iter()
                .map(|&c| {
                    if c == 0 {
                        0.0
                    } else {
                        n_samples as f64 / (present * c as f64)
                    }
                })
                .collect()
        }
    }
}

/// Bootstrap multiplicity of every row times its class weight.
fn bootstrap_weights(bootstrap: bool, y: &[usize], class_weights: &[f64], rng: &mut StdRng) -> Vec<f64> {
    let n = y.len();
    let mut counts = vec![0.0; n];
    if bootstrap {
        for _ in 0..n {
            counts[rng.gen_range(0..n)] += 1.0;
        }
    } else {
        counts.iter_mut().for_each(|c| *c = 1.0);
    }
    counts
        .iter()
        .zip(y)
        .map(|(count, &label)| count * class_weights[label])
        .collect()
}

/// Average of the per-tree importances over trees with at least one split,
/// normalized to sum to one.
fn forest_importances(trees: &[DecisionTree], n_features: usize) -> Vec<f64> {
    let mut total = vec![0.0; n_features];
    let mut used = 0usize;
    for tree in trees.iter().filter(|t| t.n_nodes() > 1) {
        for (t, v) in total.iter_mut().zip(tree.feature_importances(n_features)) {
            *t += v;
        }
        used += 1;
    }
    if used == 0 {
        return total;
    }
    for t in total.iter_mut() {
        *t /= used as f64;
    }
    let sum: f64 = total.iter().sum();
    if sum > 0.0 {
        for t in total.iter_mut() {
            *t /= sum;
        }
    }
    total
}
