//! CART decision tree grown on weighted samples with the Gini criterion.
//!
//! Nodes are stored in a flat arena. Every node keeps the weighted class
//! proportions and the weighted sample count (cover) of the training rows
//! that reached it; the explainer relies on both.
use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

pub type NodeIndex = usize;

const IMPURITY_EPS: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Leaf,
    /// Rows with `x[feature] <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: NodeIndex,
        right: NodeIndex,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// Weighted class proportions of the training rows reaching this node.
    pub value: Vec<f64>,
    /// Weighted number of training rows reaching this node.
    pub cover: f64,
    pub impurity: f64,
    pub n_samples: usize,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf)
    }
}

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_classes: usize,
}

struct Pending {
    node: NodeIndex,
    samples: Vec<usize>,
    depth: usize,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    score: f64,
}

impl DecisionTree {
    /// Grow a tree on the rows of `x` with non-zero `sample_weight`.
    ///
    /// `y` holds class codes in `0..n_classes`.
    pub fn fit(
        x: &Array2<f64>,
        y: &[usize],
        sample_weight: &[f64],
        n_classes: usize,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let samples: Vec<usize> = (0..x.nrows()).filter(|&i| sample_weight[i] > 0.0).collect();

        let mut tree = DecisionTree {
            nodes: Vec::new(),
            n_classes,
        };
        let root = tree.push_node(&samples, y, sample_weight);
        let mut stack = vec![Pending {
            node: root,
            samples,
            depth: 0,
        }];

        let mut features: Vec<usize> = (0..x.ncols()).collect();

        while let Some(Pending {
            node,
            samples,
            depth,
        }) = stack.pop()
        {
            if !tree.can_split(node, samples.len(), depth, params) {
                continue;
            }

            features.shuffle(rng);
            let best = match find_best_split(x, y, sample_weight, &samples, &features, n_classes, params) {
                Some(best) => best,
                None => continue,
            };

            let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
                .iter()
                .partition(|&&i| x[[i, best.feature]] <= best.threshold);

            let left = tree.push_node(&left_samples, y, sample_weight);
            let right = tree.push_node(&right_samples, y, sample_weight);
            tree.nodes[node].kind = NodeKind::Split {
                feature: best.feature,
                threshold: best.threshold,
                left,
                right,
            };

            stack.push(Pending {
                node: right,
                samples: right_samples,
                depth: depth + 1,
            });
            stack.push(Pending {
                node: left,
                samples: left_samples,
                depth: depth + 1,
            });
        }

        tree
    }

    fn can_split(&self, node: NodeIndex, n_samples: usize, depth: usize, params: &TreeParams) -> bool {
        if let Some(max_depth) = params.max_depth {
            if depth >= max_depth {
                return false;
            }
        }
        n_samples >= params.min_samples_split
            && n_samples >= 2 * params.min_samples_leaf
            && self.nodes[node].impurity > IMPURITY_EPS
    }

    fn push_node(&mut self, samples: &[usize], y: &[usize], sample_weight: &[f64]) -> NodeIndex {
        let mut counts = vec![0.0; self.n_classes];
        for &i in samples {
            counts[y[i]] += sample_weight[i];
        }
        let cover: f64 = counts.iter().sum();
        let impurity = gini(&counts, cover);
        let value = if cover > 0.0 {
            counts.iter().map(|c| c / cover).collect()
        } else {
            counts
        };

        self.nodes.push(Node {
            kind: NodeKind::Leaf,
            value,
            cover,
            impurity,
            n_samples: samples.len(),
        });
        self.nodes.len() - 1
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Class proportions of the leaf `row` falls into.
    pub fn predict_value(&self, row: ArrayView1<'_, f64>) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx].kind {
                NodeKind::Leaf => return &self.nodes[idx].value,
                NodeKind::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Number of edges on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let NodeKind::Split { left, right, .. } = self.nodes[idx].kind {
                stack.push((left, depth + 1));
                stack.push((right, depth + 1));
            }
        }
        max_depth
    }

    /// Mean decrease in impurity per feature, normalized to sum to one.
    ///
    /// Returns all zeros for a tree without splits.
    pub fn feature_importances(&self, n_features: usize) -> Vec<f64> {
        let mut importances = vec![0.0; n_features];
        for node in &self.nodes {
            if let NodeKind::Split {
                feature, left, right, ..
            } = node.kind
            {
                let l = &self.nodes[left];
                let r = &self.nodes[right];
                importances[feature] += node.cover * node.impurity
                    - l.cover * l.impurity
                    - r.cover * r.impurity;
            }
        }

        let root_cover = self.root().cover;
        if root_cover > 0.0 {
            for v in importances.iter_mut() {
                *v /= root_cover;
            }
        }
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for v in importances.iter_mut() {
                *v /= total;
            }
        }
        importances
    }
}

fn gini(counts: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - counts.iter().map(|c| (c / total) * (c / total)).sum::<f64>()
}

/// Weighted Gini of both children, scaled by their weights.
fn children_score(left: &[f64], left_w: f64, right: &[f64], right_w: f64) -> f64 {
    left_w * gini(left, left_w) + right_w * gini(right, right_w)
}

/// Scan candidate features in `features` order until `max_features`
/// non-constant ones have been evaluated.
fn find_best_split(
    x: &Array2<f64>,
    y: &[usize],
    sample_weight: &[f64],
    samples: &[usize],
    features: &[usize],
    n_classes: usize,
    params: &TreeParams,
) -> Option<BestSplit> {
    let n = samples.len();
    let mut best: Option<BestSplit> = None;
    let mut visited = 0;
    let mut sorted = samples.to_vec();

    let mut total = vec![0.0; n_classes];
    for &i in samples {
        total[y[i]] += sample_weight[i];
    }

    for &feature in features {
        if visited >= params.max_features {
            break;
        }

        sorted.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));
        let lo = x[[sorted[0], feature]];
        let hi = x[[sorted[n - 1], feature]];
        if lo >= hi {
            continue;
        }
        visited += 1;

        let mut left = vec![0.0; n_classes];
        let mut right = total.clone();

        for pos in 0..n - 1 {
            let i = sorted[pos];
            let w = sample_weight[i];
            left[y[i]] += w;
            right[y[i]] -= w;

            let v = x[[i, feature]];
            let next = x[[sorted[pos + 1], feature]];
            if v >= next {
                continue;
            }
            let n_left = pos + 1;
            if n_left < params.min_samples_leaf || n - n_left < params.min_samples_leaf {
                continue;
            }

            let left_w: f64 = left.iter().sum();
            let right_w: f64 = right.iter().sum();
            let score = children_score(&left, left_w, &right, right_w);

            if best.as_ref().map_or(true, |b| score < b.score) {
                let mut threshold = v + (next - v) / 2.0;
                if threshold >= next {
                    threshold = v;
                }
                best = Some(BestSplit {
                    feature,
                    threshold,
                    score,
                });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;

    fn params() -> TreeParams {
        TreeParams {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: 2,
        }
    }

    #[test]
    fn separable_data_gives_pure_leaves() {
        let x = array![[0.0, 5.0], [1.0, 5.0], [2.0, 5.0], [3.0, 5.0]];
        let y = [0, 0, 1, 1];
        let w = [1.0; 4];
        let mut rng = StdRng::seed_from_u64(0);
        let tree = DecisionTree::fit(&x, &y, &w, 2, &params(), &mut rng);

        assert_eq!(tree.n_nodes(), 3);
        assert_eq!(tree.depth(), 1);
        match tree.root().kind {
            NodeKind::Split {
                feature, threshold, ..
            } => {
                assert_eq!(feature, 0);
                assert!((threshold - 1.5).abs() < 1e-12);
            }
            NodeKind::Leaf => panic!("root should split"),
        }
        assert_eq!(tree.predict_value(x.row(0)), &[1.0, 0.0]);
        assert_eq!(tree.predict_value(x.row(3)), &[0.0, 1.0]);

        let imp = tree.feature_importances(2);
        assert!((imp[0] - 1.0).abs() < 1e-12);
        assert_eq!(imp[1], 0.0);
    }

    #[test]
    fn zero_weight_rows_are_ignored() {
        let x = array![[0.0], [1.0], [2.0]];
        let y = [0, 1, 1];
        let w = [0.0, 2.0, 1.0];
        let mut rng = StdRng::seed_from_u64(0);
        let tree = DecisionTree::fit(&x, &y, &w, 2, &params(), &mut rng);

        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.root().n_samples, 2);
        assert!((tree.root().cover - 3.0).abs() < 1e-12);
        assert_eq!(tree.root().value, vec![0.0, 1.0]);
    }

    #[test]
    fn min_samples_leaf_limits_growth() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = [0, 1, 0, 1];
        let w = [1.0; 4];
        let mut rng = StdRng::seed_from_u64(0);
        let p = TreeParams {
            min_samples_leaf: 2,
            ..params()
        };
        let tree = DecisionTree::fit(&x, &y, &w, 2, &p, &mut rng);
        for node in tree.nodes().iter().filter(|n| n.is_leaf()) {
            assert!(node.n_samples >= 2);
        }
    }

    #[test]
    fn covers_add_up_at_every_split() {
        let x = array![[0.3, 1.0], [0.1, 0.0], [0.7, 1.0], [0.9, 0.0], [0.5, 1.0]];
        let y = [0, 0, 1, 1, 0];
        let w = [1.0, 2.0, 1.5, 1.0, 0.5];
        let mut rng = StdRng::seed_from_u64(3);
        let tree = DecisionTree::fit(&x, &y, &w, 2, &params(), &mut rng);
        for node in tree.nodes() {
            if let NodeKind::Split { left, right, .. } = node.kind {
                let sum = tree.nodes()[left].cover + tree.nodes()[right].cover;
                assert!((node.cover - sum).abs() < 1e-12);
            }
        }
    }
}
