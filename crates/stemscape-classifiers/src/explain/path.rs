//! Feature path bookkeeping for TreeSHAP.
//!
//! A path holds one element per unique feature split on from the root to
//! the current node. `pweight` stores the permutation weights of every
//! subset size, updated incrementally as the path is extended or a feature
//! is unwound from it.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathElement {
    /// `None` for the root sentinel.
    pub feature: Option<usize>,
    /// Fraction of cover that flows down this path when the feature is unknown.
    pub zero_fraction: f64,
    /// 1.0 when the explained row follows this path, 0.0 otherwise.
    pub one_fraction: f64,
    pub pweight: f64,
}

/// Append a split to the path and update the subset weights.
pub(crate) fn extend_path(
    path: &mut Vec<PathElement>,
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
) {
    let depth = path.len();
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        pweight: if depth == 0 { 1.0 } else { 0.0 },
    });

    let denom = (depth + 1) as f64;
    for i in (0..depth).rev() {
        path[i + 1].pweight += one_fraction * path[i].pweight * (i + 1) as f64 / denom;
        path[i].pweight = zero_fraction * path[i].pweight * (depth - i) as f64 / denom;
    }
}

/// Remove the element at `path_index`, undoing its contribution to the weights.
pub(crate) fn unwind_path(path: &mut Vec<PathElement>, path_index: usize) {
    let depth = path.len() - 1;
    let one_fraction = path[path_index].one_fraction;
    let zero_fraction = path[path_index].zero_fraction;
    let denom = (depth + 1) as f64;
    let mut next_one_portion = path[depth].pweight;

    for i in (0..depth).rev() {
        if one_fraction != 0.0 {
            let tmp = path[i].pweight;
            path[i].pweight = next_one_portion * denom / ((i + 1) as f64 * one_fraction);
            next_one_portion =
                tmp - path[i].pweight * zero_fraction * (depth - i) as f64 / denom;
        } else {
            path[i].pweight = path[i].pweight * denom / (zero_fraction * (depth - i) as f64);
        }
    }

    for i in path_index..depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
    path.pop();
}

/// Total permutation weight of the path with `path_index` removed, without
/// modifying the path.
pub(crate) fn unwound_path_sum(path: &[PathElement], path_index: usize) -> f64 {
    let depth = path.len() - 1;
    let one_fraction = path[path_index].one_fraction;
    let zero_fraction = path[path_index].zero_fraction;
    let mut next_one_portion = path[depth].pweight;
    let mut total = 0.0;

    if one_fraction != 0.0 {
        for i in (0..depth).rev() {
            let tmp = next_one_portion / ((i + 1) as f64 * one_fraction);
            total += tmp;
            next_one_portion = path[i].pweight - tmp * zero_fraction * (depth - i) as f64;
        }
    } else {
        for i in (0..depth).rev() {
            total += path[i].pweight / (zero_fraction * (depth - i) as f64);
        }
    }

    total * (depth + 1) as f64
}
