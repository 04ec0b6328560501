//! Evaluation helpers for labelled scoring tables.
use crate::models::POSITIVE_CLASS;

/// Number of samples per class code.
pub fn class_counts(labels: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &label in labels {
        if label < n_classes {
            counts[label] += 1;
        }
    }
    counts
}

/// Fraction of rows where `score > threshold` agrees with the label being
/// the positive class.
pub fn accuracy(scores: &[f64], labels: &[usize], threshold: f64) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let correct = scores
        .iter()
        .zip(labels)
        .filter(|&(&s, &l)| (s > threshold) == (l == POSITIVE_CLASS))
        .count();
    correct as f64 / scores.len() as f64
}

/// Area under the ROC curve of `scores` for the positive class, computed
/// from the Mann-Whitney U statistic with average ranks for ties.
///
/// Returns `None` unless both positive and negative rows are present.
pub fn roc_auc(scores: &[f64], labels: &[usize]) -> Option<f64> {
    let n_pos = labels.iter().filter(|&&l| l == POSITIVE_CLASS).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut rank_sum_pos = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // ranks are 1-based; tied block shares the average rank
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            if labels[idx] == POSITIVE_CLASS {
                rank_sum_pos += avg_rank;
            }
        }
        start = end;
    }

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    let u = rank_sum_pos - n_pos * (n_pos + 1.0) / 2.0;
    Some(u / (n_pos * n_neg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_ranking_has_auc_one() {
        let auc = roc_auc(&[0.1, 0.2, 0.8, 0.9], &[0, 0, 1, 1]).unwrap();
        assert!((auc - 1.0).abs() < 1e-12);
    }

    #[test]
    fn ties_count_half() {
        let auc = roc_auc(&[0.5, 0.5], &[0, 1]).unwrap();
        assert!((auc - 0.5).abs() < 1e-12);
    }

    #[test]
    fn auc_needs_both_classes() {
        assert!(roc_auc(&[0.1, 0.2], &[1, 1]).is_none());
    }

    #[test]
    fn accuracy_uses_strict_threshold() {
        let acc = accuracy(&[0.5, 0.7, 0.2], &[0, 1, 1], 0.5);
        assert!((acc - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn class_counts_per_code() {
        assert_eq!(class_counts(&[0, 1, 1, 2], 3), vec![1, 2, 1]);
    }
}
