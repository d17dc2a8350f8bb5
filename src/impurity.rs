//! Impurity
//!
//! Label heterogeneity measures used to score candidate splits and to record
//! node purity. All criteria are zero for a pure node and for nodes with at most
//! one sample.
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Criterion {
    /// Gini impurity, `sum_c (1 - p_c^2)` over the observed classes.
    #[default]
    Gini,
    /// Shannon entropy in bits.
    Entropy,
}

impl Criterion {
    /// Impurity of a label multiset given as per-class counts.
    ///
    /// Classes with a zero count are not observed and do not contribute.
    pub fn impurity(&self, counts: &[usize]) -> f64 {
        let n: usize = counts.iter().sum();
        match self {
            Criterion::Gini => gini(counts, n),
            Criterion::Entropy => entropy(counts, n),
        }
    }
}

pub fn gini(counts: &[usize], n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let n_f = n as f64;
    counts
        .iter()
        .filter(|c| **c > 0)
        .map(|c| {
            let p = *c as f64 / n_f;
            1.0 - p * p
        })
        .sum()
}

pub fn entropy(counts: &[usize], n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let n_f = n as f64;
    counts
        .iter()
        .filter(|c| **c > 0)
        .map(|c| {
            let p = *c as f64 / n_f;
            -p * p.log2()
        })
        .sum::<f64>()
        .max(0.0)
}

/// Count occurrences of each class id, for ids in `0..n_classes`.
pub fn class_counts(class_ids: impl IntoIterator<Item = usize>, n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0; n_classes];
    for c in class_ids {
        counts[c] += 1;
    }
    counts
}
