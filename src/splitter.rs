//! Splitter
//!
//! Exhaustive search for the binary partition of a node's rows that minimizes
//! the size-weighted impurity of the two children.
use crate::data::{DataType, Dataset, Value};
use crate::impurity::{class_counts, Criterion};
use hashbrown::HashMap;
use rand::seq::IteratorRandom;
use rand::Rng;

/// The best partition found for a node.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitInfo {
    pub feature: usize,
    pub value: Value,
    /// `(n_left / n) * impurity(left) + (n_right / n) * impurity(right)`.
    pub score: f64,
    pub left_index: Vec<usize>,
    pub right_index: Vec<usize>,
}

/// Split finder over a labeled dataset whose labels were encoded as class ids.
pub struct Splitter<'a> {
    data: &'a Dataset,
    class_ids: &'a [usize],
    n_classes: usize,
    criterion: Criterion,
    max_features: Option<usize>,
}

impl<'a> Splitter<'a> {
    /// * `data` - The training rows.
    /// * `class_ids` - Class id of every row of `data`, in `0..n_classes`.
    /// * `max_features` - Number of columns examined per split, all of them if `None`.
    pub fn new(
        data: &'a Dataset,
        class_ids: &'a [usize],
        n_classes: usize,
        criterion: Criterion,
        max_features: Option<usize>,
    ) -> Self {
        Splitter {
            data,
            class_ids,
            n_classes,
            criterion,
            max_features,
        }
    }

    /// Draw the columns to examine, without replacement, sorted ascending.
    ///
    /// When every column is examined the random source is left untouched.
    pub fn sample_features<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<usize> {
        let n_cols = self.data.num_columns();
        let col_amount = self.max_features.map_or(n_cols, |m| m.min(n_cols));
        if col_amount == n_cols {
            (0..n_cols).collect()
        } else {
            let mut v = (0..n_cols).choose_multiple(rng, col_amount);
            v.sort();
            v
        }
    }

    /// Counts of each class among the rows at `index`.
    pub fn counts(&self, index: &[usize]) -> Vec<usize> {
        class_counts(index.iter().map(|i| self.class_ids[*i]), self.n_classes)
    }

    /// Find the best split of the rows at `index`.
    ///
    /// Candidates are visited in (feature, value) order and only a strictly
    /// better score replaces the current best, so the first minimum wins.
    /// Returns `None` if no examined column has a usable value. The returned
    /// partition may have an empty side.
    pub fn best_split<R: Rng + ?Sized>(&self, index: &[usize], rng: &mut R) -> Option<SplitInfo> {
        let total = self.counts(index);
        let mut best: Option<(usize, Value, f64)> = None;

        for feature in self.sample_features(rng) {
            let candidate = match self.data.column_type(feature) {
                Some(DataType::Continuous) => self.best_continuous(feature, index, &total),
                Some(DataType::Categorical) => self.best_categorical(feature, index, &total),
                None => None,
            };
            if let Some((value, score)) = candidate {
                if best.as_ref().map_or(true, |(_, _, s)| score < *s) {
                    best = Some((feature, value, score));
                }
            }
        }

        best.map(|(feature, value, score)| {
            let (left_index, right_index): (Vec<usize>, Vec<usize>) = index
                .iter()
                .copied()
                .partition(|i| self.data.row(*i)[feature].goes_left(&value));
            SplitInfo {
                feature,
                value,
                score,
                left_index,
                right_index,
            }
        })
    }

    fn weighted_impurity(&self, left: &[usize], right: &[usize]) -> f64 {
        let n_left: usize = left.iter().sum();
        let n_right: usize = right.iter().sum();
        let n = (n_left + n_right) as f64;
        if n == 0.0 {
            return 0.0;
        }
        (n_left as f64 / n) * self.criterion.impurity(left) + (n_right as f64 / n) * self.criterion.impurity(right)
    }

    // Thresholds are the distinct values in ascending order. A single sweep over
    // the sorted rows yields the left counts for every threshold. NaN is never a
    // threshold and always lands on the right.
    fn best_continuous(&self, feature: usize, index: &[usize], total: &[usize]) -> Option<(Value, f64)> {
        let mut values: Vec<(f64, usize)> = index
            .iter()
            .filter_map(|i| match &self.data.row(*i)[feature] {
                Value::Continuous(v) if !v.is_nan() => Some((*v, self.class_ids[*i])),
                _ => None,
            })
            .collect();
        values.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut left = vec![0; self.n_classes];
        let mut right = total.to_vec();
        let mut best: Option<(f64, f64)> = None;
        for (k, (v, c)) in values.iter().enumerate() {
            left[*c] += 1;
            right[*c] -= 1;
            if k + 1 < values.len() && values[k + 1].0 == *v {
                continue;
            }
            let score = self.weighted_impurity(&left, &right);
            if best.map_or(true, |(_, s)| score < s) {
                best = Some((*v, score));
            }
        }
        best.map(|(v, score)| (Value::Continuous(v), score))
    }

    // Tokens are visited in order of first occurrence among the rows.
    fn best_categorical(&self, feature: usize, index: &[usize], total: &[usize]) -> Option<(Value, f64)> {
        let mut tokens: Vec<&str> = Vec::new();
        let mut token_counts: Vec<Vec<usize>> = Vec::new();
        let mut position: HashMap<&str, usize> = HashMap::new();
        for i in index {
            if let Value::Categorical(t) = &self.data.row(*i)[feature] {
                let p = *position.entry(t.as_str()).or_insert_with(|| {
                    tokens.push(t.as_str());
                    token_counts.push(vec![0; self.n_classes]);
                    tokens.len() - 1
                });
                token_counts[p][self.class_ids[*i]] += 1;
            }
        }

        let mut best: Option<(usize, f64)> = None;
        for (p, left) in token_counts.iter().enumerate() {
            let right: Vec<usize> = total.iter().zip(left).map(|(t, l)| t - l).collect();
            let score = self.weighted_impurity(left, &right);
            if best.map_or(true, |(_, s)| score < s) {
                best = Some((p, score));
            }
        }
        best.map(|(p, score)| (Value::Categorical(tokens[p].to_string()), score))
    }
}
