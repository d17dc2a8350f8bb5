use crate::classifier::config::TreeConfig;
use crate::impurity::Criterion;

impl TreeConfig {
    // Set methods for parameters

    /// Set the maximum depth of the tree.
    /// * `max_depth` - Nodes at this depth become leaves.
    pub fn set_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the maximum leaf size.
    /// * `max_leaf_size` - Nodes with at most this many samples are not split further.
    pub fn set_max_leaf_size(mut self, max_leaf_size: usize) -> Self {
        self.max_leaf_size = max_leaf_size;
        self
    }

    /// Set the number of features examined per split.
    /// * `max_features` - Size of the random column subset, `None` to examine every column.
    pub fn set_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the minimum purity increase.
    /// * `min_purity_increase` - Splits decreasing impurity by less than this are not made.
    pub fn set_min_purity_increase(mut self, min_purity_increase: f64) -> Self {
        self.min_purity_increase = min_purity_increase;
        self
    }

    /// Set the impurity criterion.
    pub fn set_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the random seed.
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
