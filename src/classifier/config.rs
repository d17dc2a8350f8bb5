//! Tree Configuration
//!
//! Hyper-parameters controlling tree growth, validated when a learner is built.
use crate::constants::{MAX_DEPTH, MAX_LEAF_SIZE, MIN_PURITY_INCREASE, SEED};
use crate::errors::CartError;
use crate::impurity::Criterion;
use serde::{Deserialize, Serialize};

fn default_max_depth() -> usize {
    MAX_DEPTH
}
fn default_max_leaf_size() -> usize {
    MAX_LEAF_SIZE
}
fn default_max_features() -> Option<usize> {
    None
}
fn default_min_purity_increase() -> f64 {
    MIN_PURITY_INCREASE
}
fn default_seed() -> u64 {
    SEED
}

/// Configuration for the `ClassificationTree`.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct TreeConfig {
    /// Depth at which a node is always made a leaf. The root is at depth 0.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Nodes with at most this many samples become leaves.
    #[serde(default = "default_max_leaf_size")]
    pub max_leaf_size: usize,
    /// Number of randomly drawn columns examined per split, all of them if `None`.
    #[serde(default = "default_max_features")]
    pub max_features: Option<usize>,
    /// Minimum impurity decrease a split must achieve.
    #[serde(default = "default_min_purity_increase")]
    pub min_purity_increase: f64,
    /// Impurity measure.
    #[serde(default)]
    pub criterion: Criterion,
    /// Seed for the feature sampling random number generator.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig {
            max_depth: default_max_depth(),
            max_leaf_size: default_max_leaf_size(),
            max_features: default_max_features(),
            min_purity_increase: default_min_purity_increase(),
            criterion: Criterion::default(),
            seed: default_seed(),
        }
    }
}

impl TreeConfig {
    pub fn validate(&self) -> Result<(), CartError> {
        if self.max_depth < 1 {
            return Err(invalid("max_depth", "a value of at least 1", self.max_depth));
        }
        if self.max_leaf_size < 1 {
            return Err(invalid("max_leaf_size", "a value of at least 1", self.max_leaf_size));
        }
        if let Some(0) = self.max_features {
            return Err(invalid("max_features", "a value of at least 1 or None", 0));
        }
        if !(self.min_purity_increase.is_finite() && self.min_purity_increase >= 0.0) {
            return Err(invalid(
                "min_purity_increase",
                "a finite value of at least 0",
                self.min_purity_increase,
            ));
        }
        Ok(())
    }
}

fn invalid<T: ToString>(name: &str, expected: &str, provided: T) -> CartError {
    CartError::InvalidParameter(name.to_string(), expected.to_string(), provided.to_string())
}
