use crate::data::Value;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A tree node. Internal nodes split the rows in two, leaves hold the outcome.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub enum Node {
    Split(SplitNode),
    Outcome(OutcomeNode),
}

/// Internal node with exactly two children.
///
/// Children are positions in the owning tree's node list. Every node other
/// than the root is the child of exactly one split, stored after its parent.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct SplitNode {
    pub feature: usize,
    /// Threshold for continuous columns, match token for categorical ones.
    pub value: Value,
    pub impurity: f64,
    pub n_samples: usize,
    pub left_child: usize,
    pub right_child: usize,
}

/// Terminal node.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct OutcomeNode {
    pub class: String,
    /// Frequency of every class observed at this leaf.
    pub probabilities: HashMap<String, f64>,
    pub impurity: f64,
    pub n_samples: usize,
}

impl Node {
    pub fn impurity(&self) -> f64 {
        match self {
            Node::Split(s) => s.impurity,
            Node::Outcome(o) => o.impurity,
        }
    }

    pub fn n_samples(&self) -> usize {
        match self {
            Node::Split(s) => s.n_samples,
            Node::Outcome(o) => o.n_samples,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Outcome(_))
    }
}

impl SplitNode {
    /// Get the child index a row should travel down.
    pub fn get_child_idx(&self, row: &[Value]) -> usize {
        if row[self.feature].goes_left(&self.value) {
            self.left_child
        } else {
            self.right_child
        }
    }

    fn operator(&self) -> &'static str {
        match self.value {
            Value::Continuous(_) => "<=",
            Value::Categorical(_) => "==",
        }
    }
}

impl fmt::Display for Node {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Node::Split(s) => write!(
                f,
                "[feature {} {} {}] yes={},no={},impurity={},samples={}",
                s.feature,
                s.operator(),
                s.value,
                s.left_child,
                s.right_child,
                s.impurity,
                s.n_samples
            ),
            Node::Outcome(o) => write!(
                f,
                "leaf={},impurity={},samples={}",
                o.class, o.impurity, o.n_samples
            ),
        }
    }
}
