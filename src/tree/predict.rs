//! Tree Prediction Methods
//!
//! Read-only traversal of a grown tree, for class and probability predictions.
use super::tree::Tree;
use crate::data::{Dataset, Value};
use crate::node::{Node, OutcomeNode};
use rayon::prelude::*;

impl Tree {
    /// Follow the split rules from the root down to the leaf a row lands in.
    pub fn leaf(&self, row: &[Value]) -> &OutcomeNode {
        let mut node_idx = 0;
        loop {
            match &self.nodes[node_idx] {
                Node::Split(s) => node_idx = s.get_child_idx(row),
                Node::Outcome(o) => return o,
            }
        }
    }

    pub fn predict_row(&self, row: &[Value]) -> &str {
        &self.leaf(row).class
    }

    /// Probability of each of `classes` for a row, 0.0 for classes the leaf never saw.
    pub fn probability_row(&self, row: &[Value], classes: &[String]) -> Vec<f64> {
        let leaf = self.leaf(row);
        classes
            .iter()
            .map(|c| leaf.probabilities.get(c).copied().unwrap_or(0.0))
            .collect()
    }

    /// Predict the class of every row, in row order.
    pub fn predict(&self, data: &Dataset, parallel: bool) -> Vec<String> {
        if parallel {
            data.rows()
                .par_iter()
                .map(|row| self.predict_row(row).to_string())
                .collect()
        } else {
            data.rows().iter().map(|row| self.predict_row(row).to_string()).collect()
        }
    }

    /// Dense class probabilities of every row, in row order, columns following `classes`.
    pub fn probability(&self, data: &Dataset, classes: &[String], parallel: bool) -> Vec<Vec<f64>> {
        if parallel {
            data.rows()
                .par_iter()
                .map(|row| self.probability_row(row, classes))
                .collect()
        } else {
            data.rows()
                .iter()
                .map(|row| self.probability_row(row, classes))
                .collect()
        }
    }
}
