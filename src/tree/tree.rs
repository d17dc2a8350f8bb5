//! Tree Growth
//!
//! Greedy, depth-first partitioning of the training rows into a binary tree of
//! [`Node`]s stored in a flat list.
use crate::classifier::config::TreeConfig;
use crate::errors::CartError;
use crate::node::{Node, OutcomeNode, SplitNode};
use crate::splitter::Splitter;
use hashbrown::HashMap;
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::max;
use std::fmt::{self, Display};

/// A grown tree. Built once and read-only afterwards.
///
/// Nodes are stored in pre-order: the root sits at position 0, and every
/// split's left subtree directly follows it, before its right subtree.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Tree {
    pub nodes: Vec<Node>,
    /// Depth of the deepest leaf, the root being at depth 0.
    pub depth: usize,
    pub n_leaves: usize,
}

impl Tree {
    /// Grow a tree over the rows at `index`.
    ///
    /// * `splitter` - Split finder over the training data.
    /// * `class_ids` - Class id of every training row, indexing into `classes`.
    /// * `classes` - Class labels.
    /// * `index` - Rows reaching the root, must not be empty.
    /// * `cfg` - Stopping criteria and impurity criterion.
    /// * `rng` - Random source for feature sampling.
    pub fn fit<R: Rng + ?Sized>(
        splitter: &Splitter,
        class_ids: &[usize],
        classes: &[String],
        index: Vec<usize>,
        cfg: &TreeConfig,
        rng: &mut R,
    ) -> Self {
        let mut grower = Grower {
            splitter,
            class_ids,
            classes,
            cfg,
            rng,
            nodes: Vec::new(),
            depth: 0,
            n_leaves: 0,
        };
        grower.grow(index);
        Tree {
            nodes: grower.nodes,
            depth: grower.depth,
            n_leaves: grower.n_leaves,
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Impurity decrease achieved by a split of this tree.
    pub fn purity_increase(&self, split: &SplitNode) -> f64 {
        let left = &self.nodes[split.left_child];
        let right = &self.nodes[split.right_child];
        let n = split.n_samples as f64;
        split.impurity
            - (left.n_samples() as f64 / n) * left.impurity()
            - (right.n_samples() as f64 / n) * right.impurity()
    }

    /// Total weighted impurity decrease per feature, normalized to sum to one.
    ///
    /// All zeros if the tree never splits.
    pub fn feature_importances(&self, n_features: usize) -> Vec<f64> {
        let mut importances = vec![0.0; n_features];
        let n_total = self.nodes.first().map_or(0, |n| n.n_samples()) as f64;
        for node in &self.nodes {
            if let Node::Split(s) = node {
                importances[s.feature] += (s.n_samples as f64 / n_total) * self.purity_increase(s);
            }
        }
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }
        importances
    }

    /// Check the structure of a tree that did not come out of [`Tree::fit`].
    ///
    /// Every split must test a column below `n_features` and point to two
    /// later nodes, every node but the root must have exactly one parent, and
    /// the recorded depth and leaf count must match the nodes.
    pub fn validate(&self, n_features: usize) -> Result<(), CartError> {
        let n_nodes = self.nodes.len();
        if n_nodes == 0 {
            return Err(CartError::UnableToRead("tree has no nodes".to_string()));
        }
        let mut depths: Vec<Option<usize>> = vec![None; n_nodes];
        depths[0] = Some(0);
        let mut depth = 0;
        let mut n_leaves = 0;
        for (i, node) in self.nodes.iter().enumerate() {
            let d = depths[i].ok_or_else(|| CartError::UnableToRead(format!("node {} has no parent", i)))?;
            match node {
                Node::Split(s) => {
                    if s.feature >= n_features {
                        return Err(CartError::UnableToRead(format!(
                            "node {} splits on feature {}, model has {} features",
                            i, s.feature, n_features
                        )));
                    }
                    for child in [s.left_child, s.right_child] {
                        if child <= i || child >= n_nodes {
                            return Err(CartError::UnableToRead(format!(
                                "node {} has an invalid child {}",
                                i, child
                            )));
                        }
                        if depths[child].replace(d + 1).is_some() {
                            return Err(CartError::UnableToRead(format!("node {} has several parents", child)));
                        }
                    }
                }
                Node::Outcome(_) => {
                    depth = max(depth, d);
                    n_leaves += 1;
                }
            }
        }
        if depth != self.depth || n_leaves != self.n_leaves {
            return Err(CartError::UnableToRead(format!(
                "tree records depth {} and {} leaves, nodes give depth {} and {} leaves",
                self.depth, self.n_leaves, depth, n_leaves
            )));
        }
        Ok(())
    }
}

impl Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut print_buffer: Vec<(usize, usize)> = vec![(0, 0)];
        let mut r = String::new();
        while let Some((idx, depth)) = print_buffer.pop() {
            let node = &self.nodes[idx];
            r += format!("{}{}\n", "      ".repeat(depth).as_str(), node).as_str();
            if let Node::Split(s) = node {
                print_buffer.push((s.right_child, depth + 1));
                print_buffer.push((s.left_child, depth + 1));
            }
        }
        write!(f, "{}", r)
    }
}

// Rows waiting to become a node, and the split slot the node fills.
struct PendingNode {
    index: Vec<usize>,
    depth: usize,
    parent: Option<(usize, bool)>,
}

struct Grower<'a, 'b, R: Rng + ?Sized> {
    splitter: &'a Splitter<'b>,
    class_ids: &'a [usize],
    classes: &'a [String],
    cfg: &'a TreeConfig,
    rng: &'a mut R,
    nodes: Vec<Node>,
    depth: usize,
    n_leaves: usize,
}

impl<'a, 'b, R: Rng + ?Sized> Grower<'a, 'b, R> {
    // Nodes are grown from a stack, the left child always popped before the
    // right one, so nodes land in pre-order and splits consume the random
    // source in the same order on every run.
    fn grow(&mut self, index: Vec<usize>) {
        let mut growable = vec![PendingNode {
            index,
            depth: 0,
            parent: None,
        }];
        while let Some(pending) = growable.pop() {
            let idx = self.nodes.len();
            if let Some((parent, is_left)) = pending.parent {
                if let Node::Split(s) = &mut self.nodes[parent] {
                    if is_left {
                        s.left_child = idx;
                    } else {
                        s.right_child = idx;
                    }
                }
            }
            let (node, children) = self.make_node(pending.index, pending.depth);
            self.nodes.push(node);
            if let Some((left_index, right_index)) = children {
                growable.push(PendingNode {
                    index: right_index,
                    depth: pending.depth + 1,
                    parent: Some((idx, false)),
                });
                growable.push(PendingNode {
                    index: left_index,
                    depth: pending.depth + 1,
                    parent: Some((idx, true)),
                });
            }
        }
    }

    // Either a leaf, or a split whose children are still to be grown from the
    // returned partition.
    fn make_node(&mut self, index: Vec<usize>, depth: usize) -> (Node, Option<(Vec<usize>, Vec<usize>)>) {
        let impurity = self.cfg.criterion.impurity(&self.splitter.counts(&index));

        if depth >= self.cfg.max_depth || index.len() <= self.cfg.max_leaf_size || impurity == 0.0 {
            return (self.terminate(&index, impurity, depth), None);
        }

        let split = match self.splitter.best_split(&index, &mut *self.rng) {
            Some(split) => split,
            None => return (self.terminate(&index, impurity, depth), None),
        };

        if impurity - split.score < self.cfg.min_purity_increase {
            debug!(
                "Pre-pruning node at depth {} with {} samples, purity increase {} below {}.",
                depth,
                index.len(),
                impurity - split.score,
                self.cfg.min_purity_increase
            );
            return (self.terminate(&index, impurity, depth), None);
        }

        if split.left_index.is_empty() || split.right_index.is_empty() {
            return (self.terminate(&index, impurity, depth), None);
        }

        let node = Node::Split(SplitNode {
            feature: split.feature,
            value: split.value,
            impurity,
            n_samples: index.len(),
            left_child: 0,
            right_child: 0,
        });
        (node, Some((split.left_index, split.right_index)))
    }

    // The predicted class is the most frequent one, ties going to the class
    // seen first among the rows.
    fn terminate(&mut self, index: &[usize], impurity: f64, depth: usize) -> Node {
        let mut order: Vec<usize> = Vec::new();
        let mut counts = vec![0usize; self.classes.len()];
        for i in index {
            let c = self.class_ids[*i];
            if counts[c] == 0 {
                order.push(c);
            }
            counts[c] += 1;
        }

        let best = order
            .iter()
            .copied()
            .reduce(|best, c| if counts[c] > counts[best] { c } else { best });

        let n = index.len() as f64;
        let probabilities: HashMap<String, f64> = order
            .iter()
            .map(|c| (self.classes[*c].clone(), counts[*c] as f64 / n))
            .collect();

        self.depth = max(self.depth, depth);
        self.n_leaves += 1;

        Node::Outcome(OutcomeNode {
            class: best.map_or_else(String::new, |c| self.classes[c].clone()),
            probabilities,
            impurity,
            n_samples: index.len(),
        })
    }
}
