//! Classification Tree
//!
//! The trainable classifier: owns the hyper-parameters, the class labels seen
//! during training and the grown tree.
use crate::classifier::config::TreeConfig;
use crate::data::{DataType, Dataset};
use crate::errors::CartError;
use crate::splitter::Splitter;
use crate::tree::tree::Tree;
use hashbrown::HashMap;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Column types a `ClassificationTree` can be trained on.
pub const COMPATIBILITY: [DataType; 2] = [DataType::Categorical, DataType::Continuous];

/// Binary decision tree classifier.
///
/// The tree is grown greedily by choosing, at every node, the split that
/// minimizes the weighted impurity of the two children, until one of the
/// stopping criteria in [`TreeConfig`] is met.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ClassificationTree {
    cfg: TreeConfig,
    /// Every class seen during training, in order of first occurrence.
    classes: Vec<String>,
    n_features: usize,
    tree: Option<Tree>,
}

impl Default for ClassificationTree {
    fn default() -> Self {
        ClassificationTree {
            cfg: TreeConfig::default(),
            classes: Vec::new(),
            n_features: 0,
            tree: None,
        }
    }
}

impl ClassificationTree {
    /// Create an untrained classifier.
    ///
    /// * `cfg` - Hyper-parameters, rejected with `InvalidParameter` if out of range.
    pub fn new(cfg: TreeConfig) -> Result<Self, CartError> {
        cfg.validate()?;
        Ok(ClassificationTree {
            cfg,
            ..Default::default()
        })
    }

    /// The hyper-parameters this classifier was built with.
    pub fn params(&self) -> &TreeConfig {
        &self.cfg
    }

    pub fn compatibility(&self) -> &'static [DataType] {
        &COMPATIBILITY
    }

    /// Train on a labeled dataset, discarding any previously grown tree.
    ///
    /// Features are sampled with a generator seeded from the configured seed,
    /// so repeated calls on the same data grow the same tree.
    pub fn train(&mut self, data: &Dataset) -> Result<(), CartError> {
        let mut rng = StdRng::seed_from_u64(self.cfg.seed);
        self.train_with_rng(data, &mut rng)
    }

    /// Train using the provided random source for feature sampling.
    ///
    /// On error the classifier is left untouched.
    pub fn train_with_rng<R: Rng + ?Sized>(&mut self, data: &Dataset, rng: &mut R) -> Result<(), CartError> {
        let labels = data
            .labels()
            .ok_or_else(|| CartError::InvalidInput("training requires a labeled dataset".to_string()))?;
        if data.is_empty() {
            return Err(CartError::InvalidInput("training dataset is empty".to_string()));
        }
        if data.num_columns() == 0 {
            return Err(CartError::InvalidInput("training dataset has no features".to_string()));
        }
        if let Some((i, t)) = data
            .column_types()
            .iter()
            .enumerate()
            .find(|(_, t)| !COMPATIBILITY.contains(*t))
        {
            return Err(CartError::InvalidInput(format!("column {} has an unsupported type {}", i, t)));
        }

        let classes = data.possible_outcomes();
        let class_ids: Vec<usize> = {
            let class_index: HashMap<&str, usize> =
                classes.iter().enumerate().map(|(i, c)| (c.as_str(), i)).collect();
            labels.iter().map(|l| class_index[l.as_str()]).collect()
        };

        info!(
            "Training classification tree on {} samples, {} features and {} classes.",
            data.num_rows(),
            data.num_columns(),
            classes.len()
        );

        let splitter = Splitter::new(data, &class_ids, classes.len(), self.cfg.criterion, self.cfg.max_features);
        let tree = Tree::fit(&splitter, &class_ids, &classes, (0..data.num_rows()).collect(), &self.cfg, rng);

        info!(
            "Finished training, tree has depth {} and {} leaves.",
            tree.depth, tree.n_leaves
        );

        self.tree = Some(tree);
        self.classes = classes;
        self.n_features = data.num_columns();
        Ok(())
    }

    /// Whether a tree has been grown.
    pub fn trained(&self) -> bool {
        self.tree.is_some()
    }

    /// Class labels in the column order of [`ClassificationTree::probability`].
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }

    /// Predict a class for every row, in row order.
    ///
    /// * `data` - Rows with the same columns as the training data.
    /// * `parallel` - Predict rows in parallel.
    pub fn predict(&self, data: &Dataset, parallel: bool) -> Result<Vec<String>, CartError> {
        let tree = self.fitted_tree(data)?;
        Ok(tree.predict(data, parallel))
    }

    /// Predict class probabilities for every row, in row order.
    ///
    /// Every row holds one probability per class in [`ClassificationTree::classes`]
    /// order, 0.0 for classes never seen at the row's leaf.
    pub fn probability(&self, data: &Dataset, parallel: bool) -> Result<Vec<Vec<f64>>, CartError> {
        let tree = self.fitted_tree(data)?;
        Ok(tree.probability(data, &self.classes, parallel))
    }

    /// Normalized impurity decrease contributed by each feature.
    pub fn feature_importances(&self) -> Result<Vec<f64>, CartError> {
        let tree = self.tree.as_ref().ok_or(CartError::NotTrained)?;
        Ok(tree.feature_importances(self.n_features))
    }

    /// Depth of the deepest leaf.
    pub fn depth(&self) -> Result<usize, CartError> {
        self.tree.as_ref().map(|t| t.depth).ok_or(CartError::NotTrained)
    }

    pub fn n_leaves(&self) -> Result<usize, CartError> {
        self.tree.as_ref().map(|t| t.n_leaves).ok_or(CartError::NotTrained)
    }

    pub fn n_nodes(&self) -> Result<usize, CartError> {
        self.tree.as_ref().map(|t| t.n_nodes()).ok_or(CartError::NotTrained)
    }

    /// Human readable rendering of the tree, one node per line.
    pub fn rules(&self) -> Result<String, CartError> {
        self.tree.as_ref().map(|t| t.to_string()).ok_or(CartError::NotTrained)
    }

    /// Dump the classifier as a json object.
    pub fn json_dump(&self) -> Result<String, CartError> {
        serde_json::to_string(self).map_err(|e| CartError::UnableToWrite(e.to_string()))
    }

    /// Load a classifier from a json string.
    ///
    /// The hyper-parameters and the tree structure are checked, so a loaded
    /// classifier never panics on prediction.
    ///
    /// * `json_str` - String object, which can be serialized to json.
    pub fn from_json(json_str: &str) -> Result<Self, CartError> {
        let model = serde_json::from_str::<Self>(json_str).map_err(|e| CartError::UnableToRead(e.to_string()))?;
        model.cfg.validate()?;
        if let Some(tree) = &model.tree {
            tree.validate(model.n_features)?;
        }
        Ok(model)
    }

    fn fitted_tree(&self, data: &Dataset) -> Result<&Tree, CartError> {
        let tree = self.tree.as_ref().ok_or(CartError::NotTrained)?;
        if !data.is_empty() && data.num_columns() != self.n_features {
            return Err(CartError::InvalidInput(format!(
                "expected {} features, found {}",
                self.n_features,
                data.num_columns()
            )));
        }
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;
    use crate::impurity::Criterion;
    use crate::node::Node;

    fn row(v: &[f64]) -> Vec<Value> {
        v.iter().map(|x| Value::from(*x)).collect()
    }

    fn scenario() -> Dataset {
        Dataset::labeled(vec![row(&[1., 5.]), row(&[1., 5.]), row(&[9., 1.])], vec!["a", "a", "b"]).unwrap()
    }

    // Two interleaved classes on a continuous feature plus a noisy categorical one.
    fn mixed(n: usize) -> Dataset {
        let rows = (0..n)
            .map(|i| {
                vec![
                    Value::from(((i * 37) % 101) as f64),
                    Value::from(["north", "south", "east", "west"][i % 4]),
                    Value::from(((i * 7) % 13) as f64 / 13.0),
                ]
            })
            .collect();
        let labels: Vec<String> = (0..n)
            .map(|i| {
                let x = (i * 37) % 101;
                if x < 30 {
                    "low".to_string()
                } else if x < 70 || i % 4 == 0 {
                    "mid".to_string()
                } else {
                    "high".to_string()
                }
            })
            .collect();
        Dataset::labeled(rows, labels).unwrap()
    }

    #[test]
    fn test_scenario_split() {
        let cfg = TreeConfig::default().set_max_leaf_size(1).set_min_purity_increase(0.0);
        let mut model = ClassificationTree::new(cfg).unwrap();
        assert!(!model.trained());
        model.train(&scenario()).unwrap();
        assert!(model.trained());

        let test = Dataset::unlabeled(vec![row(&[1., 5.]), row(&[9., 1.])]).unwrap();
        assert_eq!(model.predict(&test, false).unwrap(), vec!["a", "b"]);
        assert_eq!(model.classes(), &["a".to_string(), "b".to_string()]);
        assert_eq!(
            model.probability(&test, false).unwrap(),
            vec![vec![1.0, 0.0], vec![0.0, 1.0]]
        );
        assert_eq!(model.depth().unwrap(), 1);
        assert_eq!(model.n_nodes().unwrap(), 3);
    }

    #[test]
    fn test_not_trained() {
        let model = ClassificationTree::default();
        let test = Dataset::unlabeled(vec![row(&[1., 5.])]).unwrap();
        assert_eq!(model.predict(&test, false), Err(CartError::NotTrained));
        assert_eq!(model.probability(&test, true), Err(CartError::NotTrained));
        assert_eq!(model.feature_importances(), Err(CartError::NotTrained));
        assert_eq!(model.rules(), Err(CartError::NotTrained));
    }

    #[test]
    fn test_invalid_training_input() {
        let mut model = ClassificationTree::default();
        let unlabeled = Dataset::unlabeled(vec![row(&[1., 5.])]).unwrap();
        assert!(matches!(model.train(&unlabeled), Err(CartError::InvalidInput(_))));

        let empty = Dataset::labeled(Vec::new(), Vec::<String>::new()).unwrap();
        assert!(matches!(model.train(&empty), Err(CartError::InvalidInput(_))));

        let no_features = Dataset::labeled(vec![Vec::new()], vec!["a"]).unwrap();
        assert!(matches!(model.train(&no_features), Err(CartError::InvalidInput(_))));
        assert!(!model.trained());
    }

    #[test]
    fn test_failed_retrain_keeps_previous_tree() {
        let mut model = ClassificationTree::new(TreeConfig::default().set_max_leaf_size(1)).unwrap();
        model.train(&scenario()).unwrap();
        let before = model.clone();
        let unlabeled = Dataset::unlabeled(vec![row(&[1., 5.])]).unwrap();
        assert!(model.train(&unlabeled).is_err());
        assert_eq!(model, before);
    }

    #[test]
    fn test_predict_wrong_width() {
        let mut model = ClassificationTree::default();
        model.train(&scenario()).unwrap();
        let test = Dataset::unlabeled(vec![row(&[1.])]).unwrap();
        assert!(matches!(model.predict(&test, false), Err(CartError::InvalidInput(_))));
    }

    #[test]
    fn test_invalid_params() {
        let err = ClassificationTree::new(TreeConfig::default().set_max_leaf_size(0)).unwrap_err();
        assert!(matches!(err, CartError::InvalidParameter(..)));
    }

    #[test]
    fn test_single_class_is_single_leaf() {
        let data = Dataset::labeled(vec![row(&[1.]), row(&[2.]), row(&[3.]), row(&[4.])], vec!["z"; 4]).unwrap();
        let mut model = ClassificationTree::new(TreeConfig::default().set_max_leaf_size(1)).unwrap();
        model.train(&data).unwrap();
        assert!(matches!(model.tree().unwrap().nodes[..], [Node::Outcome(_)]));
        assert_eq!(model.depth().unwrap(), 0);
        assert_eq!(model.predict(&data, false).unwrap(), vec!["z"; 4]);
    }

    #[test]
    fn test_training_rows_follow_their_split() {
        let data = mixed(200);
        for criterion in [Criterion::Gini, Criterion::Entropy] {
            let cfg = TreeConfig::default()
                .set_max_leaf_size(1)
                .set_min_purity_increase(0.0)
                .set_criterion(criterion);
            let mut model = ClassificationTree::new(cfg).unwrap();
            model.train(&data).unwrap();
            let tree = model.tree().unwrap();

            // Every training row lands in a leaf that saw its label.
            let labels = data.labels().unwrap();
            for (i, r) in data.rows().iter().enumerate() {
                let leaf = tree.leaf(r);
                assert!(leaf.probabilities.contains_key(&labels[i]));
            }

            // Rows are separable, so a fully grown tree fits the training data.
            let preds = model.predict(&data, true).unwrap();
            let correct = preds.iter().zip(labels).filter(|(p, l)| p == l).count();
            assert!(correct as f64 / data.num_rows() as f64 > 0.95);
        }
    }

    #[test]
    fn test_probabilities_are_dense_and_normalized() {
        let data = mixed(150);
        let cfg = TreeConfig::default().set_max_depth(3).set_max_leaf_size(5);
        let mut model = ClassificationTree::new(cfg).unwrap();
        model.train(&data).unwrap();
        let probs = model.probability(&data, false).unwrap();
        assert_eq!(probs.len(), data.num_rows());
        for p in probs {
            assert_eq!(p.len(), model.classes().len());
            assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            assert!(p.iter().all(|v| (0.0..=1.0).contains(v)));
        }
        assert!(model.depth().unwrap() <= 3);
    }

    #[test]
    fn test_same_seed_same_tree() {
        let data = mixed(120);
        let cfg = TreeConfig::default()
            .set_max_features(Some(1))
            .set_max_leaf_size(2)
            .set_seed(11);
        let mut a = ClassificationTree::new(cfg.clone()).unwrap();
        let mut b = ClassificationTree::new(cfg).unwrap();
        a.train(&data).unwrap();
        b.train(&data).unwrap();
        assert_eq!(a.tree(), b.tree());

        // Retraining rebuilds from scratch with the same seed.
        let first = a.tree().cloned();
        a.train(&data).unwrap();
        assert_eq!(a.tree().cloned(), first);
    }

    #[test]
    fn test_high_min_purity_increase_single_leaf() {
        let cfg = TreeConfig::default().set_min_purity_increase(1e6).set_max_leaf_size(1);
        let mut model = ClassificationTree::new(cfg).unwrap();
        model.train(&mixed(80)).unwrap();
        assert_eq!(model.n_leaves().unwrap(), 1);
        assert_eq!(model.feature_importances().unwrap(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_feature_importances() {
        let mut model = ClassificationTree::new(TreeConfig::default().set_max_leaf_size(1)).unwrap();
        model.train(&mixed(200)).unwrap();
        let importances = model.feature_importances().unwrap();
        assert_eq!(importances.len(), 3);
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(importances[0] > importances[2]);
    }

    #[test]
    fn test_json_round_trip() {
        let mut model = ClassificationTree::new(TreeConfig::default().set_max_depth(4)).unwrap();
        model.train(&mixed(60)).unwrap();
        let loaded = ClassificationTree::from_json(&model.json_dump().unwrap()).unwrap();
        assert_eq!(loaded.params(), model.params());
        let data = mixed(60);
        assert_eq!(loaded.predict(&data, false).unwrap(), model.predict(&data, false).unwrap());
        assert!(matches!(
            ClassificationTree::from_json("{not json"),
            Err(CartError::UnableToRead(_))
        ));
    }

    // Sorted feature with alternating labels: the tree peels one row per level.
    fn alternating(n: usize) -> Dataset {
        let rows = (0..n).map(|i| row(&[i as f64])).collect();
        let labels: Vec<&str> = (0..n).map(|i| ["a", "b"][i % 2]).collect();
        Dataset::labeled(rows, labels).unwrap()
    }

    #[test]
    fn test_deep_tree_trains() {
        let data = alternating(20_000);
        let mut model = ClassificationTree::default();
        model.train(&data).unwrap();
        assert!(model.depth().unwrap() > 10_000);
        let head = Dataset::unlabeled((0..6).map(|i| row(&[i as f64])).collect()).unwrap();
        assert_eq!(model.predict(&head, false).unwrap(), vec!["a", "b", "a", "b", "a", "b"]);
    }

    #[test]
    fn test_deep_tree_json_round_trip() {
        let data = alternating(200);
        let mut model = ClassificationTree::new(TreeConfig::default().set_max_leaf_size(1)).unwrap();
        model.train(&data).unwrap();
        assert_eq!(model.depth().unwrap(), 199);

        let loaded = ClassificationTree::from_json(&model.json_dump().unwrap()).unwrap();
        assert_eq!(loaded, model);
        assert_eq!(loaded.predict(&data, false).unwrap(), data.labels().unwrap().to_vec());
    }

    #[test]
    fn test_from_json_rejects_broken_tree() {
        let mut model = ClassificationTree::new(TreeConfig::default().set_max_leaf_size(1)).unwrap();
        model.train(&scenario()).unwrap();

        let mut bad_feature = model.clone();
        if let Some(Node::Split(s)) = bad_feature.tree.as_mut().map(|t| &mut t.nodes[0]) {
            s.feature = 7;
        }
        let json = bad_feature.json_dump().unwrap();
        assert!(matches!(ClassificationTree::from_json(&json), Err(CartError::UnableToRead(_))));

        let mut bad_child = model.clone();
        if let Some(Node::Split(s)) = bad_child.tree.as_mut().map(|t| &mut t.nodes[0]) {
            s.right_child = 99;
        }
        let json = bad_child.json_dump().unwrap();
        assert!(matches!(ClassificationTree::from_json(&json), Err(CartError::UnableToRead(_))));

        let mut no_nodes = model.clone();
        if let Some(t) = no_nodes.tree.as_mut() {
            t.nodes.clear();
            t.n_leaves = 0;
        }
        let json = no_nodes.json_dump().unwrap();
        assert!(matches!(ClassificationTree::from_json(&json), Err(CartError::UnableToRead(_))));
    }
}
