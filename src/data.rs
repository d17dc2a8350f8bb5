//! Data
//!
//! Row-oriented dataset container consumed by the tree learner. Every column has
//! a fixed [`DataType`], checked once when the dataset is built.
use crate::errors::CartError;
use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Type tag of a column.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum DataType {
    /// Discrete tokens compared by equality.
    Categorical,
    /// Real numbers compared by `<=`.
    Continuous,
}

impl Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DataType::Categorical => write!(f, "categorical"),
            DataType::Continuous => write!(f, "continuous"),
        }
    }
}

/// A single feature value.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub enum Value {
    Categorical(String),
    Continuous(f64),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Categorical(_) => DataType::Categorical,
            Value::Continuous(_) => DataType::Continuous,
        }
    }

    /// Whether this value is routed to the left child of a split on `split_value`.
    ///
    /// Continuous splits send `v <= threshold` left, categorical splits send
    /// `v == token` left. Anything else, including NaN and values of the other
    /// type, goes right, so every value resolves to exactly one branch.
    pub fn goes_left(&self, split_value: &Value) -> bool {
        match (split_value, self) {
            (Value::Continuous(threshold), Value::Continuous(v)) => v <= threshold,
            (Value::Categorical(token), Value::Categorical(v)) => v == token,
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Continuous(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Categorical(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Categorical(v)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Categorical(v) => write!(f, "{}", v),
            Value::Continuous(v) => write!(f, "{}", v),
        }
    }
}

/// Rows of feature values with an optional parallel label per row.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    rows: Vec<Vec<Value>>,
    labels: Option<Vec<String>>,
    column_types: Vec<DataType>,
}

impl Dataset {
    /// Build a labeled dataset.
    ///
    /// * `rows` - Feature rows, all of the same width and per-column type.
    /// * `labels` - One label per row.
    pub fn labeled<L: Into<String>>(rows: Vec<Vec<Value>>, labels: Vec<L>) -> Result<Self, CartError> {
        if rows.len() != labels.len() {
            return Err(CartError::InvalidInput(format!(
                "number of labels ({}) must equal the number of rows ({})",
                labels.len(),
                rows.len()
            )));
        }
        let column_types = infer_column_types(&rows)?;
        Ok(Dataset {
            rows,
            labels: Some(labels.into_iter().map(Into::into).collect()),
            column_types,
        })
    }

    /// Build a dataset without labels, as used for inference.
    pub fn unlabeled(rows: Vec<Vec<Value>>) -> Result<Self, CartError> {
        let column_types = infer_column_types(&rows)?;
        Ok(Dataset {
            rows,
            labels: None,
            column_types,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.column_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_labeled(&self) -> bool {
        self.labels.is_some()
    }

    pub fn column_type(&self, col: usize) -> Option<DataType> {
        self.column_types.get(col).copied()
    }

    pub fn column_types(&self) -> &[DataType] {
        &self.column_types
    }

    pub fn row(&self, i: usize) -> &[Value] {
        &self.rows[i]
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }

    /// Distinct labels in order of first occurrence. Empty for unlabeled data.
    pub fn possible_outcomes(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.labels
            .iter()
            .flatten()
            .filter(|l| seen.insert(l.as_str()))
            .cloned()
            .collect()
    }

    /// Copy the rows (and labels) at `index` into a new dataset, in the order given.
    pub fn subset(&self, index: &[usize]) -> Dataset {
        Dataset {
            rows: index.iter().map(|i| self.rows[*i].clone()).collect(),
            labels: self
                .labels
                .as_ref()
                .map(|labels| index.iter().map(|i| labels[*i].clone()).collect()),
            column_types: self.column_types.clone(),
        }
    }

    /// Split into a head holding `ratio` of the rows and a tail with the rest.
    pub fn split(&self, ratio: f64) -> Result<(Dataset, Dataset), CartError> {
        validate_ratio(ratio)?;
        let n_left = (ratio * self.num_rows() as f64).floor() as usize;
        let index: Vec<usize> = (0..self.num_rows()).collect();
        Ok((self.subset(&index[..n_left]), self.subset(&index[n_left..])))
    }

    /// Split so that each label keeps its proportion on both sides.
    ///
    /// Rows are grouped by label in order of first occurrence and each group is
    /// split at `ratio`.
    pub fn stratified_split(&self, ratio: f64) -> Result<(Dataset, Dataset), CartError> {
        validate_ratio(ratio)?;
        let labels = self
            .labels
            .as_ref()
            .ok_or_else(|| CartError::InvalidInput("stratified split requires a labeled dataset".to_string()))?;

        let mut strata: Vec<Vec<usize>> = Vec::new();
        let mut stratum_of: HashMap<&str, usize> = HashMap::new();
        for (i, label) in labels.iter().enumerate() {
            let s = *stratum_of.entry(label.as_str()).or_insert_with(|| {
                strata.push(Vec::new());
                strata.len() - 1
            });
            strata[s].push(i);
        }

        let mut left = Vec::new();
        let mut right = Vec::new();
        for stratum in strata {
            let n_left = (ratio * stratum.len() as f64).floor() as usize;
            left.extend_from_slice(&stratum[..n_left]);
            right.extend_from_slice(&stratum[n_left..]);
        }
        Ok((self.subset(&left), self.subset(&right)))
    }
}

fn validate_ratio(ratio: f64) -> Result<(), CartError> {
    if ratio > 0.0 && ratio < 1.0 {
        Ok(())
    } else {
        Err(CartError::InvalidParameter(
            "ratio".to_string(),
            "a value between 0 and 1".to_string(),
            ratio.to_string(),
        ))
    }
}

fn infer_column_types(rows: &[Vec<Value>]) -> Result<Vec<DataType>, CartError> {
    let column_types: Vec<DataType> = match rows.first() {
        Some(first) => first.iter().map(Value::data_type).collect(),
        None => return Ok(Vec::new()),
    };
    for (i, row) in rows.iter().enumerate() {
        if row.len() != column_types.len() {
            return Err(CartError::InvalidInput(format!(
                "row {} has {} columns, expected {}",
                i,
                row.len(),
                column_types.len()
            )));
        }
        for (j, (v, t)) in row.iter().zip(&column_types).enumerate() {
            if v.data_type() != *t {
                return Err(CartError::InvalidInput(format!(
                    "column {} is {} but row {} holds a {} value",
                    j,
                    t,
                    i,
                    v.data_type()
                )));
            }
        }
    }
    Ok(column_types)
}
