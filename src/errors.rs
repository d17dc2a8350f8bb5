//! Errors
//!
//! Custom error types used throughout the `cartree` crate.
use thiserror::Error;

/// Errors that can occur while configuring, training or querying a tree.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// The dataset cannot be used for the requested operation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Inference was requested before a tree was trained.
    #[error("The estimator has not been trained.")]
    NotTrained,
    /// First value is the name of the parameter, second is expected, third is what was passed.
    #[error("Invalid parameter value passed for {0}, expected {1} but {2} provided.")]
    InvalidParameter(String, String, String),
    /// Unable to serialize the model.
    #[error("Unable to write model: {0}")]
    UnableToWrite(String),
    /// Unable to deserialize the model.
    #[error("Unable to read model: {0}")]
    UnableToRead(String),
}
