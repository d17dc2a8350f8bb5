mod constants;

// Modules
pub mod classifier;
pub mod data;
pub mod errors;
pub mod impurity;
pub mod node;
pub mod splitter;
pub mod tree;

// Individual classes, and functions
pub use classifier::config::TreeConfig;
pub use classifier::core::ClassificationTree;
pub use data::{DataType, Dataset, Value};
pub use errors::CartError;
pub use impurity::Criterion;
