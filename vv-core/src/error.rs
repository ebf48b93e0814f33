//! Error types for vv

use thiserror::Error;

/// Main error type for vv core operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Attribute '{name}' has {actual} values, expected {expected}")]
    AttributeLength {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Attribute '{name}' has invalid component count {components}")]
    AttributeComponents { name: String, components: usize },

    #[error("Visualization error: {0}")]
    Visualization(String),
}
