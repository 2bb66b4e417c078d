//! Error types for parsing operation logs.

use thiserror::Error;

/// Errors raised while reading a serialized delta.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DeltaError {
    /// The input was not valid JSON.
    #[error("malformed delta json: {0}")]
    Json(#[from] serde_json::Error),

    /// The top-level JSON value was not an array.
    #[error("delta must be a json array, found {found}")]
    NotAnArray { found: &'static str },

    /// An array element was not a well-formed operation.
    #[error("invalid operation at index {index}: {reason}")]
    InvalidOp { index: usize, reason: String },

    /// A document may only hold inserts.
    #[error("document contains a `{kind}` operation at index {index}")]
    NotADocument { index: usize, kind: &'static str },
}

/// Shape problems in a single operation object.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum OpShapeError {
    #[error("operation has none of insert/delete/retain")]
    Empty,

    #[error("operation mixes `{0}` and `{1}`")]
    Mixed(&'static str, &'static str),

    #[error("`{0}` length must be positive")]
    ZeroLength(&'static str),

    #[error("insert must be a string or a single-key embed object")]
    BadInsert,

    #[error("delete cannot carry attributes")]
    AttributedDelete,
}
