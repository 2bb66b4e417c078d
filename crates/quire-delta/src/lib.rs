//! quire-delta: the operation log behind the editor.
//!
//! This crate provides:
//! - `Op` - a single insert, delete, or retain with optional attributes
//! - `Delta` - an ordered, canonicalised sequence of ops
//! - `AttributeMap` and attribute composition
//! - `OpIterator` for walking ops in arbitrary-length chunks
//!
//! Lengths are measured in Unicode scalar values. Every embed has length 1.

pub mod attributes;
pub mod delta;
pub mod error;
pub mod iter;
pub mod op;

pub use attributes::{AttributeMap, is_removal};
pub use delta::Delta;
pub use error::{DeltaError, OpShapeError};
pub use iter::OpIterator;
pub use op::{Embed, Insert, Op, OpKind};
pub use smol_str::SmolStr;
