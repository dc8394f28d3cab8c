//! Resolver logic as data.
//!
//! Schema authors build [`Remote`] expressions: immutable trees that describe a computation over
//! the per-field evaluation context without ever running it. [`Remote::materialize`] lowers a
//! finished tree into an [`Expression`], the portable form the interpreter consumes. Building
//! and evaluating are two disjoint phases; nothing in this crate reads a context.

mod expr;
mod expression;
mod materialize;
mod ops;
mod path;
mod remote;
mod ty;

pub use expr::{BindingId, Expr, Root};
pub use expression::{ContextPath, Expression, PathRoot};
pub use materialize::MaterializeError;
pub use ops::{BinaryOp, UnaryOp};
pub use path::PathSegment;
pub use remote::Remote;
pub use ty::{Typed, ValueType};
