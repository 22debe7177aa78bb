//! Core contracts for the rowguard model engine.
//!
//! This crate defines the schema facts read from MySQL's
//! `INFORMATION_SCHEMA`, the validation rules derived from them, and the
//! error type shared across the workspace. It knows nothing about the
//! database driver; the `rowguard-introspect` crate feeds it raw rows and
//! the `rowguard-model` crate consumes the assembled descriptors.

pub mod column;
pub mod constraint;
pub mod error;
pub mod rules;
pub mod schema;
pub mod value;

pub use column::{Column, ColumnFacts, KeyRole, TypeFamily};
pub use constraint::{Constraint, ConstraintKind, Relation};
pub use error::{Error, Result};
pub use rules::Rule;
pub use schema::{PrimaryKey, TableSchema};
pub use value::Value;
