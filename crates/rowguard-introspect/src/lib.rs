//! Database introspection adapters.
//!
//! Reads a table's `INFORMATION_SCHEMA` facts and hydrates the immutable
//! descriptor the model layer runs on.

pub mod adapter;
pub mod error;
pub mod mysql;

pub use adapter::Adapter;
pub use error::translate_db_error;
pub use mysql::{MySqlAdapter, introspect_table};

pub use rowguard_core::TableSchema;
