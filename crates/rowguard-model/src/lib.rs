//! Runtime model layer: schema registry, record lifecycle, statement
//! synthesis, and finders.
//!
//! A [`ModelRegistry`] hands out per-table [`Model`] handles backed by an
//! immutable, cached schema descriptor. A [`Record`] is one row in flight:
//! field assignment runs through the column rule chain, write statements
//! are synthesized from the dirty set and the primary key, and finder
//! results hydrate fresh records through the trusted raw path.

pub mod datastore;
pub mod model;
pub mod record;
pub mod registry;
mod sql;

pub use datastore::{Datastore, MemoryStore, NullStore};
pub use model::{Exec, Found, Model};
pub use record::Record;
pub use registry::ModelRegistry;

pub use rowguard_core::{
    Column, ColumnFacts, Constraint, Error, KeyRole, PrimaryKey, Result, Rule, TableSchema,
    TypeFamily, Value,
};
pub use rowguard_introspect::Adapter;
