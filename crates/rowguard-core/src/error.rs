use thiserror::Error;

/// Core error type shared across rowguard crates.
///
/// Schema and configuration problems are fatal for the affected table and
/// must not be retried; `Db` wraps a driver failure translated at the
/// execution boundary. Validation failures are not errors; they accumulate
/// on the record being edited.
#[derive(Debug, Error)]
pub enum Error {
    /// A column declares a type the engine does not classify.
    #[error("unrecognized column type `{column_type}` for column `{column}`")]
    UnrecognizedType { column: String, column_type: String },
    /// The schema violates an invariant (naming convention, key shape, DSL).
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// A field name that does not exist on the table.
    #[error("unknown field `{field}` on `{table}`")]
    UnknownField { table: String, field: String },
    /// UPDATE/DELETE was requested for a table with no primary key.
    #[error("`{table}` has no primary key; cannot build {statement}")]
    MissingPrimaryKey {
        table: String,
        statement: &'static str,
    },
    /// UPDATE was requested but no field has been modified.
    #[error("no modified fields on `{table}`; nothing to update")]
    NothingToUpdate { table: String },
    /// A key column has no value on the record being written.
    #[error("missing value for key column `{column}` on `{table}`")]
    MissingKeyValue { table: String, column: String },
    /// Driver failure, normalized to an SQLSTATE-style code and message.
    #[error("database error [{code}]: {message}")]
    Db { code: String, message: String },
}

/// Convenience alias for results returned by rowguard crates.
pub type Result<T> = std::result::Result<T, Error>;
