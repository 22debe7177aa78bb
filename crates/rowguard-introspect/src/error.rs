use rowguard_core::Error;

/// Fallback SQLSTATE when the driver reports no code.
const GENERIC_SQLSTATE: &str = "HY000";

/// Translate a driver failure into the domain error, exactly once, at the
/// query-execution boundary. No raw `sqlx` error leaks past this point.
pub fn translate_db_error(err: sqlx::Error) -> Error {
    match err.as_database_error() {
        Some(db) => Error::Db {
            code: db
                .code()
                .map(|code| code.to_string())
                .unwrap_or_else(|| GENERIC_SQLSTATE.to_string()),
            message: db.message().to_string(),
        },
        None => Error::Db {
            code: GENERIC_SQLSTATE.to_string(),
            message: err.to_string(),
        },
    }
}
