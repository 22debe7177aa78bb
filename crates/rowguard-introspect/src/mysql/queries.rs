use sqlx::{MySqlPool, Row};

use rowguard_core::Result;

use crate::error::translate_db_error;

pub struct RawColumn {
    pub name: String,
    pub default: Option<String>,
    pub nullable: String,
    pub column_type: String,
    pub key: String,
    pub extra: String,
    pub comment: String,
}

pub async fn list_columns(pool: &MySqlPool, table: &str) -> Result<Vec<RawColumn>> {
    let rows = sqlx::query(
        r"
        SELECT
          COLUMN_NAME,
          COLUMN_DEFAULT,
          IS_NULLABLE,
          COLUMN_TYPE,
          COLUMN_KEY,
          EXTRA,
          COLUMN_COMMENT
        FROM INFORMATION_SCHEMA.COLUMNS
        WHERE TABLE_SCHEMA = DATABASE()
          AND TABLE_NAME = ?
        ORDER BY ORDINAL_POSITION
        ",
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(translate_db_error)?;

    rows.into_iter()
        .map(|row| {
            Ok(RawColumn {
                name: row.try_get("COLUMN_NAME").map_err(translate_db_error)?,
                default: row.try_get("COLUMN_DEFAULT").map_err(translate_db_error)?,
                nullable: row.try_get("IS_NULLABLE").map_err(translate_db_error)?,
                column_type: row.try_get("COLUMN_TYPE").map_err(translate_db_error)?,
                key: row.try_get("COLUMN_KEY").map_err(translate_db_error)?,
                extra: row.try_get("EXTRA").map_err(translate_db_error)?,
                comment: row.try_get("COLUMN_COMMENT").map_err(translate_db_error)?,
            })
        })
        .collect()
}

pub struct RawConstraint {
    pub name: String,
    pub constraint_type: String,
}

pub async fn list_constraints(pool: &MySqlPool, table: &str) -> Result<Vec<RawConstraint>> {
    let rows = sqlx::query(
        r"
        SELECT
          CONSTRAINT_NAME,
          CONSTRAINT_TYPE
        FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS
        WHERE TABLE_SCHEMA = DATABASE()
          AND TABLE_NAME = ?
        ORDER BY CONSTRAINT_NAME
        ",
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(translate_db_error)?;

    rows.into_iter()
        .map(|row| {
            Ok(RawConstraint {
                name: row.try_get("CONSTRAINT_NAME").map_err(translate_db_error)?,
                constraint_type: row.try_get("CONSTRAINT_TYPE").map_err(translate_db_error)?,
            })
        })
        .collect()
}
