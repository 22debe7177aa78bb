use std::sync::{Arc, Mutex};

use sqlx::mysql::{MySql, MySqlArguments, MySqlRow};
use sqlx::query::Query;
use sqlx::{MySqlPool, Row};

use rowguard_core::{Column, Error, Result, TableSchema, TypeFamily, Value};
use rowguard_introspect::translate_db_error;

use crate::record::Record;
use crate::sql;

/// Outcome of a write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exec {
    pub rows_affected: u64,
    pub last_insert_id: Option<u64>,
}

/// Result of the routing finder: one row or a collection.
#[derive(Debug)]
pub enum Found {
    One(Option<Record>),
    Many(Vec<Record>),
}

/// Per-table handle: an immutable schema descriptor plus the shared pool.
///
/// Handles are cheap to clone; the descriptor is shared, and the last
/// synthesized SQL text is kept for diagnostics.
#[derive(Clone)]
pub struct Model {
    schema: Arc<TableSchema>,
    pool: MySqlPool,
    last_query: Arc<Mutex<Option<String>>>,
}

impl Model {
    pub(crate) fn new(schema: Arc<TableSchema>, pool: MySqlPool) -> Self {
        Model {
            schema,
            pool,
            last_query: Arc::new(Mutex::new(None)),
        }
    }

    /// Fresh, empty record for this table.
    pub fn record(&self) -> Record {
        Record::new(self.schema.clone())
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// The column set, for consumers that enumerate fields (form builders)
    /// without re-querying the schema.
    pub fn definition(&self) -> &[Column] {
        &self.schema.columns
    }

    pub fn list_columns(&self, exclude: &[&str]) -> Vec<&Column> {
        self.schema.list_columns(exclude)
    }

    /// SQL text of the most recently executed statement.
    pub fn last_query(&self) -> Option<String> {
        match self.last_query.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn remember(&self, sql: &str) {
        let mut guard = match self.last_query.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(sql.to_string());
    }

    pub async fn insert(&self, record: &Record) -> Result<Exec> {
        self.execute(sql::build_insert(record, false)).await
    }

    /// INSERT with the REPLACE keyword substituted verbatim.
    pub async fn replace(&self, record: &Record) -> Result<Exec> {
        self.execute(sql::build_insert(record, true)).await
    }

    pub async fn update(&self, record: &Record) -> Result<Exec> {
        self.execute(sql::build_update(record)?).await
    }

    pub async fn delete(&self, record: &Record) -> Result<Exec> {
        self.execute(sql::build_delete(record)?).await
    }

    async fn execute(&self, statement: sql::Statement) -> Result<Exec> {
        self.remember(&statement.sql);
        tracing::debug!(table = %self.schema.table, sql = %statement.sql, "executing statement");

        let mut query = sqlx::query(&statement.sql);
        for value in &statement.params {
            query = bind_value(query, value);
        }
        let done = query
            .execute(&self.pool)
            .await
            .map_err(translate_db_error)?;

        Ok(Exec {
            rows_affected: done.rows_affected(),
            last_insert_id: match done.last_insert_id() {
                0 => None,
                id => Some(id),
            },
        })
    }

    /// Fetch at most one row. `*` in the SQL expands to the explicit
    /// column list minus `exclude`; the hydrated record arrives clean.
    pub async fn find_one(
        &self,
        raw_sql: &str,
        params: Vec<Value>,
        exclude: &[&str],
    ) -> Result<Option<Record>> {
        let expanded = sql::expand_select(&self.schema, raw_sql, exclude);
        self.remember(&expanded);
        tracing::debug!(table = %self.schema.table, sql = %expanded, "fetching one row");

        let mut query = sqlx::query(&expanded);
        for value in &params {
            query = bind_value(query, value);
        }
        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(translate_db_error)?;

        row.map(|row| self.hydrate(&row)).transpose()
    }

    /// Fetch every matching row; one record per row.
    pub async fn find_all(
        &self,
        raw_sql: &str,
        params: Vec<Value>,
        exclude: &[&str],
    ) -> Result<Vec<Record>> {
        let expanded = sql::expand_select(&self.schema, raw_sql, exclude);
        self.remember(&expanded);
        tracing::debug!(table = %self.schema.table, sql = %expanded, "fetching rows");

        let mut query = sqlx::query(&expanded);
        for value in &params {
            query = bind_value(query, value);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(translate_db_error)?;

        rows.iter().map(|row| self.hydrate(row)).collect()
    }

    /// Route on the literal `LIMIT 1` substring: single-row when present,
    /// collection otherwise.
    pub async fn find(&self, raw_sql: &str, params: Vec<Value>) -> Result<Found> {
        if sql::wants_single_row(raw_sql) {
            Ok(Found::One(self.find_one(raw_sql, params, &[]).await?))
        } else {
            Ok(Found::Many(self.find_all(raw_sql, params, &[]).await?))
        }
    }

    /// Single-predicate convenience finder over a named field.
    pub async fn find_one_by(&self, field: &str, value: Value) -> Result<Option<Record>> {
        let template = self.by_field_template(field, true)?;
        self.find_one(&template, vec![value], &[]).await
    }

    /// Single-predicate collection finder over a named field.
    pub async fn find_all_by(&self, field: &str, value: Value) -> Result<Vec<Record>> {
        let template = self.by_field_template(field, false)?;
        self.find_all(&template, vec![value], &[]).await
    }

    fn by_field_template(&self, field: &str, single: bool) -> Result<String> {
        if self.schema.column(field).is_none() {
            return Err(Error::UnknownField {
                table: self.schema.table.clone(),
                field: field.to_string(),
            });
        }
        let limit = if single { " LIMIT 1" } else { "" };
        Ok(format!(
            "SELECT * FROM `{}` WHERE `{field}` = ?{limit}",
            self.schema.table
        ))
    }

    /// Hydrate one result row through the trusted raw path.
    fn hydrate(&self, row: &MySqlRow) -> Result<Record> {
        let mut record = Record::new(self.schema.clone());
        for column in &self.schema.columns {
            if let Some(value) = decode_value(column, row)? {
                record.set_raw(&column.name, value);
            }
        }
        record.clean();
        Ok(record)
    }
}

fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &Value,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(flag) => query.bind(*flag),
        Value::Int(n) => query.bind(*n),
        Value::UInt(n) => query.bind(*n),
        Value::Float(v) => query.bind(*v),
        Value::Text(text) => query.bind(text.clone()),
        Value::DateTime(ts) => query.bind(*ts),
    }
}

/// Decode one column from a result row by family. Columns absent from the
/// select list are skipped, not errors.
fn decode_value(column: &Column, row: &MySqlRow) -> Result<Option<Value>> {
    let name = column.name.as_str();
    if row.try_column(name).is_err() {
        return Ok(None);
    }

    let value = match column.family {
        TypeFamily::String => row
            .try_get::<Option<String>, _>(name)
            .map(Value::from),
        TypeFamily::Number if column.type_name == "tinyint" && column.digits() == Some(1) => row
            .try_get::<Option<bool>, _>(name)
            .map(Value::from),
        TypeFamily::Number if column.type_name == "double" => row
            .try_get::<Option<f64>, _>(name)
            .map(Value::from),
        TypeFamily::Number if column.unsigned => row
            .try_get::<Option<u64>, _>(name)
            .map(Value::from),
        TypeFamily::Number => row
            .try_get::<Option<i64>, _>(name)
            .map(Value::from),
        TypeFamily::Date if column.type_name == "timestamp" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name)
            .map(|ts| Value::from(ts.map(|ts| ts.naive_utc()))),
        TypeFamily::Date => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(name)
            .map(Value::from),
    }
    .map_err(translate_db_error)?;

    Ok(Some(value))
}
