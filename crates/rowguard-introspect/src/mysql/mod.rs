use async_trait::async_trait;
use sqlx::MySqlPool;

use rowguard_core::{Error, Result, TableSchema};

use crate::adapter::Adapter;

mod mapper;
mod queries;

/// Adapter for MySQL databases.
#[derive(Debug, Clone)]
pub struct MySqlAdapter {
    pool: MySqlPool,
}

impl MySqlAdapter {
    /// Create a new adapter using a pre-configured pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Adapter for MySqlAdapter {
    fn engine(&self) -> &'static str {
        "mysql"
    }

    async fn table_schema(&self, table: &str) -> Result<TableSchema> {
        introspect_table(&self.pool, table).await
    }
}

/// Introspect one table of the pool's current database.
pub async fn introspect_table(pool: &MySqlPool, table: &str) -> Result<TableSchema> {
    let raw_columns = queries::list_columns(pool, table).await?;
    if raw_columns.is_empty() {
        return Err(Error::InvalidSchema(format!(
            "table `{table}` does not exist in the connected database"
        )));
    }
    let columns = mapper::map_columns(raw_columns)?;

    let raw_constraints = queries::list_constraints(pool, table).await?;
    let constraints = mapper::map_constraints(raw_constraints)?;

    tracing::debug!(table, columns = columns.len(), "introspected table");
    TableSchema::assemble(table, columns, constraints)
}
