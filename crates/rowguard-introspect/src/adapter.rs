use async_trait::async_trait;

use rowguard_core::{Result, TableSchema};

/// Trait implemented by database adapters that can introspect a table.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Returns the engine identifier (e.g. `mysql`).
    fn engine(&self) -> &'static str;

    /// Introspect one table and return its schema descriptor.
    async fn table_schema(&self, table: &str) -> Result<TableSchema>;
}
