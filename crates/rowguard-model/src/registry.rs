use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use sqlx::MySqlPool;

use rowguard_core::{Result, TableSchema};
use rowguard_introspect::{Adapter, MySqlAdapter};

use crate::datastore::Datastore;
use crate::model::Model;

const DEFAULT_TTL_MINUTES: u64 = 60;

/// One descriptor per table, introspected lazily and never mutated.
///
/// The registry is the single owner of schema state: first touch reads
/// the datastore cache, falls back to live introspection, writes the
/// cache back, and memoizes in-process. Racing informs are idempotent —
/// both sides derive the same descriptor from the same schema.
pub struct ModelRegistry {
    pool: MySqlPool,
    adapter: Arc<dyn Adapter>,
    store: Arc<dyn Datastore>,
    cache_ttl_minutes: u64,
    descriptors: Mutex<HashMap<String, Arc<TableSchema>>>,
}

impl ModelRegistry {
    /// Registry over a MySQL pool with the default introspection adapter.
    pub fn new(pool: MySqlPool, store: Arc<dyn Datastore>) -> Self {
        let adapter = Arc::new(MySqlAdapter::new(pool.clone()));
        Self::with_adapter(pool, adapter, store)
    }

    /// Registry with an explicit adapter; the seam used by tests and
    /// non-MySQL engines.
    pub fn with_adapter(
        pool: MySqlPool,
        adapter: Arc<dyn Adapter>,
        store: Arc<dyn Datastore>,
    ) -> Self {
        ModelRegistry {
            pool,
            adapter,
            store,
            cache_ttl_minutes: DEFAULT_TTL_MINUTES,
            descriptors: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache_ttl_minutes(mut self, minutes: u64) -> Self {
        self.cache_ttl_minutes = minutes;
        self
    }

    /// Per-table model handle; informs on first touch.
    pub async fn model(&self, table: &str) -> Result<Model> {
        let schema = self.descriptor(table).await?;
        Ok(Model::new(schema, self.pool.clone()))
    }

    /// The shared, immutable descriptor for a table.
    pub async fn descriptor(&self, table: &str) -> Result<Arc<TableSchema>> {
        if let Some(schema) = self.lock().get(table).cloned() {
            return Ok(schema);
        }

        let key = cache_key(table);
        if let Some(payload) = self.store.read(&key).await {
            match serde_json::from_str::<TableSchema>(&payload) {
                Ok(schema) => {
                    tracing::debug!(table, "schema cache hit");
                    let schema = Arc::new(schema);
                    self.lock().insert(table.to_string(), schema.clone());
                    return Ok(schema);
                }
                Err(err) => {
                    tracing::warn!(table, %err, "discarding unreadable schema cache entry");
                }
            }
        }

        tracing::debug!(table, engine = self.adapter.engine(), "schema cache miss");
        let schema = self.adapter.table_schema(table).await?;

        match serde_json::to_string(&schema) {
            // The write is fire-and-forget; a failed cache write only
            // costs a re-introspection later.
            Ok(payload) => self.store.write(&key, payload, self.cache_ttl_minutes).await,
            Err(err) => tracing::warn!(table, %err, "schema descriptor did not serialize"),
        }

        let schema = Arc::new(schema);
        self.lock().insert(table.to_string(), schema.clone());
        Ok(schema)
    }

    /// Drop the in-process entry for a table, forcing the next touch to
    /// re-read the datastore or the database.
    pub fn forget(&self, table: &str) {
        self.lock().remove(table);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<TableSchema>>> {
        match self.descriptors.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn cache_key(table: &str) -> String {
    format!("{table}.model-cache")
}
