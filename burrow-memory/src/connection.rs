use crate::{MemoryConfig, MemoryDriver, MemoryMode, MemorySession, StoredRow};
use burrow_core::{
    Connection, Context, Converter, Cursor, DeleteQuery, Driver, Entity, Error, Executor, Field,
    Page, Query, Result, StoreError, TemporalTextWriter, UuidTextWriter, Value, ValueKind,
    WriterRegistry, truncate_long,
};
use std::{borrow::Cow, collections::HashSet, sync::Arc, time::Duration};
use tokio::time::Instant;
use uuid::Uuid;

/// Connection to an in memory store. Clones share the store.
#[derive(Clone)]
pub struct MemoryConnection {
    session: Arc<MemorySession>,
    executor: Executor<MemorySession>,
}

impl MemoryConnection {
    /// Writers of the store: temporal values and uuids become text, decimals stay numeric so
    /// that ranges compare by value.
    pub fn default_registry() -> WriterRegistry {
        let temporal = Arc::new(TemporalTextWriter);
        WriterRegistry::builder()
            .kind(ValueKind::Date, temporal.clone())
            .kind(ValueKind::Time, temporal.clone())
            .kind(ValueKind::Timestamp, temporal.clone())
            .kind(ValueKind::TimestampWithTimezone, temporal)
            .kind(ValueKind::Uuid, Arc::new(UuidTextWriter))
            .build()
    }

    pub async fn connect(url: Cow<'static, str>) -> Result<Self> {
        Self::connect_with_registry(url, Self::default_registry()).await
    }

    pub async fn connect_with_registry(
        url: Cow<'static, str>,
        registry: WriterRegistry,
    ) -> Result<Self> {
        let context = || format!("While connecting to `{}`", truncate_long!(url));
        let config = MemoryConfig::from_url(&url).with_context(context)?;
        log::debug!("Opening the memory store `{}`", config.name);
        Ok(Self::with_config(config, registry))
    }

    pub fn with_config(config: MemoryConfig, registry: WriterRegistry) -> Self {
        let converter = Arc::new(Converter::new(Arc::new(registry), config.converter));
        let paging = config.paging;
        let session = Arc::new(MemorySession::new(config, converter.clone()));
        let executor = Executor::new(session.clone(), converter).with_mode(paging);
        Self { session, executor }
    }

    pub fn config(&self) -> &MemoryConfig {
        self.session.config()
    }

    pub fn executor(&self) -> &Executor<MemorySession> {
        &self.executor
    }

    fn converter(&self) -> &Converter {
        self.executor.converter()
    }

    fn execution_error(&self, collection: &str, action: &str, detail: impl Into<String>) -> Error {
        let error = Error::new(StoreError::execution(MemoryDriver::NAME, detail))
            .context(format!("While {} `{}`", action, collection));
        log::error!("{:#}", error);
        error
    }

    fn ensure_open(&self, collection: &str, action: &str) -> Result<()> {
        self.session
            .ensure_open()
            .map_err(|e| self.execution_error(collection, action, format!("{:#}", e)))
    }

    /// Upsert shared by every write. An update requires a live row with the same key.
    async fn write(
        &self,
        mut entity: Entity,
        ttl: Option<Duration>,
        update: bool,
    ) -> Result<Entity> {
        let collection = entity.require_collection()?.to_string();
        let config = self.config();
        let key_field = if update {
            Some(Converter::require_identity(&entity, &config.key)?)
        } else {
            entity.find(&config.key).filter(|v| !v.value.is_null())
        };
        let (key, key_value) = match key_field {
            Some(field) => {
                let key = field.value.to_text().ok_or_else(|| {
                    Error::new(StoreError::Conversion {
                        kind: field.value.kind(),
                        detail: format!("the key field `{}` must be a scalar", config.key),
                    })
                })?;
                (key, field.value.clone())
            }
            None => {
                let key = Uuid::new_v4().to_string();
                (key.clone(), Value::Varchar(Some(key)))
            }
        };
        let body = self
            .converter()
            .to_native_excluding(&entity, &[config.key.as_str(), config.revision.as_str()])?;
        self.ensure_open(&collection, "writing to")?;

        let revision = {
            let mut store = self.session.store().write().await;
            let rows = store.entry(collection.clone()).or_default();
            let now = Instant::now();
            rows.retain(|v| !v.is_expired(now));
            match rows.iter_mut().find(|v| v.key == key) {
                Some(row) => {
                    row.revision += 1;
                    row.key_value = key_value.clone();
                    row.body = body;
                    if !update {
                        row.expires_at = ttl.map(|v| now + v);
                    }
                    row.revision
                }
                None if update => {
                    return Err(self.execution_error(
                        &collection,
                        "updating",
                        format!("no entity has the key `{}`", truncate_long!(key)),
                    ));
                }
                None => {
                    rows.push(StoredRow {
                        key: key.clone(),
                        key_value: key_value.clone(),
                        body,
                        revision: 1,
                        expires_at: ttl.map(|v| now + v),
                    });
                    1
                }
            }
        };
        log::trace!("Wrote `{}` revision {} into `{}`", key, revision, collection);
        Converter::apply_identity(
            &mut entity,
            [
                Field::new(config.key.clone(), key_value),
                Field::new(config.revision.clone(), revision),
            ],
        );
        Ok(entity)
    }
}

impl Connection for MemoryConnection {
    type Driver = MemoryDriver;

    async fn insert(&self, entity: Entity) -> Result<Entity> {
        self.write(entity, None, false).await
    }

    async fn insert_with_ttl(&self, entity: Entity, ttl: Duration) -> Result<Entity> {
        self.write(entity, Some(ttl), false).await
    }

    async fn update(&self, entity: Entity) -> Result<Entity> {
        self.write(entity, None, true).await
    }

    async fn delete(&self, query: DeleteQuery) -> Result<u64> {
        let predicate = self.executor.delete_predicate(&query)?;
        if predicate.is_none() && self.config().mode == MemoryMode::Keyed {
            return Err(Error::new(StoreError::UnsupportedFeature {
                backend: MemoryDriver::NAME.into(),
                feature: "deleting without a key condition",
            }));
        }
        self.ensure_open(&query.collection, "deleting from")?;
        let mut store = self.session.store().write().await;
        let Some(rows) = store.get_mut(&*query.collection) else {
            return Ok(0);
        };
        let now = Instant::now();
        let matched = self.session.matching(rows, predicate.as_ref(), now);
        let count = matched.len() as u64;
        if query.projection.is_empty() {
            let matched: HashSet<_> = matched.into_iter().collect();
            let mut i = 0;
            rows.retain(|v| {
                let keep = !matched.contains(&i) && !v.is_expired(now);
                i += 1;
                keep
            });
        } else {
            for i in matched {
                let row = &mut rows[i];
                for name in &query.projection {
                    row.body.shift_remove(name.as_ref());
                }
                row.revision += 1;
            }
        }
        log::trace!("Deleted {} entities from `{}`", count, query.collection);
        Ok(count)
    }

    async fn select(&self, query: &Query, cursor: &Cursor) -> Result<Page> {
        self.executor.select(query, cursor).await
    }

    async fn close(&self) -> Result<()> {
        log::debug!("Closing the memory store `{}`", self.config().name);
        self.session.mark_closed();
        Ok(())
    }
}
