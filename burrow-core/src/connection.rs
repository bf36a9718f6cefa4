use crate::{Cursor, DeleteQuery, Driver, Entity, Error, Page, Query, Result, StoreError};
use std::{future::Future, time::Duration};
use tokio::task::JoinHandle;

/// Operations of a connected back end.
///
/// Writes return the entity with its identity fields (key, revision) refreshed. Reads are
/// paged: start from [`Cursor::new`] and pass the cursor of every page into the next call.
pub trait Connection: Clone + Send + Sync + 'static {
    type Driver: Driver<Connection = Self>;

    fn insert(&self, entity: Entity) -> impl Future<Output = Result<Entity>> + Send;

    /// Inserts an entity that expires after `ttl`.
    fn insert_with_ttl(
        &self,
        _entity: Entity,
        _ttl: Duration,
    ) -> impl Future<Output = Result<Entity>> + Send {
        async {
            Err(Error::new(StoreError::UnsupportedFeature {
                backend: <Self::Driver as Driver>::NAME.into(),
                feature: "time to live",
            }))
        }
    }

    /// Replaces an existing entity, identified by its key field.
    fn update(&self, entity: Entity) -> impl Future<Output = Result<Entity>> + Send;

    /// Removes the matching entities, returns how many were removed.
    fn delete(&self, query: DeleteQuery) -> impl Future<Output = Result<u64>> + Send;

    fn select(&self, query: &Query, cursor: &Cursor)
    -> impl Future<Output = Result<Page>> + Send;

    /// Every matching entity, following the pages until the cursor is exhausted.
    fn select_all(&self, query: &Query) -> impl Future<Output = Result<Vec<Entity>>> + Send {
        async move {
            let mut result = Vec::new();
            let mut cursor = Cursor::new();
            while !cursor.is_exhausted() {
                let page = self.select(query, &cursor).await?;
                result.extend(page.entities);
                cursor = page.cursor;
            }
            Ok(result)
        }
    }

    /// Runs [`Connection::select`] on a tokio task, the result goes to `callback`.
    fn select_async<F>(&self, query: Query, cursor: Cursor, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<Page>) + Send + 'static,
    {
        let connection = self.clone();
        tokio::spawn(async move {
            let result = connection.select(&query, &cursor).await;
            callback(result);
        })
    }

    fn close(&self) -> impl Future<Output = Result<()>> + Send;
}
