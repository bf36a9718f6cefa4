#[cfg(test)]
mod tests {
    use burrow_core::{
        Connection, Cursor, DeleteQuery, Driver, Entity, Page, PagingState, Query, Result,
        StoreError,
    };
    use std::{borrow::Cow, time::Duration};

    /// Driver whose connection only implements the required operations.
    #[derive(Default)]
    struct PlainDriver;

    impl Driver for PlainDriver {
        type Connection = PlainConnection;
        const NAME: &'static str = "plain";

        async fn connect(&self, _url: Cow<'static, str>) -> Result<PlainConnection> {
            Ok(PlainConnection)
        }
    }

    #[derive(Clone)]
    struct PlainConnection;

    impl Connection for PlainConnection {
        type Driver = PlainDriver;

        async fn insert(&self, entity: Entity) -> Result<Entity> {
            Ok(entity)
        }

        async fn update(&self, entity: Entity) -> Result<Entity> {
            Ok(entity)
        }

        async fn delete(&self, _query: DeleteQuery) -> Result<u64> {
            Ok(0)
        }

        /// Two pages of one entity each.
        async fn select(&self, query: &Query, cursor: &Cursor) -> Result<Page> {
            let mut entity = Entity::new(query.collection.clone());
            let last = cursor.paging_state().is_some();
            entity.set("page", if last { 2 } else { 1 });
            let next = if last {
                Cursor::exhausted()
            } else {
                Cursor::resume(Some(PagingState::from_bytes(b"2")), false)
            };
            Ok(Page {
                entities: vec![entity],
                cursor: next,
            })
        }

        async fn close(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn time_to_live_is_unsupported_by_default() {
        let connection = PlainDriver.connect("plain://local".into()).await.unwrap();
        let mut entity = Entity::new("sessions");
        entity.set("user", "ada");
        let error = connection
            .insert_with_ttl(entity, Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(
            StoreError::kind_of(&error),
            Some(StoreError::UnsupportedFeature {
                feature: "time to live",
                ..
            })
        ));
        assert!(format!("{:#}", error).contains("plain"));
    }

    #[tokio::test]
    async fn select_all_follows_every_page() {
        let connection = PlainConnection;
        let all = connection.select_all(&Query::select("pages")).await.unwrap();
        let pages: Vec<i32> = all
            .iter()
            .map(|v| v.find("page").unwrap().get().unwrap())
            .collect();
        assert_eq!(pages, [1, 2]);
    }
}
