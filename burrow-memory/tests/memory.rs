#[cfg(test)]
mod tests {
    use burrow_core::{
        Condition, Connection, Cursor, CustomValue, DeleteQuery, Driver, Entity, Query, Sort,
        StoreError, Value, WriterRegistry,
    };
    use burrow_memory::{MemoryConnection, MemoryDriver, MemoryMode};
    use burrow_tests::{execute_tests, init_logs, silent_logs};
    use std::time::Duration;

    async fn connect(url: &'static str) -> MemoryConnection {
        MemoryDriver::new()
            .connect(url.into())
            .await
            .expect("Could not open the memory store")
    }

    async fn insert_people(connection: &MemoryConnection, collection: &'static str) {
        for (key, name, age) in [("p1", "Ada", 36), ("p2", "Alan", 41), ("p3", "Grace", 85)] {
            let mut entity = Entity::new(collection);
            entity.set("_id", key).set("name", name).set("age", age);
            connection.insert(entity).await.expect("Failed to insert");
        }
    }

    fn names(entities: &[Entity]) -> Vec<String> {
        entities
            .iter()
            .map(|v| v.find("name").unwrap().get::<String>().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn memory() {
        init_logs();
        let connection = connect("memory://suite").await;
        execute_tests(connection).await;
    }

    #[tokio::test]
    async fn memory_default_paging() {
        init_logs();
        let connection = connect("memory://suite?paging=default&fetch_size=3").await;
        execute_tests(connection).await;
    }

    #[tokio::test]
    async fn memory_embedded_layout() {
        init_logs();
        let connection = connect("memory://suite?layout=embedded").await;
        execute_tests(connection).await;
    }

    #[tokio::test]
    async fn clones_share_the_store() {
        let connection = connect("memory://shared").await;
        let other = connection.clone();
        insert_people(&connection, "people").await;
        assert_eq!(other.select_all(&Query::select("people")).await.unwrap().len(), 3);
        let separate = connect("memory://shared").await;
        assert!(separate.select_all(&Query::select("people")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn keyed_mode() {
        init_logs();
        let connection = connect("memory://rows?mode=keyed").await;
        assert_eq!(connection.config().mode, MemoryMode::Keyed);
        insert_people(&connection, "people").await;

        let found = connection
            .select_all(&Query::select("people").filter(Condition::r#in(
                "_id",
                vec!["p3".to_string(), "p1".to_string(), "p9".to_string()],
            )))
            .await
            .unwrap();
        assert_eq!(names(&found), ["Grace", "Ada"]);

        let found = connection
            .select_all(&Query::select("people").filter(Condition::and([
                Condition::r#in("_id", vec!["p1".to_string(), "p2".to_string()]),
                Condition::eq("_id", "p2"),
            ])))
            .await
            .unwrap();
        assert_eq!(names(&found), ["Alan"]);

        silent_logs! {
            let error = connection
                .select_all(&Query::select("people").filter(Condition::gt("age", 40)))
                .await
                .unwrap_err();
            assert!(matches!(
                StoreError::kind_of(&error),
                Some(StoreError::UnsupportedCondition { .. })
            ));
            let error = connection
                .select_all(&Query::select("people").filter(Condition::eq("name", "Ada")))
                .await
                .unwrap_err();
            assert!(matches!(
                StoreError::kind_of(&error),
                Some(StoreError::InvalidConditionShape { .. })
            ));
            let error = connection
                .select_all(&Query::select("people").filter(Condition::or([
                    Condition::eq("_id", "p1"),
                    Condition::eq("_id", "p2"),
                ])))
                .await
                .unwrap_err();
            assert!(matches!(
                StoreError::kind_of(&error),
                Some(StoreError::UnsupportedCondition { .. })
            ));
            let error = connection
                .delete(DeleteQuery::delete("people"))
                .await
                .unwrap_err();
            assert!(matches!(
                StoreError::kind_of(&error),
                Some(StoreError::UnsupportedFeature { .. })
            ));
        }

        let removed = connection
            .delete(DeleteQuery::delete("people").filter(Condition::eq("_id", "p1")))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(
            connection.select_all(&Query::select("people")).await.unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn pages_follow_the_fetch_size() {
        let connection = connect("memory://pages?fetch_size=2").await;
        insert_people(&connection, "people").await;
        let query = Query::select("people").sort(Sort::desc("age"));
        let page = connection.select(&query, &Cursor::new()).await.unwrap();
        assert_eq!(names(&page.entities), ["Grace", "Alan"]);
        assert!(!page.cursor.is_exhausted());
        let last = connection.select(&query, &page.cursor).await.unwrap();
        assert_eq!(names(&last.entities), ["Ada"]);
        assert!(last.cursor.is_exhausted());

        // The statement fetch size wins over the configured one
        let page = connection
            .select(&query.clone().fetch_size(5), &Cursor::new())
            .await
            .unwrap();
        assert_eq!(page.len(), 3);
        assert!(page.cursor.is_exhausted());

        // An exhausted cursor ignores the rows written later
        let mut entity = Entity::new("people");
        entity.set("_id", "p0").set("name", "Zuse").set("age", 10);
        connection.insert(entity).await.unwrap();
        let last = connection.select(&query, &page.cursor).await.unwrap();
        assert!(last.is_empty());
    }

    #[tokio::test]
    async fn projection_keeps_identity_fields() {
        let connection = connect("memory://projection").await;
        insert_people(&connection, "people").await;
        let found = connection
            .select_all(
                &Query::select("people")
                    .filter(Condition::eq("_id", "p2"))
                    .project(["name"]),
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        let mut names: Vec<_> = found[0].names().collect();
        names.sort();
        assert_eq!(names, ["_id", "_rev", "name"]);
    }

    #[tokio::test]
    async fn delete_fields() {
        let connection = connect("memory://fields").await;
        insert_people(&connection, "people").await;
        let removed = connection
            .delete(
                DeleteQuery::delete("people")
                    .filter(Condition::gte("age", 41))
                    .project(["age"]),
            )
            .await
            .unwrap();
        assert_eq!(removed, 2);
        let all = connection
            .select_all(&Query::select("people").sort(Sort::asc("_id")))
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[0].find("age").is_some());
        assert!(all[1].find("age").is_none());
        assert!(all[2].find("age").is_none());
        assert_eq!(all[1].find("_rev").unwrap().get::<u64>().unwrap(), 2);
    }

    #[tokio::test]
    async fn update_of_a_missing_key() {
        let connection = connect("memory://update").await;
        let mut entity = Entity::new("people");
        entity.set("_id", "ghost").set("name", "Nobody");
        let error = connection.update(entity).await.unwrap_err();
        assert!(matches!(
            StoreError::kind_of(&error),
            Some(StoreError::Execution { .. })
        ));
    }

    #[tokio::test]
    async fn update_of_a_missing_multibyte_key() {
        let connection = connect("memory://update_multibyte").await;
        let mut entity = Entity::new("people");
        entity.set("_id", "é".repeat(300)).set("name", "Nobody");
        let error = connection.update(entity).await.unwrap_err();
        assert!(matches!(
            StoreError::kind_of(&error),
            Some(StoreError::Execution { .. })
        ));
    }

    #[tokio::test]
    async fn expired_rows_can_be_written_again() {
        let connection = connect("memory://expiry").await;
        let mut entity = Entity::new("sessions");
        entity.set("_id", "s1").set("user", "ada");
        connection
            .insert_with_ttl(entity.clone(), Duration::from_millis(20))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;
        let written = connection.insert(entity).await.unwrap();
        assert_eq!(written.find("_rev").unwrap().get::<u64>().unwrap(), 1);
        let all = connection.select_all(&Query::select("sessions")).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[derive(Debug, PartialEq)]
    struct Money(i64);

    #[tokio::test]
    async fn custom_values() {
        let strict = connect("memory://strict?policy=strict").await;
        let mut entity = Entity::new("wallets");
        entity.set("balance", Value::Custom(CustomValue::new(Money(250))));
        let error = strict.insert(entity.clone()).await.unwrap_err();
        assert!(matches!(
            StoreError::kind_of(&error),
            Some(StoreError::Conversion { .. })
        ));

        let registry = WriterRegistry::builder()
            .custom::<Money, _>(|v| Ok(Value::Int64(Some(v.0))))
            .build();
        let connection = MemoryConnection::connect_with_registry(
            "memory://wallets?policy=strict".into(),
            registry,
        )
        .await
        .unwrap();
        connection.insert(entity).await.unwrap();
        let found = connection
            .select_all(&Query::select("wallets").filter(Condition::gt("balance", 100)))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].find("balance").unwrap().get::<i64>().unwrap(), 250);
    }

    #[tokio::test]
    async fn closed_connection() {
        let connection = connect("memory://closed").await;
        insert_people(&connection, "people").await;
        connection.close().await.unwrap();
        silent_logs! {
            let error = connection
                .select_all(&Query::select("people"))
                .await
                .unwrap_err();
            assert!(matches!(
                StoreError::kind_of(&error),
                Some(StoreError::Execution { .. })
            ));
            let error = connection.insert(Entity::new("people")).await.unwrap_err();
            assert!(matches!(
                StoreError::kind_of(&error),
                Some(StoreError::Execution { .. })
            ));
            let error = connection
                .delete(DeleteQuery::delete("people"))
                .await
                .unwrap_err();
            assert!(matches!(
                StoreError::kind_of(&error),
                Some(StoreError::Execution { .. })
            ));
        }
    }

    #[tokio::test]
    async fn invalid_urls() {
        for url in ["memory://x?fetch_size=0", "memory://x?mode=wide", "redis://x"] {
            let error = MemoryDriver::new()
                .connect(url.into())
                .await
                .err()
                .expect("The url should be rejected");
            assert!(matches!(
                StoreError::kind_of(&error),
                Some(StoreError::InvalidConfiguration(..))
            ));
        }
    }
}
