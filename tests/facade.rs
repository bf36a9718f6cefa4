#[cfg(test)]
mod tests {
    use burrow::{Condition, Connection, Cursor, Driver, Entity, Query, Sort};
    use burrow_memory::MemoryDriver;

    #[tokio::test]
    async fn facade_reexports_the_core() {
        let connection = MemoryDriver::new()
            .connect("memory://facade?fetch_size=2".into())
            .await
            .expect("Could not open the store");
        for (name, age) in [("Ada", 36), ("Charles", 79), ("Alan", 41)] {
            let mut entity = Entity::new("people");
            entity.set("name", name).set("age", age);
            connection.insert(entity).await.expect("Failed to insert");
        }
        let query = Query::select("people")
            .filter(Condition::gt("age", 40))
            .sort(Sort::asc("age"));
        let page = connection
            .select(&query, &Cursor::new())
            .await
            .expect("Failed to select");
        let names: Vec<_> = page
            .entities
            .iter()
            .map(|v| v.find("name").unwrap().get::<String>().unwrap())
            .collect();
        assert_eq!(names, ["Alan", "Charles"]);
        assert!(page.cursor.is_exhausted());
        connection.close().await.expect("Failed to close");
    }
}
