use crate::{KEY, clear};
use burrow::{Condition, Connection, DeleteQuery, Entity, Query};
use std::sync::LazyLock;
use tokio::sync::Mutex;

pub async fn delete<C: Connection>(connection: &C) {
    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;

    clear(connection, "delete_books")
        .await
        .expect("Failed to clear delete_books");
    for (key, title) in [
        ("b1", "Dune"),
        ("b2", "Emma"),
        ("b3", "Ulysses"),
        ("b4", "Walden"),
    ] {
        let mut entity = Entity::new("delete_books");
        entity.set(KEY, key).set("title", title).set("pages", 100i32);
        connection
            .insert(entity)
            .await
            .expect("Failed to insert into delete_books");
    }

    let removed = connection
        .delete(DeleteQuery::delete("delete_books").filter(Condition::eq(KEY, "b2")))
        .await
        .expect("Failed to delete one book");
    assert_eq!(removed, 1);
    let removed = connection
        .delete(DeleteQuery::delete("delete_books").filter(Condition::eq(KEY, "b2")))
        .await
        .expect("Failed to delete a missing book");
    assert_eq!(removed, 0);

    let removed = connection
        .delete(
            DeleteQuery::delete("delete_books")
                .filter(Condition::r#in(KEY, vec!["b1".to_string(), "b3".to_string()])),
        )
        .await
        .expect("Failed to delete two books");
    assert_eq!(removed, 2);

    let left = connection
        .select_all(&Query::select("delete_books"))
        .await
        .expect("Failed to query delete_books");
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].find("title").unwrap().get::<String>().unwrap(), "Walden");

    assert_eq!(
        clear(connection, "delete_books")
            .await
            .expect("Failed to clear delete_books"),
        1
    );
    assert!(
        connection
            .select_all(&Query::select("delete_books"))
            .await
            .expect("Failed to query delete_books")
            .is_empty()
    );
}
