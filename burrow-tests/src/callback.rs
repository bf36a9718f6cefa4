use crate::{KEY, clear};
use burrow::{Cursor, Connection, Entity, Query};
use std::sync::LazyLock;
use tokio::sync::{Mutex, oneshot};

pub async fn callback<C: Connection>(connection: &C) {
    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;

    clear(connection, "callback_events")
        .await
        .expect("Failed to clear callback_events");
    for n in 0..3i32 {
        let mut entity = Entity::new("callback_events");
        entity.set(KEY, format!("event-{n}")).set("n", n);
        connection
            .insert(entity)
            .await
            .expect("Failed to insert into callback_events");
    }

    let (tx, rx) = oneshot::channel();
    connection
        .select_async(
            Query::select("callback_events").fetch_size(10),
            Cursor::new(),
            move |result| {
                let _ = tx.send(result);
            },
        )
        .await
        .expect("The select task panicked");
    let page = rx
        .await
        .expect("The callback was not invoked")
        .expect("Failed to select callback_events");
    assert_eq!(page.len(), 3);
    assert!(page.cursor.is_exhausted());

    // The exhausted cursor still gets its callback, with an empty page
    let (tx, rx) = oneshot::channel();
    connection
        .select_async(
            Query::select("callback_events"),
            page.cursor,
            move |result| {
                let _ = tx.send(result);
            },
        )
        .await
        .expect("The select task panicked");
    let page = rx
        .await
        .expect("The callback was not invoked")
        .expect("Failed to select callback_events");
    assert!(page.is_empty());
}
