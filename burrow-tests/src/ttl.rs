use crate::{KEY, clear};
use burrow::{Condition, Connection, Entity, Query};
use std::{sync::LazyLock, time::Duration};
use tokio::{sync::Mutex, time::sleep};

pub async fn ttl<C: Connection>(connection: &C) {
    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;

    clear(connection, "ttl_sessions")
        .await
        .expect("Failed to clear ttl_sessions");

    let mut entity = Entity::new("ttl_sessions");
    entity.set(KEY, "short").set("user", "ada");
    connection
        .insert_with_ttl(entity, Duration::from_millis(100))
        .await
        .expect("Failed to insert with a time to live");
    let mut entity = Entity::new("ttl_sessions");
    entity.set(KEY, "long").set("user", "grace");
    connection
        .insert_with_ttl(entity, Duration::from_secs(3600))
        .await
        .expect("Failed to insert with a time to live");

    let live = connection
        .select_all(&Query::select("ttl_sessions").filter(Condition::eq(KEY, "short")))
        .await
        .expect("Failed to query ttl_sessions");
    assert_eq!(live.len(), 1);

    sleep(Duration::from_millis(250)).await;
    let expired = connection
        .select_all(&Query::select("ttl_sessions").filter(Condition::eq(KEY, "short")))
        .await
        .expect("Failed to query ttl_sessions");
    assert!(expired.is_empty(), "The entity should have expired");
    let all = connection
        .select_all(&Query::select("ttl_sessions"))
        .await
        .expect("Failed to query ttl_sessions");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].find("user").unwrap().get::<String>().unwrap(), "grace");
}
