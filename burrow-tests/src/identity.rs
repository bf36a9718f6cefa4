use crate::{KEY, REVISION, clear};
use burrow::{Condition, Connection, Entity, Query, StoreError};
use std::sync::LazyLock;
use tokio::sync::Mutex;

pub async fn identity<C: Connection>(connection: &C) {
    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;

    clear(connection, "identity_users")
        .await
        .expect("Failed to clear identity_users");

    // Key assigned by the back end
    let mut entity = Entity::new("identity_users");
    entity.set("name", "Grace");
    let written = connection
        .insert(entity)
        .await
        .expect("Failed to insert without a key");
    let key = written
        .find(KEY)
        .expect("The written entity must carry its key")
        .get::<String>()
        .unwrap();
    assert!(!key.is_empty());
    assert_eq!(written.find_all(KEY).count(), 1);
    assert_eq!(written.find(REVISION).unwrap().get::<u64>().unwrap(), 1);
    assert_eq!(written.find("name").unwrap().get::<String>().unwrap(), "Grace");

    // Update bumps the revision and replaces the stale identity fields
    let mut changed = written.clone();
    changed.remove("name");
    changed.set("name", "Grace Hopper");
    let updated = connection
        .update(changed)
        .await
        .expect("Failed to update identity_users");
    assert_eq!(updated.find_all(REVISION).count(), 1);
    assert_eq!(updated.find(REVISION).unwrap().get::<u64>().unwrap(), 2);
    assert_eq!(updated.find(KEY).unwrap().get::<String>().unwrap(), key);

    let found = connection
        .select_all(&Query::select("identity_users").filter(Condition::eq(KEY, key.clone())))
        .await
        .expect("Failed to query identity_users");
    assert_eq!(found.len(), 1);
    assert_eq!(
        found[0].find("name").unwrap().get::<String>().unwrap(),
        "Grace Hopper"
    );
    assert_eq!(found[0].find(REVISION).unwrap().get::<u64>().unwrap(), 2);

    // Insert with an existing key overwrites
    let mut entity = Entity::new("identity_users");
    entity.set(KEY, key.clone()).set("name", "Amazing Grace");
    let written = connection
        .insert(entity)
        .await
        .expect("Failed to overwrite identity_users");
    assert_eq!(written.find(REVISION).unwrap().get::<u64>().unwrap(), 3);
    let all = connection
        .select_all(&Query::select("identity_users"))
        .await
        .expect("Failed to query identity_users");
    assert_eq!(all.len(), 1);

    // Update needs the key
    let mut entity = Entity::new("identity_users");
    entity.set("name", "Nobody");
    let error = connection
        .update(entity)
        .await
        .expect_err("An update without key must fail");
    assert!(matches!(
        StoreError::kind_of(&error),
        Some(StoreError::MissingIdentityField { field, .. }) if field == KEY
    ));

    // Persisting needs a collection
    let error = connection
        .insert(Entity::new(""))
        .await
        .expect_err("An entity without collection must be rejected");
    assert!(matches!(
        StoreError::kind_of(&error),
        Some(StoreError::MissingCollection)
    ));
}
