use crate::{KEY, REVISION, clear};
use burrow::{Condition, Connection, Entity, Query};
use rust_decimal::Decimal;
use std::{str::FromStr, sync::LazyLock};
use time::{Date, Month, Time};
use tokio::sync::Mutex;
use uuid::Uuid;

pub async fn simple<C: Connection>(connection: &C) {
    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;

    // Setup
    clear(connection, "simple_fields")
        .await
        .expect("Failed to clear simple_fields");

    // Simple 1
    let mut entity = Entity::new("simple_fields");
    entity
        .set(KEY, "simple-1")
        .set("alpha", None::<u8>)
        .set("bravo", 777i32)
        .set("charlie", -2i16)
        .set("delta", 9876543210u64)
        .set("echo", None::<Uuid>)
        .set("foxtrot", 0.25f64)
        .set("golf", Time::from_hms(12, 0, 10).unwrap())
        .set("hotel", "Hello world!")
        .set("india", true);
    let written = connection
        .insert(entity)
        .await
        .expect("Failed to insert simple 1");
    assert_eq!(written.find(KEY).unwrap().get::<String>().unwrap(), "simple-1");
    assert_eq!(written.find(REVISION).unwrap().get::<u64>().unwrap(), 1);

    let found = connection
        .select_all(&Query::select("simple_fields").filter(Condition::eq(KEY, "simple-1")))
        .await
        .expect("Failed to query simple 1");
    assert_eq!(found.len(), 1);
    let entity = &found[0];
    assert_eq!(entity.collection(), "simple_fields");
    assert_eq!(entity.find("alpha").unwrap().get::<Option<u8>>().unwrap(), None);
    assert_eq!(entity.find("bravo").unwrap().get::<i32>().unwrap(), 777);
    assert_eq!(entity.find("charlie").unwrap().get::<i16>().unwrap(), -2);
    assert_eq!(entity.find("delta").unwrap().get::<u64>().unwrap(), 9876543210);
    assert_eq!(entity.find("echo").unwrap().get::<Option<Uuid>>().unwrap(), None);
    assert_eq!(entity.find("foxtrot").unwrap().get::<f64>().unwrap(), 0.25);
    assert_eq!(
        entity.find("golf").unwrap().get::<Time>().unwrap(),
        Time::from_hms(12, 0, 10).unwrap()
    );
    assert_eq!(
        entity.find("hotel").unwrap().get::<String>().unwrap(),
        "Hello world!"
    );
    assert!(entity.find("india").unwrap().get::<bool>().unwrap());
    assert_eq!(entity.find(KEY).unwrap().get::<String>().unwrap(), "simple-1");

    // Simple 2
    let uuid = Uuid::parse_str("5e915574-bb30-4430-98cf-c5854f61fbbd").unwrap();
    let mut entity = Entity::new("simple_fields");
    entity
        .set(KEY, "simple-2")
        .set("alpha", 255u8)
        .set("echo", uuid)
        .set("juliet", Date::from_calendar_date(1815, Month::December, 10).unwrap())
        .set("kilo", Decimal::from_str("12.50").unwrap());
    connection
        .insert(entity)
        .await
        .expect("Failed to insert simple 2");
    let found = connection
        .select_all(&Query::select("simple_fields").filter(Condition::eq(KEY, "simple-2")))
        .await
        .expect("Failed to query simple 2");
    assert_eq!(found.len(), 1);
    let entity = &found[0];
    assert_eq!(entity.find("alpha").unwrap().get::<u8>().unwrap(), 255);
    assert_eq!(entity.find("echo").unwrap().get::<Uuid>().unwrap(), uuid);
    assert_eq!(
        entity.find("juliet").unwrap().get::<Date>().unwrap(),
        Date::from_calendar_date(1815, Month::December, 10).unwrap()
    );
    assert_eq!(
        entity.find("kilo").unwrap().get::<Decimal>().unwrap(),
        Decimal::from_str("12.5").unwrap()
    );
    assert!(entity.find("bravo").is_none());

    // Both
    let all = connection
        .select_all(&Query::select("simple_fields"))
        .await
        .expect("Failed to query simple_fields");
    assert_eq!(all.len(), 2);
    assert_eq!(
        clear(connection, "simple_fields")
            .await
            .expect("Failed to clear simple_fields"),
        2
    );
}
