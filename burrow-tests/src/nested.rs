use crate::{KEY, clear};
use burrow::{Condition, Connection, Entity, Field, Query, Value};
use std::sync::LazyLock;
use tokio::sync::Mutex;

pub async fn nested<C: Connection>(connection: &C) {
    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;

    clear(connection, "nested_people")
        .await
        .expect("Failed to clear nested_people");

    let mut entity = Entity::new("nested_people");
    entity
        .set(KEY, "ada")
        .set("name", "Ada")
        .set("scores", vec![3i32, 1, 2])
        .add(Field::documents(
            "address",
            vec![
                Field::new("city", "London"),
                Field::new("zip", "W1"),
                Field::documents("geo", vec![Field::new("lat", 51.5f64)]),
            ],
        ))
        .add(Field::document("manager", Field::new("name", "Charles")));
    connection
        .insert(entity)
        .await
        .expect("Failed to insert a nested entity");

    let found = connection
        .select_all(&Query::select("nested_people").filter(Condition::eq(KEY, "ada")))
        .await
        .expect("Failed to query nested_people");
    assert_eq!(found.len(), 1);
    let entity = &found[0];
    assert_eq!(entity.find("name").unwrap().get::<String>().unwrap(), "Ada");
    assert_eq!(
        entity.find("scores").unwrap().get::<Vec<i32>>().unwrap(),
        [3, 1, 2]
    );

    let Value::Documents(address) = &entity.find("address").unwrap().value else {
        panic!("The address should be read back as a sub-document");
    };
    let names: Vec<_> = address.iter().map(|v| v.name()).collect();
    assert_eq!(names, ["city", "zip", "geo"]);
    assert_eq!(address[0].get::<String>().unwrap(), "London");
    assert_eq!(address[1].get::<String>().unwrap(), "W1");
    let Value::Documents(geo) = &address[2].value else {
        panic!("The nested sub-document should keep its shape");
    };
    assert_eq!(geo.len(), 1);
    assert_eq!(geo[0].name(), "lat");
    assert_eq!(geo[0].get::<f64>().unwrap(), 51.5);

    // A single document comes back as a sub-document of one field
    let Value::Documents(manager) = &entity.find("manager").unwrap().value else {
        panic!("The manager should be read back as a sub-document");
    };
    assert_eq!(manager.len(), 1);
    assert_eq!(manager[0].name(), "name");
    assert_eq!(manager[0].get::<String>().unwrap(), "Charles");
}
