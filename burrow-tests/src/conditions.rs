use crate::{KEY, clear};
use burrow::{Condition, Connection, Entity, Query, StoreError};
use std::sync::LazyLock;
use tokio::sync::Mutex;

async fn numbers<C: Connection>(connection: &C, condition: Condition) -> Vec<i32> {
    let description = format!("{:?}", condition);
    let mut result = connection
        .select_all(&Query::select("conditions_numbers").filter(condition))
        .await
        .unwrap_or_else(|e| panic!("Failed to select {}: {:#}", description, e))
        .iter()
        .map(|v| v.find("n").unwrap().get::<i32>().unwrap())
        .collect::<Vec<_>>();
    result.sort();
    result
}

pub async fn conditions<C: Connection>(connection: &C) {
    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;

    clear(connection, "conditions_numbers")
        .await
        .expect("Failed to clear conditions_numbers");
    for n in 0..10i32 {
        let mut entity = Entity::new("conditions_numbers");
        entity
            .set(KEY, format!("number-{n}"))
            .set("n", n)
            .set("name", format!("item-{n}"))
            .set("even", n % 2 == 0);
        connection
            .insert(entity)
            .await
            .expect("Failed to insert into conditions_numbers");
    }

    // Equality
    assert_eq!(numbers(connection, Condition::eq(KEY, "number-3")).await, [3]);
    assert_eq!(
        numbers(
            connection,
            Condition::r#in(KEY, vec!["number-1".to_string(), "number-5".to_string()])
        )
        .await,
        [1, 5]
    );
    assert_eq!(
        numbers(
            connection,
            Condition::and([
                Condition::eq(KEY, "number-4"),
                Condition::r#in(KEY, vec!["number-4".to_string(), "number-7".to_string()]),
            ])
        )
        .await,
        [4]
    );
    assert_eq!(
        numbers(connection, Condition::eq(KEY, "number-42")).await,
        Vec::<i32>::new()
    );

    assert_eq!(numbers(connection, Condition::eq("even", true)).await, [0, 2, 4, 6, 8]);
    assert_eq!(numbers(connection, Condition::gt("n", 6)).await, [7, 8, 9]);
    assert_eq!(numbers(connection, Condition::gte("n", 6)).await, [6, 7, 8, 9]);
    assert_eq!(numbers(connection, Condition::lt("n", 2)).await, [0, 1]);
    assert_eq!(numbers(connection, Condition::lte("n", 2)).await, [0, 1, 2]);
    assert_eq!(
        numbers(
            connection,
            Condition::and([Condition::gte("n", 2), Condition::lt("n", 5)])
        )
        .await,
        [2, 3, 4]
    );
    // Comparisons across integer widths
    assert_eq!(numbers(connection, Condition::gt("n", 7i64)).await, [8, 9]);

    assert_eq!(
        numbers(
            connection,
            Condition::or([Condition::eq(KEY, "number-0"), Condition::eq(KEY, "number-9")])
        )
        .await,
        [0, 9]
    );
    assert_eq!(
        numbers(
            connection,
            Condition::eq("even", false)
                .and_also(Condition::gt("n", 4).or_else(Condition::lt("n", 2)))
        )
        .await,
        [1, 5, 7, 9]
    );

    assert_eq!(numbers(connection, Condition::like("name", "item-1%")).await, [1]);
    assert_eq!(
        numbers(connection, Condition::like("name", "item-_")).await,
        (0..10).collect::<Vec<_>>()
    );

    // Rejected before reaching the back end
    let error = connection
        .select_all(&Query::select("conditions_numbers").filter(Condition::r#in(KEY, 1)))
        .await
        .expect_err("In with a scalar must be rejected");
    assert!(matches!(
        StoreError::kind_of(&error),
        Some(StoreError::InvalidConditionShape { .. })
    ));
    let error = connection
        .select_all(&Query::select(""))
        .await
        .expect_err("A query without a collection must be rejected");
    assert!(matches!(
        StoreError::kind_of(&error),
        Some(StoreError::MissingCollection)
    ));
}
