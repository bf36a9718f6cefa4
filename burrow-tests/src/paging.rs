use crate::{KEY, clear};
use burrow::{Cursor, Connection, Entity, Query};
use std::{collections::BTreeSet, sync::LazyLock};
use tokio::sync::Mutex;

fn numbers(entities: &[Entity]) -> Vec<i32> {
    entities
        .iter()
        .map(|v| v.find("n").unwrap().get::<i32>().unwrap())
        .collect()
}

pub async fn paging<C: Connection>(connection: &C) {
    static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    let _lock = MUTEX.lock().await;

    clear(connection, "paging_rows")
        .await
        .expect("Failed to clear paging_rows");
    for n in 0..25i32 {
        let mut entity = Entity::new("paging_rows");
        entity.set(KEY, format!("row-{n:02}")).set("n", n);
        connection
            .insert(entity)
            .await
            .expect("Failed to insert into paging_rows");
    }

    // Follow the cursor
    let query = Query::select("paging_rows").fetch_size(10);
    let mut cursor = Cursor::new();
    let mut seen = BTreeSet::new();
    let mut pages = 0;
    while !cursor.is_exhausted() {
        let page = connection
            .select(&query, &cursor)
            .await
            .expect("Failed to read a page of paging_rows");
        pages += 1;
        assert!(pages <= 3, "25 rows in pages of 10 take at most 3 pages");
        for n in numbers(&page.entities) {
            assert!(seen.insert(n), "The row {n} was returned twice");
        }
        cursor = page.cursor;
    }
    assert_eq!(seen, (0..25).collect());

    // An exhausted cursor stays exhausted
    for _ in 0..2 {
        let page = connection
            .select(&query, &cursor)
            .await
            .expect("Failed to read past the end");
        assert!(page.is_empty());
        assert!(page.cursor.is_exhausted());
    }

    // Two reads of the same query do not interfere
    let first = connection
        .select(&query, &Cursor::new())
        .await
        .expect("Failed to start the first read");
    let second = connection
        .select(&query, &Cursor::new())
        .await
        .expect("Failed to start the second read");
    assert_eq!(numbers(&first.entities), numbers(&second.entities));

    let all = connection
        .select_all(&Query::select("paging_rows").sort(burrow::Sort::asc("n")).fetch_size(7))
        .await
        .expect("Failed to select sorted paging_rows");
    assert_eq!(numbers(&all), (0..25).collect::<Vec<_>>());

    let last = connection
        .select_all(&Query::select("paging_rows").sort(burrow::Sort::desc("n")).limit(5))
        .await
        .expect("Failed to select the last paging_rows");
    assert_eq!(numbers(&last), [24, 23, 22, 21, 20]);

    let tail = connection
        .select_all(
            &Query::select("paging_rows")
                .sort(burrow::Sort::asc("n"))
                .skip(20)
                .fetch_size(2),
        )
        .await
        .expect("Failed to skip paging_rows");
    assert_eq!(numbers(&tail), [20, 21, 22, 23, 24]);

    let projected = connection
        .select_all(
            &Query::select("paging_rows")
                .sort(burrow::Sort::asc("n"))
                .limit(1)
                .project(["n"]),
        )
        .await
        .expect("Failed to project paging_rows");
    assert_eq!(projected.len(), 1);
    assert!(projected[0].find("n").is_some());

    // Empty collection
    let page = connection
        .select(&Query::select("paging_never_written"), &Cursor::new())
        .await
        .expect("Failed to read an empty collection");
    assert!(page.is_empty());
    assert!(page.cursor.is_exhausted());
}
