//! One entity model over many NoSQL back ends.
//!
//! An [`Entity`] is a collection name plus an ordered list of [`Field`]s. Drivers implement
//! [`Driver`] and [`Connection`]; most of them only provide a [`Session`] and let the
//! [`Executor`] handle condition translation, conversion and paging.
//!
//! ```no_run
//! use burrow::{Condition, Connection, Cursor, Driver, Entity, Query};
//!
//! async fn run<D: Driver>(driver: D) -> burrow::Result<()> {
//!     let connection = driver.connect("memory://people".into()).await?;
//!     let mut ada = Entity::new("people");
//!     ada.set("name", "Ada").set("age", 36);
//!     let ada = connection.insert(ada).await?;
//!     let query = Query::select("people").filter(Condition::gte("age", 18)).fetch_size(50);
//!     let page = connection.select(&query, &Cursor::new()).await?;
//!     for entity in page.entities {
//!         println!("{:?}", entity.to_map());
//!     }
//!     let _ = ada;
//!     Ok(())
//! }
//! ```

pub use burrow_core::*;
