mod callback;
mod conditions;
mod delete;
mod identity;
mod nested;
mod paging;
mod simple;
mod ttl;

use crate::{
    callback::callback,
    conditions::conditions,
    delete::delete,
    identity::identity,
    nested::nested,
    paging::paging,
    simple::simple,
    ttl::ttl,
};
use burrow::{Connection, DeleteQuery, Result};
use log::LevelFilter;
use std::env;

/// Identity fields the suite expects from the driver under test.
pub const KEY: &str = "_id";
pub const REVISION: &str = "_rev";

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

pub async fn execute_tests<C: Connection>(connection: C) {
    simple(&connection).await;
    nested(&connection).await;
    conditions(&connection).await;
    paging(&connection).await;
    identity(&connection).await;
    delete(&connection).await;
    ttl(&connection).await;
    callback(&connection).await;
}

pub(crate) async fn clear<C: Connection>(connection: &C, collection: &'static str) -> Result<u64> {
    connection.delete(DeleteQuery::delete(collection)).await
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
