mod as_value;
mod condition;
mod connection;
mod conversion;
mod cursor;
mod driver;
mod entity;
mod error;
mod executor;
mod field;
mod filter;
mod native;
mod predicate;
mod query;
mod session;
mod util;
mod value;
mod writer;

pub use ::anyhow::Context;
pub use as_value::*;
pub use condition::*;
pub use connection::*;
pub use conversion::*;
pub use cursor::*;
pub use driver::*;
pub use entity::*;
pub use error::*;
pub use executor::*;
pub use field::*;
pub use filter::*;
pub use native::*;
pub use predicate::*;
pub use query::*;
pub use session::*;
pub use util::*;
pub use value::*;
pub use writer::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
