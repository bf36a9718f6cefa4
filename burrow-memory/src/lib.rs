mod config;
mod connection;
mod driver;
mod session;

pub use config::*;
pub use connection::*;
pub use driver::*;
pub use session::*;
