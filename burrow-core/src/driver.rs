use crate::{Connection, Result};
use std::{borrow::Cow, future::Future};

/// Entry point of a back end.
pub trait Driver: Default + Send + Sync {
    type Connection: Connection<Driver = Self>;

    /// Scheme of the connection urls: `<NAME>://...`.
    const NAME: &'static str;

    fn connect(
        &self,
        url: Cow<'static, str>,
    ) -> impl Future<Output = Result<Self::Connection>> + Send;
}
