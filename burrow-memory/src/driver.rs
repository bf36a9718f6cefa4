use crate::MemoryConnection;
use burrow_core::{Driver, Result};
use std::borrow::Cow;

#[derive(Clone, Copy, Default)]
pub struct MemoryDriver;
impl MemoryDriver {
    pub const fn new() -> Self {
        Self
    }
}

impl Driver for MemoryDriver {
    type Connection = MemoryConnection;
    const NAME: &'static str = "memory";

    async fn connect(&self, url: Cow<'static, str>) -> Result<MemoryConnection> {
        MemoryConnection::connect(url).await
    }
}
