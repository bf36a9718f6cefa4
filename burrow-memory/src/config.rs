use crate::MemoryDriver;
use burrow_core::{
    ConnectUrl, ConverterConfig, Driver, Error, PagingMode, Result, StoreError, truncate_long,
};
use std::str::FromStr;

/// How collections are addressed.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryMode {
    /// Document collection: any condition, filtered on the rows.
    #[default]
    Document,
    /// Row key store: only `Equals`/`In`/`And` on the key field.
    Keyed,
}

impl FromStr for MemoryMode {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "document" => Ok(MemoryMode::Document),
            "keyed" => Ok(MemoryMode::Keyed),
            _ => Err(Error::new(StoreError::InvalidConfiguration(format!(
                "unknown mode `{s}`, expected `document` or `keyed`"
            )))),
        }
    }
}

/// Settings read from `memory://<name>?fetch_size=..&key=..&revision=..&mode=..&paging=..`.
///
/// `policy` and `layout` configure the converter. Every parameter falls back to the
/// `BURROW_<PARAM>` environment variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryConfig {
    pub name: String,
    pub fetch_size: u32,
    pub key: String,
    pub revision: String,
    pub mode: MemoryMode,
    pub paging: PagingMode,
    pub converter: ConverterConfig,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            name: "default".into(),
            fetch_size: 100,
            key: "_id".into(),
            revision: "_rev".into(),
            mode: MemoryMode::Document,
            paging: PagingMode::PagingState,
            converter: ConverterConfig::default(),
        }
    }
}

impl MemoryConfig {
    pub fn from_url(url: &str) -> Result<Self> {
        let mut url = ConnectUrl::parse(MemoryDriver::NAME, url)?;
        let mut config = MemoryConfig::default();
        if let Some(name) = url.host().filter(|v| !v.is_empty()) {
            config.name = name.to_string();
        }
        if let Some(fetch_size) = url.take_parsed::<u32>("fetch_size")? {
            if fetch_size == 0 {
                return Err(Error::new(StoreError::InvalidConfiguration(
                    "fetch_size must be greater than zero".into(),
                )));
            }
            config.fetch_size = fetch_size;
        }
        if let Some(key) = url.take("key") {
            config.key = key;
        }
        if let Some(revision) = url.take("revision") {
            config.revision = revision;
        }
        if let Some(mode) = url.take("mode") {
            config.mode = mode.parse()?;
        }
        if let Some(paging) = url.take("paging") {
            config.paging = paging.parse()?;
        }
        config.converter = ConverterConfig::from_url(&mut url)?;
        if config.key == config.revision {
            return Err(Error::new(StoreError::InvalidConfiguration(format!(
                "the key and the revision cannot share the field `{}`",
                truncate_long!(config.key)
            ))));
        }
        url.finish()?;
        Ok(config)
    }
}
