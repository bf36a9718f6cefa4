use crate::{Error, Result, StoreError};
use anyhow::Context;
use std::env;
use url::Url;
use urlencoding::decode;

/// Characters kept by [`truncate_long!`] before the ellipsis.
pub const TRUNCATE_AT: usize = 497;

/// Longest prefix of `text` holding at most `chars` characters.
pub fn char_prefix(text: &str, chars: usize) -> &str {
    match text.char_indices().nth(chars) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

#[macro_export]
macro_rules! truncate_long {
    ($text:expr) => {
        format_args!(
            "{}{}",
            $crate::char_prefix(&$text, $crate::TRUNCATE_AT).trim_end(),
            if $text.chars().nth($crate::TRUNCATE_AT).is_some() { "..." } else { "" },
        )
    };
}

/// Connection url of a back end: `<driver>://<host>?key=value&...`.
///
/// Parameters are consumed with [`ConnectUrl::take`], which falls back to the
/// `BURROW_<KEY>` environment variable. [`ConnectUrl::finish`] rejects whatever is left.
#[derive(Debug, Clone)]
pub struct ConnectUrl {
    url: Url,
    pairs: Vec<(String, String)>,
}

impl ConnectUrl {
    pub fn parse(driver: &str, url: &str) -> Result<Self> {
        let context = || format!("While parsing the connection url `{}`", truncate_long!(url));
        let decoded = decode(url).with_context(context)?;
        let prefix = format!("{}://", driver);
        if !decoded.starts_with(&prefix) {
            let error = Error::new(StoreError::InvalidConfiguration(format!(
                "the connection url must start with `{}`",
                prefix
            )))
            .context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        let url = Url::parse(&decoded)
            .map_err(|e| StoreError::InvalidConfiguration(e.to_string()))
            .with_context(context)?;
        let pairs = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Ok(Self { url, pairs })
    }

    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Removes the parameter from the url, or reads `BURROW_<KEY>` if missing.
    pub fn take(&mut self, key: &str) -> Option<String> {
        if let Some(pos) = self.pairs.iter().position(|(k, _)| k == key) {
            return Some(self.pairs.remove(pos).1);
        }
        env::var(format!("BURROW_{}", key.to_ascii_uppercase())).ok()
    }

    /// Takes the parameter and parses it, `None` when absent.
    pub fn take_parsed<T>(&mut self, key: &str) -> Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.take(key)
            .map(|v| {
                v.parse::<T>().map_err(|e| {
                    Error::new(StoreError::InvalidConfiguration(format!(
                        "parameter `{key}` has the invalid value `{v}`: {e}"
                    )))
                })
            })
            .transpose()
    }

    /// Fails when parameters that nobody took are still present.
    pub fn finish(self) -> Result<()> {
        if self.pairs.is_empty() {
            return Ok(());
        }
        let names = self
            .pairs
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let error = Error::new(StoreError::InvalidConfiguration(format!(
            "unknown parameters: {names}"
        )));
        log::error!("{:#}", error);
        Err(error)
    }
}
