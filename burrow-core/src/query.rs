use crate::{Condition, Error, Result, StoreError};
use std::{
    borrow::Cow,
    fmt::{self, Display, Formatter},
    str::FromStr,
};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub name: Cow<'static, str>,
    pub order: Order,
}

impl Sort {
    pub fn asc(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            order: Order::Asc,
        }
    }
    pub fn desc(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            order: Order::Desc,
        }
    }
}

/// Consistency levels a paging back end may honour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Consistency {
    Any,
    One,
    Two,
    Three,
    Quorum,
    All,
    LocalQuorum,
    EachQuorum,
    Serial,
    LocalSerial,
    LocalOne,
}

impl Display for Consistency {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Consistency::Any => "ANY",
            Consistency::One => "ONE",
            Consistency::Two => "TWO",
            Consistency::Three => "THREE",
            Consistency::Quorum => "QUORUM",
            Consistency::All => "ALL",
            Consistency::LocalQuorum => "LOCAL_QUORUM",
            Consistency::EachQuorum => "EACH_QUORUM",
            Consistency::Serial => "SERIAL",
            Consistency::LocalSerial => "LOCAL_SERIAL",
            Consistency::LocalOne => "LOCAL_ONE",
        })
    }
}

impl FromStr for Consistency {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "ANY" => Consistency::Any,
            "ONE" => Consistency::One,
            "TWO" => Consistency::Two,
            "THREE" => Consistency::Three,
            "QUORUM" => Consistency::Quorum,
            "ALL" => Consistency::All,
            "LOCAL_QUORUM" => Consistency::LocalQuorum,
            "EACH_QUORUM" => Consistency::EachQuorum,
            "SERIAL" => Consistency::Serial,
            "LOCAL_SERIAL" => Consistency::LocalSerial,
            "LOCAL_ONE" => Consistency::LocalOne,
            _ => {
                return Err(Error::new(StoreError::InvalidConfiguration(format!(
                    "unknown consistency level `{s}`"
                ))));
            }
        })
    }
}

/// Read request over one collection.
///
/// Built once and never mutated by the executor: the position inside the result lives in
/// the [`crate::Cursor`] returned with every page.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: Cow<'static, str>,
    pub condition: Option<Condition>,
    pub sorts: Vec<Sort>,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
    pub projection: Vec<Cow<'static, str>>,
    pub consistency: Option<Consistency>,
    pub fetch_size: Option<u32>,
}

impl Query {
    pub fn select(collection: impl Into<Cow<'static, str>>) -> Self {
        Self {
            collection: collection.into(),
            ..Default::default()
        }
    }
    pub fn filter(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }
    pub fn sort(mut self, sort: Sort) -> Self {
        self.sorts.push(sort);
        self
    }
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }
    pub fn project<S>(mut self, names: impl IntoIterator<Item = S>) -> Self
    where
        S: Into<Cow<'static, str>>,
    {
        self.projection.extend(names.into_iter().map(Into::into));
        self
    }
    pub fn consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = Some(consistency);
        self
    }
    pub fn fetch_size(mut self, fetch_size: u32) -> Self {
        self.fetch_size = Some(fetch_size);
        self
    }
    pub fn require_collection(&self) -> Result<&str> {
        if self.collection.trim().is_empty() {
            return Err(Error::new(StoreError::MissingCollection));
        }
        Ok(&self.collection)
    }
}

/// Removal request: every entity of `collection` matching `condition` (all of them when
/// there is no condition and the back end allows it).
#[derive(Default, Debug, Clone, PartialEq)]
pub struct DeleteQuery {
    pub collection: Cow<'static, str>,
    pub condition: Option<Condition>,
    /// Fields to remove instead of whole entities, on back ends that support it.
    pub projection: Vec<Cow<'static, str>>,
}

impl DeleteQuery {
    pub fn delete(collection: impl Into<Cow<'static, str>>) -> Self {
        Self {
            collection: collection.into(),
            ..Default::default()
        }
    }
    pub fn filter(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }
    pub fn project<S>(mut self, names: impl IntoIterator<Item = S>) -> Self
    where
        S: Into<Cow<'static, str>>,
    {
        self.projection = names.into_iter().map(Into::into).collect();
        self
    }
    pub fn require_collection(&self) -> Result<&str> {
        if self.collection.trim().is_empty() {
            return Err(Error::new(StoreError::MissingCollection));
        }
        Ok(&self.collection)
    }
}
