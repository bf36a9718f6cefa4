use crate::{AsValue, Result, Value};
use anyhow::Context;
use std::borrow::Cow;

/// A named value inside an [`crate::Entity`] (a column or a document entry).
///
/// Equality is structural: same name and recursively equal value.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Field {
    pub name: Cow<'static, str>,
    pub value: Value,
}

impl Field {
    pub fn new(name: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Field holding a sub-document made of `fields`.
    pub fn documents(name: impl Into<Cow<'static, str>>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            value: Value::Documents(fields),
        }
    }

    /// Field holding a single named sub-document.
    pub fn document(name: impl Into<Cow<'static, str>>, field: Field) -> Self {
        Self {
            name: name.into(),
            value: Value::Document(Box::new(field)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn get<T: AsValue>(&self) -> Result<T> {
        self.value
            .get::<T>()
            .with_context(|| format!("While reading the field `{}`", self.name))
    }
}
