use crate::{Error, Field, Result, StoreError, Value};
use std::{borrow::Cow, collections::BTreeMap};

/// One logical record: a collection name and an ordered sequence of fields.
///
/// Field names are not unique: adding a field whose name is already present keeps both,
/// [`Entity::find`] returns the first one in insertion order. Use [`Entity::replace`] to
/// overwrite.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Entity {
    pub collection: Cow<'static, str>,
    fields: Vec<Field>,
}

impl Entity {
    pub fn new(collection: impl Into<Cow<'static, str>>) -> Self {
        Self {
            collection: collection.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_fields(
        collection: impl Into<Cow<'static, str>>,
        fields: impl IntoIterator<Item = Field>,
    ) -> Self {
        Self {
            collection: collection.into(),
            fields: fields.into_iter().collect(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn add(&mut self, field: Field) -> &mut Self {
        self.fields.push(field);
        self
    }

    /// Shorthand for `add(Field::new(name, value))`.
    pub fn set(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.add(Field::new(name, value))
    }

    pub fn add_all(&mut self, fields: impl IntoIterator<Item = Field>) -> &mut Self {
        self.fields.extend(fields);
        self
    }

    pub fn find(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|v| v.name == name)
    }

    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Field> + 'a {
        self.fields.iter().filter(move |v| v.name == name)
    }

    /// Removes every field named `name`, returns how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.fields.len();
        self.fields.retain(|v| v.name != name);
        before - self.fields.len()
    }

    /// Removes the stale fields with the same name, then appends `field`.
    pub fn replace(&mut self, field: Field) -> &mut Self {
        self.remove(&field.name);
        self.add(field)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|v| v.name.as_ref())
    }

    pub fn into_fields(self) -> Vec<Field> {
        self.fields
    }

    /// Name to value view, the first occurrence of a name wins.
    pub fn to_map(&self) -> BTreeMap<String, Value> {
        let mut result = BTreeMap::new();
        for field in &self.fields {
            result
                .entry(field.name.to_string())
                .or_insert_with(|| field.value.clone());
        }
        result
    }

    pub fn require_collection(&self) -> Result<&str> {
        if self.collection.trim().is_empty() {
            return Err(Error::new(StoreError::MissingCollection));
        }
        Ok(&self.collection)
    }
}

impl IntoIterator for Entity {
    type Item = Field;
    type IntoIter = std::vec::IntoIter<Field>;
    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Entity {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;
    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
