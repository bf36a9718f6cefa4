use crate::{
    ConnectUrl, ConversionPolicy, Entity, Error, Field, Native, NativeMap, Result, StoreError,
    Value, WriterRegistry,
};
use std::{borrow::Cow, str::FromStr, sync::Arc};

/// Native shape of a sub-document (`Value::Documents`).
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubDocumentLayout {
    /// A list of single entry maps, one per field: `[{a: 1}, {b: 2}]`.
    #[default]
    Singleton,
    /// One map holding every field: `{a: 1, b: 2}`.
    Embedded,
}

impl FromStr for SubDocumentLayout {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "singleton" => Ok(Self::Singleton),
            "embedded" => Ok(Self::Embedded),
            _ => Err(Error::new(StoreError::InvalidConfiguration(format!(
                "unknown sub-document layout `{s}`, expected `singleton` or `embedded`"
            )))),
        }
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConverterConfig {
    pub policy: ConversionPolicy,
    pub layout: SubDocumentLayout,
}

impl ConverterConfig {
    /// Reads the `policy` and `layout` parameters.
    pub fn from_url(url: &mut ConnectUrl) -> Result<Self> {
        let mut config = Self::default();
        if let Some(policy) = url.take("policy") {
            config.policy = policy.parse()?;
        }
        if let Some(layout) = url.take("layout") {
            config.layout = layout.parse()?;
        }
        Ok(config)
    }
}

/// Maps entities to the native nested shape of a back end and back.
///
/// # Writing
/// - Scalars go through the first compatible writer of the registry, or pass through.
///   Under [`ConversionPolicy::Strict`] a custom value without writer is an error.
/// - `Document(field)` becomes the single entry map `{field.name: value}`.
/// - `Documents(fields)` follows the [`SubDocumentLayout`].
/// - Lists are converted element by element.
///
/// # Reading
/// - A map becomes `Documents`.
/// - A list made only of maps becomes one `Documents` concatenating the fields of every
///   element (`Singleton`) or a list of `Documents` (`Embedded`).
/// - A list mixing maps and other values is kept opaque: it becomes a `List` whose maps
///   are `Value::Map`, never partially expanded.
///
/// A `Document(field)` reads back as `Documents([field])`.
#[derive(Debug)]
pub struct Converter {
    registry: Arc<WriterRegistry>,
    config: ConverterConfig,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(Arc::new(WriterRegistry::empty()), ConverterConfig::default())
    }
}

impl Converter {
    pub fn new(registry: Arc<WriterRegistry>, config: ConverterConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn registry(&self) -> &WriterRegistry {
        &self.registry
    }

    pub fn to_native(&self, entity: &Entity) -> Result<NativeMap> {
        self.to_native_excluding(entity, &[])
    }

    /// Like [`Converter::to_native`] but without the `reserved` fields.
    pub fn to_native_excluding(&self, entity: &Entity, reserved: &[&str]) -> Result<NativeMap> {
        let mut result = NativeMap::with_capacity(entity.len());
        for field in entity.fields() {
            if reserved.contains(&field.name()) {
                continue;
            }
            let native = self.to_native_value(&field.value).map_err(|e| {
                e.context(format!(
                    "While converting the field `{}` of `{}`",
                    field.name, entity.collection
                ))
            })?;
            if result.insert(field.name.to_string(), native).is_some() {
                log::warn!(
                    "The field `{}` of `{}` appears more than once, the last value is written",
                    field.name,
                    entity.collection
                );
            }
        }
        Ok(result)
    }

    pub fn to_native_value(&self, value: &Value) -> Result<Native> {
        Ok(match value {
            Value::Document(field) => Native::Map(NativeMap::from_iter([(
                field.name.to_string(),
                self.to_native_value(&field.value)?,
            )])),
            Value::Documents(fields) => match self.config.layout {
                SubDocumentLayout::Singleton => Native::List(
                    fields
                        .iter()
                        .map(|f| {
                            Ok(Native::Map(NativeMap::from_iter([(
                                f.name.to_string(),
                                self.to_native_value(&f.value)?,
                            )])))
                        })
                        .collect::<Result<_>>()?,
                ),
                SubDocumentLayout::Embedded => Native::Map(self.fields_to_map(fields)?),
            },
            Value::List(Some(values), ..) => Native::List(
                values
                    .iter()
                    .map(|v| self.to_native_value(v))
                    .collect::<Result<_>>()?,
            ),
            Value::Map(Some(map)) => Native::Map(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), self.to_native_value(v)?)))
                    .collect::<Result<_>>()?,
            ),
            _ => Native::Scalar(self.write_scalar(value)?),
        })
    }

    fn fields_to_map(&self, fields: &[Field]) -> Result<NativeMap> {
        fields
            .iter()
            .map(|f| Ok((f.name.to_string(), self.to_native_value(&f.value)?)))
            .collect()
    }

    fn write_scalar(&self, value: &Value) -> Result<Value> {
        match self.registry.write(value) {
            Some(result) => result.map_err(|e| {
                let detail = format!("{:#}", e);
                e.context(StoreError::Conversion {
                    kind: value.kind(),
                    detail,
                })
            }),
            None => match (value, self.config.policy) {
                (Value::Custom(custom), ConversionPolicy::Strict) => {
                    Err(Error::new(StoreError::Conversion {
                        kind: value.kind(),
                        detail: format!("no writer is registered for {}", custom.type_name()),
                    }))
                }
                _ => Ok(value.clone()),
            },
        }
    }

    pub fn from_native(
        &self,
        native: NativeMap,
        collection: impl Into<Cow<'static, str>>,
    ) -> Entity {
        Entity::with_fields(
            collection,
            native
                .into_iter()
                .map(|(name, value)| Field::new(name, self.from_native_value(value))),
        )
    }

    pub fn from_native_value(&self, native: Native) -> Value {
        match native {
            Native::Scalar(v) => v,
            Native::Map(map) => Value::Documents(self.map_to_fields(map)),
            Native::List(elements)
                if !elements.is_empty() && elements.iter().all(Native::is_map) =>
            {
                let documents = elements.into_iter().filter_map(|v| match v {
                    Native::Map(map) => Some(self.map_to_fields(map)),
                    _ => None,
                });
                match self.config.layout {
                    SubDocumentLayout::Singleton => Value::Documents(documents.flatten().collect()),
                    SubDocumentLayout::Embedded => Value::List(
                        Some(documents.map(Value::Documents).collect()),
                        Box::new(Value::Documents(Vec::new())),
                    ),
                }
            }
            Native::List(elements) if elements.iter().any(Native::is_map) => {
                Native::List(elements).into_opaque_value()
            }
            Native::List(elements) => Value::List(
                Some(
                    elements
                        .into_iter()
                        .map(|v| self.from_native_value(v))
                        .collect(),
                ),
                Box::new(Value::Null),
            ),
        }
    }

    fn map_to_fields(&self, map: NativeMap) -> Vec<Field> {
        map.into_iter()
            .map(|(name, value)| Field::new(name, self.from_native_value(value)))
            .collect()
    }

    /// Refreshes the identity fields of a written entity: the stale fields with the same
    /// names are removed, then the fresh ones appended.
    pub fn apply_identity(entity: &mut Entity, fields: impl IntoIterator<Item = Field>) {
        for field in fields {
            entity.replace(field);
        }
    }

    pub fn require_identity<'a>(entity: &'a Entity, name: &str) -> Result<&'a Field> {
        entity
            .find(name)
            .filter(|v| !v.value.is_null())
            .ok_or_else(|| {
                Error::new(StoreError::MissingIdentityField {
                    collection: entity.collection.to_string(),
                    field: name.to_string(),
                })
            })
    }
}
