use crate::{CustomValue, Error, Result, StoreError, Value, ValueKind};
use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt::{self, Debug, Formatter},
    sync::Arc,
};
use time::{format_description::well_known::Rfc3339, macros::format_description};

/// Turns a value into the native scalar a back end stores.
pub trait ValueWriter: Send + Sync {
    fn is_compatible(&self, value: &Value) -> bool;
    fn write(&self, value: &Value) -> Result<Value>;
}

/// What to do with a custom value that no writer accepts.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionPolicy {
    /// Keep the value unchanged.
    #[default]
    PassThrough,
    /// Fail with [`StoreError::Conversion`].
    Strict,
}

impl std::str::FromStr for ConversionPolicy {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pass-through" | "passthrough" => Ok(Self::PassThrough),
            "strict" => Ok(Self::Strict),
            _ => Err(Error::new(StoreError::InvalidConfiguration(format!(
                "unknown conversion policy `{s}`, expected `pass-through` or `strict`"
            )))),
        }
    }
}

type CustomWriteFn = dyn Fn(&(dyn Any + Send + Sync)) -> Result<Value> + Send + Sync;

/// Immutable capability table consulted by the [`crate::Converter`].
///
/// Custom values are looked up by the `TypeId` of the wrapped type, every other value by
/// its [`ValueKind`]. For a given key the first registered writer wins.
#[derive(Default)]
pub struct WriterRegistry {
    by_kind: HashMap<ValueKind, Vec<Arc<dyn ValueWriter>>>,
    by_type: HashMap<TypeId, Arc<CustomWriteFn>>,
}

impl WriterRegistry {
    pub fn builder() -> WriterRegistryBuilder {
        WriterRegistryBuilder::default()
    }

    /// A registry without writers: every value passes through.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Writers rendering temporal values, uuids and decimals as text, the common ground
    /// of document stores.
    pub fn text() -> Self {
        let temporal = Arc::new(TemporalTextWriter);
        Self::builder()
            .kind(ValueKind::Date, temporal.clone())
            .kind(ValueKind::Time, temporal.clone())
            .kind(ValueKind::Timestamp, temporal.clone())
            .kind(ValueKind::TimestampWithTimezone, temporal)
            .kind(ValueKind::Uuid, Arc::new(UuidTextWriter))
            .kind(ValueKind::Decimal, Arc::new(DecimalTextWriter))
            .build()
    }

    pub fn is_compatible(&self, value: &Value) -> bool {
        if let Value::Custom(custom) = value {
            return self.by_type.contains_key(&custom.type_id());
        }
        self.by_kind
            .get(&value.kind())
            .is_some_and(|writers| writers.iter().any(|w| w.is_compatible(value)))
    }

    /// Writes the value with the first compatible writer, `None` when there is none.
    pub fn write(&self, value: &Value) -> Option<Result<Value>> {
        if let Value::Custom(custom) = value {
            return self.write_custom(custom);
        }
        self.by_kind
            .get(&value.kind())?
            .iter()
            .find(|w| w.is_compatible(value))
            .map(|w| w.write(value))
    }

    fn write_custom(&self, custom: &CustomValue) -> Option<Result<Value>> {
        self.by_type
            .get(&custom.type_id())
            .map(|write| write(custom.as_any()))
    }
}

impl Debug for WriterRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterRegistry")
            .field("kinds", &self.by_kind.keys().collect::<Vec<_>>())
            .field("custom", &self.by_type.len())
            .finish()
    }
}

#[derive(Default)]
pub struct WriterRegistryBuilder {
    registry: WriterRegistry,
}

impl WriterRegistryBuilder {
    pub fn kind(mut self, kind: ValueKind, writer: Arc<dyn ValueWriter>) -> Self {
        self.registry.by_kind.entry(kind).or_default().push(writer);
        self
    }

    /// Registers the writer of the application type `T` carried by [`Value::Custom`].
    pub fn custom<T, F>(mut self, write: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> Result<Value> + Send + Sync + 'static,
    {
        let write: Arc<CustomWriteFn> = Arc::new(move |value: &(dyn Any + Send + Sync)| {
            match value.downcast_ref::<T>() {
                Some(v) => write(v),
                None => Err(Error::new(StoreError::Conversion {
                    kind: ValueKind::Custom,
                    detail: format!("expected {}", std::any::type_name::<T>()),
                })),
            }
        });
        self.registry
            .by_type
            .entry(TypeId::of::<T>())
            .or_insert(write);
        self
    }

    pub fn build(self) -> WriterRegistry {
        self.registry
    }
}

/// Any scalar to `Varchar`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextWriter;

impl ValueWriter for TextWriter {
    fn is_compatible(&self, value: &Value) -> bool {
        value.is_scalar() && !value.is_null() && !matches!(value, Value::Custom(..))
    }
    fn write(&self, value: &Value) -> Result<Value> {
        value.to_text().map(|v| Value::Varchar(Some(v))).ok_or_else(|| {
            Error::new(StoreError::Conversion {
                kind: value.kind(),
                detail: "no text representation".into(),
            })
        })
    }
}

/// Dates and times to ISO-8601 text.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemporalTextWriter;

impl ValueWriter for TemporalTextWriter {
    fn is_compatible(&self, value: &Value) -> bool {
        value.kind().is_temporal() && !value.is_null()
    }
    fn write(&self, value: &Value) -> Result<Value> {
        let text = match value {
            Value::Date(Some(v)) => v.to_string(),
            Value::Time(Some(v)) => {
                v.format(format_description!("[hour]:[minute]:[second].[subsecond]"))?
            }
            Value::Timestamp(Some(v)) => v.format(format_description!(
                "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"
            ))?,
            Value::TimestampWithTimezone(Some(v)) => v.format(&Rfc3339)?,
            _ => {
                return Err(Error::new(StoreError::Conversion {
                    kind: value.kind(),
                    detail: "not a temporal value".into(),
                }));
            }
        };
        Ok(Value::Varchar(Some(text)))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UuidTextWriter;

impl ValueWriter for UuidTextWriter {
    fn is_compatible(&self, value: &Value) -> bool {
        matches!(value, Value::Uuid(Some(..)))
    }
    fn write(&self, value: &Value) -> Result<Value> {
        match value {
            Value::Uuid(Some(v)) => Ok(Value::Varchar(Some(v.hyphenated().to_string()))),
            _ => Err(Error::new(StoreError::Conversion {
                kind: value.kind(),
                detail: "not a uuid".into(),
            })),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DecimalTextWriter;

impl ValueWriter for DecimalTextWriter {
    fn is_compatible(&self, value: &Value) -> bool {
        matches!(value, Value::Decimal(Some(..)))
    }
    fn write(&self, value: &Value) -> Result<Value> {
        match value {
            Value::Decimal(Some(v)) => Ok(Value::Varchar(Some(v.to_string()))),
            _ => Err(Error::new(StoreError::Conversion {
                kind: value.kind(),
                detail: "not a decimal".into(),
            })),
        }
    }
}
