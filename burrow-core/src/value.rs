use crate::{AsValue, Field, Result, StoreError};
use anyhow::Context;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use std::{
    any::{self, Any, TypeId},
    fmt::{self, Debug, Display, Formatter},
    sync::Arc,
};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, format_description::well_known::Rfc3339};
use uuid::Uuid;

/// The payload of a field.
///
/// Scalars carry typed nulls (`Int32(None)` is a null integer), like a column would.
/// `Document` and `Documents` hold nested sub-documents, `List` an ordered sequence of
/// values and `Custom` any application type that a registered writer knows how to turn
/// into a native scalar.
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    UInt8(Option<u8>),
    UInt16(Option<u16>),
    UInt32(Option<u32>),
    UInt64(Option<u64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    TimestampWithTimezone(Option<OffsetDateTime>),
    Uuid(Option<Uuid>),
    List(Option<Vec<Value>>, /* type: */ Box<Value>),
    /// String keyed map that was not expanded into fields, in the order the back end sent it.
    Map(Option<IndexMap<String, Value>>),
    /// A single named sub-document.
    Document(Box<Field>),
    /// A sub-document: an ordered sequence of fields.
    Documents(Vec<Field>),
    Custom(CustomValue),
}

/// Shape descriptor of a [`Value`], used to key value writers and to report errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    Null,
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Decimal,
    Varchar,
    Blob,
    Date,
    Time,
    Timestamp,
    TimestampWithTimezone,
    Uuid,
    List,
    Map,
    Document,
    Documents,
    Custom,
}

impl ValueKind {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ValueKind::Int8
                | ValueKind::Int16
                | ValueKind::Int32
                | ValueKind::Int64
                | ValueKind::UInt8
                | ValueKind::UInt16
                | ValueKind::UInt32
                | ValueKind::UInt64
                | ValueKind::Float32
                | ValueKind::Float64
                | ValueKind::Decimal
        )
    }
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            ValueKind::Date
                | ValueKind::Time
                | ValueKind::Timestamp
                | ValueKind::TimestampWithTimezone
        )
    }
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

/// Application type carried through the entity model untouched.
///
/// Two custom values are equal when they share the same allocation.
#[derive(Clone)]
pub struct CustomValue {
    type_id: TypeId,
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl CustomValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: any::type_name::<T>(),
            inner: Arc::new(value),
        }
    }
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
    pub fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self.inner.as_ref()
    }
}

impl Debug for CustomValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "CustomValue({})", self.type_name)
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::Int8(l), Self::Int8(r)) => l == r,
            (Self::Int16(l), Self::Int16(r)) => l == r,
            (Self::Int32(l), Self::Int32(r)) => l == r,
            (Self::Int64(l), Self::Int64(r)) => l == r,
            (Self::UInt8(l), Self::UInt8(r)) => l == r,
            (Self::UInt16(l), Self::UInt16(r)) => l == r,
            (Self::UInt32(l), Self::UInt32(r)) => l == r,
            (Self::UInt64(l), Self::UInt64(r)) => l == r,
            (Self::Float32(l), Self::Float32(r)) => l == r,
            (Self::Float64(l), Self::Float64(r)) => l == r,
            (Self::Decimal(l), Self::Decimal(r)) => l == r,
            (Self::Varchar(l), Self::Varchar(r)) => l == r,
            (Self::Blob(l), Self::Blob(r)) => l == r,
            (Self::Date(l), Self::Date(r)) => l == r,
            (Self::Time(l), Self::Time(r)) => l == r,
            (Self::Timestamp(l), Self::Timestamp(r)) => l == r,
            (Self::TimestampWithTimezone(l), Self::TimestampWithTimezone(r)) => l == r,
            (Self::Uuid(l), Self::Uuid(r)) => l == r,
            // The element type is a hint, native lists do not carry it
            (Self::List(l, ..), Self::List(r, ..)) => l == r,
            (Self::Map(l), Self::Map(r)) => l == r,
            (Self::Document(l), Self::Document(r)) => l == r,
            (Self::Documents(l), Self::Documents(r)) => l == r,
            (Self::Custom(l), Self::Custom(r)) => l == r,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Boolean(..) => ValueKind::Boolean,
            Value::Int8(..) => ValueKind::Int8,
            Value::Int16(..) => ValueKind::Int16,
            Value::Int32(..) => ValueKind::Int32,
            Value::Int64(..) => ValueKind::Int64,
            Value::UInt8(..) => ValueKind::UInt8,
            Value::UInt16(..) => ValueKind::UInt16,
            Value::UInt32(..) => ValueKind::UInt32,
            Value::UInt64(..) => ValueKind::UInt64,
            Value::Float32(..) => ValueKind::Float32,
            Value::Float64(..) => ValueKind::Float64,
            Value::Decimal(..) => ValueKind::Decimal,
            Value::Varchar(..) => ValueKind::Varchar,
            Value::Blob(..) => ValueKind::Blob,
            Value::Date(..) => ValueKind::Date,
            Value::Time(..) => ValueKind::Time,
            Value::Timestamp(..) => ValueKind::Timestamp,
            Value::TimestampWithTimezone(..) => ValueKind::TimestampWithTimezone,
            Value::Uuid(..) => ValueKind::Uuid,
            Value::List(..) => ValueKind::List,
            Value::Map(..) => ValueKind::Map,
            Value::Document(..) => ValueKind::Document,
            Value::Documents(..) => ValueKind::Documents,
            Value::Custom(..) => ValueKind::Custom,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Value::Null
            | Value::Boolean(None)
            | Value::Int8(None)
            | Value::Int16(None)
            | Value::Int32(None)
            | Value::Int64(None)
            | Value::UInt8(None)
            | Value::UInt16(None)
            | Value::UInt32(None)
            | Value::UInt64(None)
            | Value::Float32(None)
            | Value::Float64(None)
            | Value::Decimal(None)
            | Value::Varchar(None)
            | Value::Blob(None)
            | Value::Date(None)
            | Value::Time(None)
            | Value::Timestamp(None)
            | Value::TimestampWithTimezone(None)
            | Value::Uuid(None)
            | Value::List(None, ..)
            | Value::Map(None) => true,
            _ => false,
        }
    }

    /// True for everything but lists, maps and sub-documents.
    pub fn is_scalar(&self) -> bool {
        !matches!(
            self,
            Value::List(..) | Value::Map(..) | Value::Document(..) | Value::Documents(..)
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Varchar(Some(v)) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(Some(v), ..) => Some(v),
            _ => None,
        }
    }

    /// Typed get: converts a copy of the value into `T`.
    pub fn get<T: AsValue>(&self) -> Result<T> {
        T::try_from_value(self.clone())
            .map_err(|e| {
                let detail = format!("{:#}", e);
                e.context(StoreError::Conversion {
                    kind: self.kind(),
                    detail,
                })
            })
            .with_context(|| format!("While reading the value as {}", any::type_name::<T>()))
    }

    /// Renders a non null scalar as text, the representation of byte and text only back ends.
    pub fn to_text(&self) -> Option<String> {
        macro_rules! integer {
            ($v:expr) => {{
                let mut buffer = itoa::Buffer::new();
                buffer.format(*$v).to_owned()
            }};
        }
        macro_rules! float {
            ($v:expr) => {{
                let mut buffer = ryu::Buffer::new();
                buffer.format(*$v).to_owned()
            }};
        }
        Some(match self {
            Value::Boolean(Some(v)) => v.to_string(),
            Value::Int8(Some(v)) => integer!(v),
            Value::Int16(Some(v)) => integer!(v),
            Value::Int32(Some(v)) => integer!(v),
            Value::Int64(Some(v)) => integer!(v),
            Value::UInt8(Some(v)) => integer!(v),
            Value::UInt16(Some(v)) => integer!(v),
            Value::UInt32(Some(v)) => integer!(v),
            Value::UInt64(Some(v)) => integer!(v),
            Value::Float32(Some(v)) => float!(v),
            Value::Float64(Some(v)) => float!(v),
            Value::Decimal(Some(v)) => v.to_string(),
            Value::Varchar(Some(v)) => v.clone(),
            Value::Blob(Some(v)) => hex::encode(v),
            Value::Date(Some(v)) => v.to_string(),
            Value::Time(Some(v)) => v.to_string(),
            Value::Timestamp(Some(v)) => v.assume_utc().format(&Rfc3339).ok()?,
            Value::TimestampWithTimezone(Some(v)) => v.format(&Rfc3339).ok()?,
            Value::Uuid(Some(v)) => v.hyphenated().to_string(),
            _ => return None,
        })
    }
}

impl From<Field> for Value {
    fn from(value: Field) -> Self {
        Value::Document(Box::new(value))
    }
}

impl From<Vec<Field>> for Value {
    fn from(value: Vec<Field>) -> Self {
        Value::Documents(value)
    }
}

impl From<CustomValue> for Value {
    fn from(value: CustomValue) -> Self {
        Value::Custom(value)
    }
}
