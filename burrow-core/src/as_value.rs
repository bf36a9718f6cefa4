use crate::{Error, Result, Value, truncate_long};
use anyhow::Context;
use atoi::{FromRadix10, FromRadix10Signed};
use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};
use std::{any, borrow::Cow, collections::VecDeque, str::FromStr};
use time::format_description::parse_borrowed;
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// # Conversion contract
/// - `as_value` wraps the value in its canonical variant (`i32` into `Value::Int32`).
/// - `try_from_value` accepts the canonical variant, narrower or wider numeric variants
///   when the number fits (range checked), and `Value::Varchar` through [`AsValue::parse`]
///   because text only back ends return every scalar as a string.
/// - Errors describe both the offending value and the target type.
///
/// # Examples
/// ```rust
/// use burrow_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert!(matches!(v, Value::Int32(Some(42))));
/// let n: i64 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// The typed null of this type. Used for the element type of empty lists.
    fn as_empty_value() -> Value;
    /// Convert into the owned [`Value`] representation.
    fn as_value(self) -> Value;
    /// Attempt to convert a dynamic [`Value`] into `Self`.
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
    /// Parse the whole input as `Self`.
    fn parse(input: &str) -> Result<Self>
    where
        Self: Sized,
    {
        Err(Error::msg(format!(
            "Cannot parse `{}` as {}",
            truncate_long!(input),
            any::type_name::<Self>()
        )))
    }
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

fn conversion_error<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {value:?} to {}",
        any::type_name::<T>(),
    ))
}

macro_rules! parse_integer {
    ($source:ty, $input:expr, $radix:ident) => {{
        let input = $input.trim();
        let (num, len) = <$source>::$radix(input.as_bytes());
        if len == 0 || len != input.len() {
            return Err(Error::msg(format!(
                "Cannot parse `{}` as {}",
                truncate_long!(input),
                any::type_name::<$source>()
            )));
        }
        Ok(num)
    }};
}

macro_rules! impl_as_value {
    ($source:ty, $destination:path, $radix:ident $(, $pat_rest:pat => $expr_rest:expr)* $(,)?) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => Ok(v),
                    $($pat_rest => $expr_rest,)*
                    Value::Int8(Some(v)) => narrow(v),
                    Value::Int16(Some(v)) => narrow(v),
                    Value::Int32(Some(v)) => narrow(v),
                    Value::Int64(Some(v)) => narrow(v),
                    Value::UInt8(Some(v)) => narrow(v),
                    Value::UInt16(Some(v)) => narrow(v),
                    Value::UInt32(Some(v)) => narrow(v),
                    Value::UInt64(Some(v)) => narrow(v),
                    Value::Decimal(Some(v)) => {
                        if !v.is_integer() {
                            return Err(Error::msg(format!("Value {v}: Decimal is not an integer")));
                        }
                        v.to_i128()
                            .and_then(|v| <$source>::try_from(v).ok())
                            .ok_or_else(|| out_of_range::<Self>(v))
                    }
                    Value::Varchar(Some(ref v)) => Self::parse(v),
                    _ => Err(conversion_error::<Self>(&value)),
                }
            }
            fn parse(input: &str) -> Result<Self> {
                parse_integer!($source, input, $radix)
            }
        }
    };
}

fn out_of_range<T>(v: impl std::fmt::Display) -> Error {
    Error::msg(format!(
        "Value {v} is out of range for {}",
        any::type_name::<T>()
    ))
}

fn narrow<T: TryFrom<S>, S: Copy + std::fmt::Display>(v: S) -> Result<T> {
    T::try_from(v).map_err(|_| out_of_range::<T>(v))
}

impl_as_value!(i8, Value::Int8, from_radix_10_signed);
impl_as_value!(i16, Value::Int16, from_radix_10_signed);
impl_as_value!(i32, Value::Int32, from_radix_10_signed);
impl_as_value!(i64, Value::Int64, from_radix_10_signed);
impl_as_value!(u8, Value::UInt8, from_radix_10);
impl_as_value!(u16, Value::UInt16, from_radix_10);
impl_as_value!(u32, Value::UInt32, from_radix_10);
impl_as_value!(u64, Value::UInt64, from_radix_10);

macro_rules! impl_as_value {
    ($source:ty, $destination:path, $parse:expr $(, $pat_rest:pat => $expr_rest:expr)* $(,)?) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self.into()))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => Ok(v.into()),
                    $($pat_rest => $expr_rest,)*
                    #[allow(unreachable_patterns)]
                    Value::Varchar(Some(ref v)) => <Self as AsValue>::parse(v),
                    _ => Err(conversion_error::<Self>(&value)),
                }
            }
            fn parse(input: &str) -> Result<Self> {
                $parse(input.trim())
            }
        }
    };
}

impl_as_value!(
    bool,
    Value::Boolean,
    |input: &str| match input {
        x if ["true", "t", "1"].iter().any(|v| x.eq_ignore_ascii_case(v)) => Ok(true),
        x if ["false", "f", "0"].iter().any(|v| x.eq_ignore_ascii_case(v)) => Ok(false),
        _ => Err(Error::msg(format!(
            "Cannot parse boolean from `{}`",
            truncate_long!(input)
        ))),
    },
    Value::Int8(Some(v)) => Ok(v != 0),
    Value::Int16(Some(v)) => Ok(v != 0),
    Value::Int32(Some(v)) => Ok(v != 0),
    Value::Int64(Some(v)) => Ok(v != 0),
    Value::UInt8(Some(v)) => Ok(v != 0),
    Value::UInt16(Some(v)) => Ok(v != 0),
    Value::UInt32(Some(v)) => Ok(v != 0),
    Value::UInt64(Some(v)) => Ok(v != 0),
);

macro_rules! parse_float {
    ($input:expr) => {{
        let input = $input;
        fast_float::parse(input).with_context(|| {
            format!(
                "Cannot parse a floating point value from `{}`",
                truncate_long!(input)
            )
        })
    }};
}
impl_as_value!(
    f32,
    Value::Float32,
    |input: &str| parse_float!(input),
    Value::Float64(Some(v)) => Ok(v as _),
    Value::Int8(Some(v)) => Ok(v as _),
    Value::Int16(Some(v)) => Ok(v as _),
    Value::UInt8(Some(v)) => Ok(v as _),
    Value::UInt16(Some(v)) => Ok(v as _),
    Value::Decimal(Some(v)) => v.to_f32().ok_or_else(|| out_of_range::<f32>(v)),
);
impl_as_value!(
    f64,
    Value::Float64,
    |input: &str| parse_float!(input),
    Value::Float32(Some(v)) => Ok(v as _),
    Value::Int8(Some(v)) => Ok(v as _),
    Value::Int16(Some(v)) => Ok(v as _),
    Value::Int32(Some(v)) => Ok(v as _),
    Value::UInt8(Some(v)) => Ok(v as _),
    Value::UInt16(Some(v)) => Ok(v as _),
    Value::UInt32(Some(v)) => Ok(v as _),
    Value::Decimal(Some(v)) => v.to_f64().ok_or_else(|| out_of_range::<f64>(v)),
);

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(v),
            Value::Uuid(Some(v)) => Ok(v.hyphenated().to_string()),
            _ => Err(conversion_error::<Self>(&value)),
        }
    }
    fn parse(input: &str) -> Result<Self> {
        Ok(input.to_owned())
    }
}

impl<'a> AsValue for Cow<'a, str> {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self.into()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        String::try_from_value(value).map(Into::into)
    }
}

impl_as_value!(
    Box<[u8]>,
    Value::Blob,
    |input: &str| {
        let digits = input.strip_prefix("\\x").unwrap_or(input);
        hex::decode(digits)
            .map(Into::into)
            .with_context(|| format!("While decoding `{}` as hex", truncate_long!(input)))
    },
);

impl_as_value!(
    Uuid,
    Value::Uuid,
    |input: &str| {
        Uuid::parse_str(input)
            .with_context(|| format!("Cannot parse a uuid from `{}`", truncate_long!(input)))
    },
);

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(Some(v)) => Ok(v),
            Value::Int8(Some(v)) => Ok(Decimal::from(v)),
            Value::Int16(Some(v)) => Ok(Decimal::from(v)),
            Value::Int32(Some(v)) => Ok(Decimal::from(v)),
            Value::Int64(Some(v)) => Ok(Decimal::from(v)),
            Value::UInt8(Some(v)) => Ok(Decimal::from(v)),
            Value::UInt16(Some(v)) => Ok(Decimal::from(v)),
            Value::UInt32(Some(v)) => Ok(Decimal::from(v)),
            Value::UInt64(Some(v)) => Ok(Decimal::from(v)),
            Value::Float32(Some(v)) => {
                Decimal::from_f32(v).ok_or_else(|| conversion_error::<Self>(&value))
            }
            Value::Float64(Some(v)) => {
                Decimal::from_f64(v).ok_or_else(|| conversion_error::<Self>(&value))
            }
            Value::Varchar(Some(ref v)) => Self::parse(v),
            _ => Err(conversion_error::<Self>(&value)),
        }
    }
    fn parse(input: &str) -> Result<Self> {
        Decimal::from_str(input.trim())
            .with_context(|| format!("Cannot parse a decimal from `{}`", truncate_long!(input)))
    }
}

macro_rules! parse_time {
    ($value:ident, $($formats:literal),+ $(,)?) => {
        'value: {
            for format in [$($formats,)+] {
                let format = parse_borrowed::<2>(format)?;
                if let Ok(result) = <Self>::parse($value, &format) {
                    break 'value Ok(result);
                }
            }
            Err(Error::msg(format!(
                "Cannot parse `{}` as {}",
                truncate_long!($value),
                any::type_name::<Self>()
            )))
        }
    };
}

impl_as_value!(
    time::Date,
    Value::Date,
    |v: &str| parse_time!(v, "[year]-[month]-[day]"),
    Value::Timestamp(Some(v)) => Ok(v.date()),
);

impl_as_value!(
    time::Time,
    Value::Time,
    |v: &str| parse_time!(
        v,
        "[hour]:[minute]:[second].[subsecond]",
        "[hour]:[minute]:[second]",
        "[hour]:[minute]",
    ),
);

impl_as_value!(
    time::PrimitiveDateTime,
    Value::Timestamp,
    |v: &str| parse_time!(
        v,
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]",
        "[year]-[month]-[day]T[hour]:[minute]:[second]",
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]",
        "[year]-[month]-[day] [hour]:[minute]:[second]",
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]Z",
        "[year]-[month]-[day]T[hour]:[minute]:[second]Z",
    ),
);

impl_as_value!(
    time::OffsetDateTime,
    Value::TimestampWithTimezone,
    |v: &str| parse_time!(
        v,
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]:[offset_minute]",
        "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]",
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]:[offset_minute]",
        "[year]-[month]-[day] [hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]",
    )
    .or_else(|_: Error| {
        time::OffsetDateTime::parse(v, &time::format_description::well_known::Rfc3339)
            .map_err(Error::new)
    }),
    Value::Timestamp(Some(v)) => Ok(v.assume_utc()),
);

macro_rules! impl_as_value {
    ($source:ident) => {
        impl<T: AsValue> AsValue for $source<T> {
            fn as_empty_value() -> Value {
                Value::List(None, Box::new(T::as_empty_value()))
            }
            fn as_value(self) -> Value {
                Value::List(
                    Some(self.into_iter().map(AsValue::as_value).collect()),
                    Box::new(T::as_empty_value()),
                )
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    Value::List(Some(v), ..) => v
                        .into_iter()
                        .map(<T as AsValue>::try_from_value)
                        .collect::<Result<_>>(),
                    Value::List(None, ..) => Ok($source::<T>::new()),
                    _ => Err(conversion_error::<Self>(&value)),
                }
            }
        }
    };
}
impl_as_value!(Vec);
impl_as_value!(VecDeque);

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Ok(if value.is_null() {
            None
        } else {
            Some(<T as AsValue>::try_from_value(value)?)
        })
    }
}

impl<T: AsValue> AsValue for Box<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        (*self).as_value()
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Ok(Self::new(<T as AsValue>::try_from_value(value)?))
    }
}
