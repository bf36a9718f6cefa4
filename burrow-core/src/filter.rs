use crate::{
    Converter, Error, Field, NativeMap, Operator, OperatorSet, PredicateBuilder, Result,
    StoreError, Value,
};
use rust_decimal::prelude::ToPrimitive;
use std::{cmp::Ordering, sync::Arc};

/// Predicate evaluated on the client over fetched rows, for back ends without native
/// filtering.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Leaf {
        operator: Operator,
        name: String,
        value: Value,
    },
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    /// A field missing from the row never matches.
    pub fn matches(&self, row: &NativeMap) -> bool {
        match self {
            Filter::And(children) => children.iter().all(|v| v.matches(row)),
            Filter::Or(children) => children.iter().any(|v| v.matches(row)),
            Filter::Leaf {
                operator,
                name,
                value,
            } => {
                let Some(actual) = row.get(name.as_str()) else {
                    return false;
                };
                let actual = actual.clone().into_opaque_value();
                match operator {
                    Operator::Equals => equals(&actual, value),
                    Operator::In => value
                        .as_list()
                        .is_some_and(|values| values.iter().any(|v| equals(&actual, v))),
                    Operator::Like => match (actual.as_str(), value.as_str()) {
                        (Some(text), Some(pattern)) => like(text, pattern),
                        _ => false,
                    },
                    Operator::GreaterThan => {
                        compare_values(&actual, value) == Some(Ordering::Greater)
                    }
                    Operator::GreaterEqualsThan => matches!(
                        compare_values(&actual, value),
                        Some(Ordering::Greater | Ordering::Equal)
                    ),
                    Operator::LesserThan => compare_values(&actual, value) == Some(Ordering::Less),
                    Operator::LesserEqualsThan => matches!(
                        compare_values(&actual, value),
                        Some(Ordering::Less | Ordering::Equal)
                    ),
                    Operator::And | Operator::Or => false,
                }
            }
        }
    }
}

fn as_integer(value: &Value) -> Option<i128> {
    Some(match value {
        Value::Int8(Some(v)) => *v as i128,
        Value::Int16(Some(v)) => *v as i128,
        Value::Int32(Some(v)) => *v as i128,
        Value::Int64(Some(v)) => *v as i128,
        Value::UInt8(Some(v)) => *v as i128,
        Value::UInt16(Some(v)) => *v as i128,
        Value::UInt32(Some(v)) => *v as i128,
        Value::UInt64(Some(v)) => *v as i128,
        _ => return None,
    })
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Float32(Some(v)) => Some(*v as f64),
        Value::Float64(Some(v)) => Some(*v),
        Value::Decimal(Some(v)) => v.to_f64(),
        _ => as_integer(value).map(|v| v as f64),
    }
}

/// Ordering of two values of comparable kinds, `None` when they cannot be ordered.
///
/// Integers compare exactly across widths, mixed numeric kinds as `f64`.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    if a.is_null() || b.is_null() {
        return None;
    }
    if let (Some(a), Some(b)) = (as_integer(a), as_integer(b)) {
        return Some(a.cmp(&b));
    }
    if let (Value::Decimal(Some(a)), Value::Decimal(Some(b))) = (a, b) {
        return Some(a.cmp(b));
    }
    match (a, b) {
        (Value::Boolean(Some(a)), Value::Boolean(Some(b))) => Some(a.cmp(b)),
        (Value::Varchar(Some(a)), Value::Varchar(Some(b))) => Some(a.cmp(b)),
        (Value::Blob(Some(a)), Value::Blob(Some(b))) => Some(a.cmp(b)),
        (Value::Date(Some(a)), Value::Date(Some(b))) => Some(a.cmp(b)),
        (Value::Time(Some(a)), Value::Time(Some(b))) => Some(a.cmp(b)),
        (Value::Timestamp(Some(a)), Value::Timestamp(Some(b))) => Some(a.cmp(b)),
        (Value::TimestampWithTimezone(Some(a)), Value::TimestampWithTimezone(Some(b))) => {
            Some(a.cmp(b))
        }
        (Value::Uuid(Some(a)), Value::Uuid(Some(b))) => Some(a.cmp(b)),
        _ if a.kind().is_numeric() && b.kind().is_numeric() => {
            as_float(a)?.partial_cmp(&as_float(b)?)
        }
        _ => None,
    }
}

fn equals(a: &Value, b: &Value) -> bool {
    if a.is_null() && b.is_null() {
        return true;
    }
    match compare_values(a, b) {
        Some(ordering) => ordering == Ordering::Equal,
        None => a == b,
    }
}

/// SQL style pattern: `%` matches any run of characters, `_` exactly one.
pub(crate) fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while t < text.len() {
        match pattern.get(p) {
            Some('%') => {
                p += 1;
                backtrack = Some((p, t));
            }
            Some(c) if *c == '_' || *c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((bp, bt)) => {
                    p = bp;
                    t = bt + 1;
                    backtrack = Some((bp, bt + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|c| *c == '%')
}

/// Builds [`Filter`] predicates. Condition values go through the same converter as the
/// stored rows so that both sides are compared in their native form.
#[derive(Debug, Clone)]
pub struct FilterBuilder {
    name: &'static str,
    supported: OperatorSet,
    converter: Arc<Converter>,
}

impl FilterBuilder {
    pub fn new(name: &'static str, converter: Arc<Converter>) -> Self {
        Self {
            name,
            supported: OperatorSet::ALL,
            converter,
        }
    }

    /// Restricts the operators, for back ends that filter only a subset on the client.
    pub fn with_supported(mut self, supported: OperatorSet) -> Self {
        self.supported = supported;
        self
    }

    fn native_value(&self, value: &Value) -> Result<Value> {
        Ok(self.converter.to_native_value(value)?.into_opaque_value())
    }
}

impl PredicateBuilder for FilterBuilder {
    type Predicate = Filter;

    fn name(&self) -> &'static str {
        self.name
    }

    fn supported(&self) -> OperatorSet {
        self.supported
    }

    fn leaf(&self, operator: Operator, field: &Field) -> Result<Filter> {
        if operator.is_combinator() {
            return Err(Error::new(StoreError::InvalidConditionShape {
                operator,
                detail: "a combinator cannot be a leaf".into(),
            }));
        }
        Ok(Filter::Leaf {
            operator,
            name: field.name.to_string(),
            value: self.native_value(&field.value)?,
        })
    }

    fn and(&self, children: Vec<Filter>) -> Result<Filter> {
        Ok(Filter::And(children))
    }

    fn or(&self, children: Vec<Filter>) -> Result<Filter> {
        Ok(Filter::Or(children))
    }
}

/// Row keys to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLookup {
    pub keys: Vec<String>,
}

/// Translates conditions on the key field of row key stores: `Equals`, `In` and `And`.
///
/// `And` keeps the keys present in every child, in the order of the first one.
#[derive(Debug, Clone)]
pub struct KeyLookupBuilder {
    name: &'static str,
    key: String,
}

impl KeyLookupBuilder {
    pub fn new(name: &'static str, key: impl Into<String>) -> Self {
        Self {
            name,
            key: key.into(),
        }
    }

    fn key_text(&self, operator: Operator, value: &Value) -> Result<String> {
        value.to_text().ok_or_else(|| {
            Error::new(StoreError::InvalidConditionShape {
                operator,
                detail: format!("a {} cannot be used as a row key", value.kind()),
            })
        })
    }
}

impl PredicateBuilder for KeyLookupBuilder {
    type Predicate = KeyLookup;

    fn name(&self) -> &'static str {
        self.name
    }

    fn supported(&self) -> OperatorSet {
        OperatorSet::KEY_LOOKUP
    }

    fn leaf(&self, operator: Operator, field: &Field) -> Result<KeyLookup> {
        if field.name != self.key {
            return Err(Error::new(StoreError::InvalidConditionShape {
                operator,
                detail: format!(
                    "only the key field `{}` can be filtered, found `{}`",
                    self.key, field.name
                ),
            }));
        }
        let keys = match (operator, &field.value) {
            (Operator::Equals, value) => vec![self.key_text(operator, value)?],
            (Operator::In, Value::List(Some(values), ..)) => values
                .iter()
                .map(|v| self.key_text(operator, v))
                .collect::<Result<_>>()?,
            _ => {
                return Err(Error::new(StoreError::UnsupportedCondition {
                    backend: self.name.into(),
                    operator,
                }));
            }
        };
        Ok(KeyLookup { keys })
    }

    fn and(&self, children: Vec<KeyLookup>) -> Result<KeyLookup> {
        let mut children = children.into_iter();
        let Some(first) = children.next() else {
            return Ok(KeyLookup { keys: Vec::new() });
        };
        let rest: Vec<_> = children.collect();
        let keys = first
            .keys
            .into_iter()
            .filter(|k| rest.iter().all(|v| v.keys.contains(k)))
            .collect();
        Ok(KeyLookup { keys })
    }

    fn or(&self, _children: Vec<KeyLookup>) -> Result<KeyLookup> {
        Err(Error::new(StoreError::UnsupportedCondition {
            backend: self.name.into(),
            operator: Operator::Or,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::like;

    #[test]
    fn like_wildcards() {
        assert!(like("Ada Lovelace", "Ada%"));
        assert!(!like("Ada Lovelace", "%love%"));
        assert!(like("Ada Lovelace", "%Love%"));
        assert!(like("cat", "c_t"));
        assert!(!like("cart", "c_t"));
        assert!(like("", "%"));
        assert!(!like("", "_"));
        assert!(like("aaab", "%a%b"));
        assert!(like("abc", "abc"));
        assert!(!like("abcd", "abc"));
    }
}
