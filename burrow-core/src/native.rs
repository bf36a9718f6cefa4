use crate::Value;
use indexmap::IndexMap;

/// Insertion ordered map, the write and read shape of document back ends.
pub type NativeMap = IndexMap<String, Native>;

/// Nested map/list structure a back end client reads and writes.
#[derive(Debug, Clone, PartialEq)]
pub enum Native {
    Scalar(Value),
    Map(NativeMap),
    List(Vec<Native>),
}

impl Native {
    pub fn is_map(&self) -> bool {
        matches!(self, Native::Map(..))
    }

    pub fn as_map(&self) -> Option<&NativeMap> {
        match self {
            Native::Map(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Native::Scalar(v) => Some(v),
            _ => None,
        }
    }

    /// A non empty list made only of maps.
    pub fn is_document_list(&self) -> bool {
        match self {
            Native::List(v) => !v.is_empty() && v.iter().all(Native::is_map),
            _ => false,
        }
    }

    /// Converts without expanding maps into fields.
    pub fn into_opaque_value(self) -> Value {
        match self {
            Native::Scalar(v) => v,
            Native::Map(v) => Value::Map(Some(
                v.into_iter()
                    .map(|(k, v)| (k, v.into_opaque_value()))
                    .collect::<IndexMap<_, _>>(),
            )),
            Native::List(v) => Value::List(
                Some(v.into_iter().map(Native::into_opaque_value).collect()),
                Box::new(Value::Null),
            ),
        }
    }
}

impl From<Value> for Native {
    fn from(value: Value) -> Self {
        Native::Scalar(value)
    }
}

impl From<NativeMap> for Native {
    fn from(value: NativeMap) -> Self {
        Native::Map(value)
    }
}
