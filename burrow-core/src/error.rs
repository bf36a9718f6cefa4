use crate::{Operator, ValueKind};
use std::borrow::Cow;
use thiserror::Error;

/// Kinds of failure raised by the core.
///
/// Every fallible operation returns [`crate::Result`] (an `anyhow` result). Errors detected
/// locally are created from a `StoreError`, native failures carry
/// [`StoreError::Execution`] as context on top of the native cause. In both cases
/// `error.downcast_ref::<StoreError>()` identifies the kind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The value has no native representation under the requested policy.
    #[error("cannot convert a value of kind {kind} ({detail})")]
    Conversion { kind: ValueKind, detail: String },

    /// The operator does not accept the shape of the value (or the tree is malformed).
    #[error("invalid condition shape for {operator}: {detail}")]
    InvalidConditionShape { operator: Operator, detail: String },

    /// The back end cannot express the operator. Raised before any native call.
    #[error("the back end `{backend}` does not support the condition {operator}")]
    UnsupportedCondition {
        backend: Cow<'static, str>,
        operator: Operator,
    },

    /// An update or a delete needs an identity field missing from the entity.
    #[error("the entity of `{collection}` has no identity field `{field}`")]
    MissingIdentityField { collection: String, field: String },

    /// A persisted entity or a query without a collection name.
    #[error("the collection name is required")]
    MissingCollection,

    /// Wraps a failure of the native client (network, timeout, server rejection).
    #[error("execution failed on `{backend}`: {detail}")]
    Execution {
        backend: Cow<'static, str>,
        detail: String,
    },

    /// The back end does not offer the operation.
    #[error("the back end `{backend}` does not support {feature}")]
    UnsupportedFeature {
        backend: Cow<'static, str>,
        feature: &'static str,
    },

    /// Malformed connection url or parameter.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl StoreError {
    pub fn execution(backend: impl Into<Cow<'static, str>>, detail: impl Into<String>) -> Self {
        StoreError::Execution {
            backend: backend.into(),
            detail: detail.into(),
        }
    }

    pub fn kind_of(error: &anyhow::Error) -> Option<&StoreError> {
        error.downcast_ref::<StoreError>()
    }
}
