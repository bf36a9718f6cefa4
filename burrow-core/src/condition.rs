use crate::{Error, Field, Result, StoreError, Value};
use std::{
    borrow::Cow,
    fmt::{self, Display, Formatter},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    Equals,
    GreaterThan,
    GreaterEqualsThan,
    LesserThan,
    LesserEqualsThan,
    In,
    Like,
    And,
    Or,
}

impl Operator {
    pub const ALL: [Operator; 9] = [
        Operator::Equals,
        Operator::GreaterThan,
        Operator::GreaterEqualsThan,
        Operator::LesserThan,
        Operator::LesserEqualsThan,
        Operator::In,
        Operator::Like,
        Operator::And,
        Operator::Or,
    ];

    pub fn is_combinator(&self) -> bool {
        matches!(self, Operator::And | Operator::Or)
    }

    pub fn is_range(&self) -> bool {
        matches!(
            self,
            Operator::GreaterThan
                | Operator::GreaterEqualsThan
                | Operator::LesserThan
                | Operator::LesserEqualsThan
        )
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operator::Equals => "EQUALS",
            Operator::GreaterThan => "GREATER_THAN",
            Operator::GreaterEqualsThan => "GREATER_EQUALS_THAN",
            Operator::LesserThan => "LESSER_THAN",
            Operator::LesserEqualsThan => "LESSER_EQUALS_THAN",
            Operator::In => "IN",
            Operator::Like => "LIKE",
            Operator::And => "AND",
            Operator::Or => "OR",
        })
    }
}

/// Boolean predicate over the fields of an entity.
///
/// Leaves compare one field, `And`/`Or` combine children in the order they were given.
/// Nothing reorders or simplifies the tree.
///
/// ```rust
/// use burrow_core::{Condition, Operator};
/// let condition = Condition::eq("age", 30).and_also(Condition::like("name", "A%"));
/// let operators: Vec<_> = condition.operators().collect();
/// assert_eq!(operators, [Operator::And, Operator::Equals, Operator::Like]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Leaf { operator: Operator, field: Field },
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

macro_rules! leaf_constructor {
    ($name:ident, $operator:path) => {
        pub fn $name(name: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
            Condition::Leaf {
                operator: $operator,
                field: Field::new(name, value),
            }
        }
    };
}

impl Condition {
    leaf_constructor!(eq, Operator::Equals);
    leaf_constructor!(gt, Operator::GreaterThan);
    leaf_constructor!(gte, Operator::GreaterEqualsThan);
    leaf_constructor!(lt, Operator::LesserThan);
    leaf_constructor!(lte, Operator::LesserEqualsThan);
    leaf_constructor!(r#in, Operator::In);
    leaf_constructor!(like, Operator::Like);

    pub fn and(children: impl IntoIterator<Item = Condition>) -> Self {
        Condition::And(children.into_iter().collect())
    }

    pub fn or(children: impl IntoIterator<Item = Condition>) -> Self {
        Condition::Or(children.into_iter().collect())
    }

    /// `self AND other`, appending to `self` when it is already an `And`.
    pub fn and_also(self, other: Condition) -> Self {
        match self {
            Condition::And(mut children) => {
                children.push(other);
                Condition::And(children)
            }
            v => Condition::And(vec![v, other]),
        }
    }

    /// `self OR other`, appending to `self` when it is already an `Or`.
    pub fn or_else(self, other: Condition) -> Self {
        match self {
            Condition::Or(mut children) => {
                children.push(other);
                Condition::Or(children)
            }
            v => Condition::Or(vec![v, other]),
        }
    }

    pub fn operator(&self) -> Operator {
        match self {
            Condition::Leaf { operator, .. } => *operator,
            Condition::And(..) => Operator::And,
            Condition::Or(..) => Operator::Or,
        }
    }

    /// Every operator of the tree, depth first, parents before children.
    pub fn operators(&self) -> impl Iterator<Item = Operator> + '_ {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            if let Condition::And(children) | Condition::Or(children) = node {
                stack.extend(children.iter().rev());
            }
            Some(node.operator())
        })
    }

    /// Checks that every node has the shape its operator expects.
    pub fn validate(&self) -> Result<()> {
        match self {
            Condition::And(children) | Condition::Or(children) => {
                if children.is_empty() {
                    return Err(invalid_shape(
                        self.operator(),
                        "a combinator needs at least one child",
                    ));
                }
                children.iter().try_for_each(Condition::validate)
            }
            Condition::Leaf { operator, field } => {
                let value = &field.value;
                match operator {
                    Operator::In if !matches!(value, Value::List(Some(..), ..)) => Err(
                        invalid_shape(*operator, format!("`{}` must hold a list", field.name)),
                    ),
                    Operator::Like if !matches!(value, Value::Varchar(Some(..))) => {
                        Err(invalid_shape(
                            *operator,
                            format!("`{}` must hold a text pattern", field.name),
                        ))
                    }
                    v if v.is_range() && (value.is_null() || !value.is_scalar()) => {
                        Err(invalid_shape(
                            *operator,
                            format!("`{}` must hold a non null scalar", field.name),
                        ))
                    }
                    v if v.is_combinator() => Err(invalid_shape(
                        *operator,
                        "a combinator cannot be a leaf",
                    )),
                    _ => Ok(()),
                }
            }
        }
    }
}

fn invalid_shape(operator: Operator, detail: impl Into<String>) -> Error {
    Error::new(StoreError::InvalidConditionShape {
        operator,
        detail: detail.into(),
    })
}
