use crate::{Condition, Error, Field, Operator, Result, StoreError};
use std::fmt::{self, Debug, Formatter};

/// Set of operators a back end can express natively.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperatorSet(u16);

impl OperatorSet {
    pub const EMPTY: OperatorSet = OperatorSet(0);
    pub const ALL: OperatorSet = OperatorSet((1 << Operator::ALL.len()) - 1);
    /// Row key stores: exact keys only.
    pub const KEY_LOOKUP: OperatorSet = OperatorSet::EMPTY
        .with(Operator::Equals)
        .with(Operator::In)
        .with(Operator::And);

    const fn bit(operator: Operator) -> u16 {
        1 << operator as u16
    }
    pub const fn with(self, operator: Operator) -> Self {
        OperatorSet(self.0 | Self::bit(operator))
    }
    pub const fn without(self, operator: Operator) -> Self {
        OperatorSet(self.0 & !Self::bit(operator))
    }
    pub const fn contains(&self, operator: Operator) -> bool {
        self.0 & Self::bit(operator) != 0
    }
    pub fn iter(&self) -> impl Iterator<Item = Operator> + '_ {
        Operator::ALL.into_iter().filter(|v| self.contains(*v))
    }
}

impl FromIterator<Operator> for OperatorSet {
    fn from_iter<T: IntoIterator<Item = Operator>>(iter: T) -> Self {
        iter.into_iter().fold(OperatorSet::EMPTY, OperatorSet::with)
    }
}

impl Debug for OperatorSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Translates condition trees into the native predicate of a back end.
///
/// Implementations only translate one node at a time, [`build_predicate`] drives the
/// recursion and rejects what [`PredicateBuilder::supported`] does not list.
pub trait PredicateBuilder: Send + Sync {
    type Predicate: Clone + Send + Sync + Debug;

    /// Back end name used in error messages.
    fn name(&self) -> &'static str;

    fn supported(&self) -> OperatorSet;

    fn leaf(&self, operator: Operator, field: &Field) -> Result<Self::Predicate>;

    fn and(&self, children: Vec<Self::Predicate>) -> Result<Self::Predicate>;

    fn or(&self, children: Vec<Self::Predicate>) -> Result<Self::Predicate>;
}

/// Validates the shape of `condition`, checks every operator against the capabilities of
/// the builder, then translates depth first keeping the children in order.
///
/// Nothing is translated if any check fails.
pub fn build_predicate<B: PredicateBuilder + ?Sized>(
    builder: &B,
    condition: &Condition,
) -> Result<B::Predicate> {
    condition.validate()?;
    let supported = builder.supported();
    if let Some(operator) = condition.operators().find(|v| !supported.contains(*v)) {
        let error = Error::new(StoreError::UnsupportedCondition {
            backend: builder.name().into(),
            operator,
        });
        log::debug!("{:#}", error);
        return Err(error);
    }
    translate(builder, condition)
}

fn translate<B: PredicateBuilder + ?Sized>(
    builder: &B,
    condition: &Condition,
) -> Result<B::Predicate> {
    match condition {
        Condition::Leaf { operator, field } => builder.leaf(*operator, field),
        Condition::And(children) => builder.and(
            children
                .iter()
                .map(|v| translate(builder, v))
                .collect::<Result<_>>()?,
        ),
        Condition::Or(children) => builder.or(
            children
                .iter()
                .map(|v| translate(builder, v))
                .collect::<Result<_>>()?,
        ),
    }
}
