use crate::{MemoryConfig, MemoryMode};
use burrow_core::{
    Converter, Error, Field, Filter, FilterBuilder, KeyLookup, KeyLookupBuilder, Native,
    NativeMap, Operator, OperatorSet, Order, PagingState, PredicateBuilder, Result, ResultSet,
    Session, Sort, Statement, StoreError, Value, compare_values,
};
use std::{
    borrow::Cow,
    cmp::Ordering,
    collections::{HashMap, HashSet, VecDeque},
    sync::{
        Arc,
        atomic::{self, AtomicBool},
    },
};
use tokio::{sync::RwLock, time::Instant};

/// One stored entity.
#[derive(Debug, Clone)]
pub struct StoredRow {
    /// Key rendered as text, unique in the collection.
    pub key: String,
    /// Key as the caller wrote it, returned on reads.
    pub key_value: Value,
    pub body: NativeMap,
    pub revision: u64,
    pub expires_at: Option<Instant>,
}

impl StoredRow {
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|v| v <= now)
    }
}

pub type Collections = HashMap<String, Vec<StoredRow>>;

/// Predicate of either mode.
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryPredicate {
    Filter(Filter),
    Keys(KeyLookup),
}

/// Filters on the client in document mode, looks rows up by key in keyed mode.
#[derive(Debug, Clone)]
pub enum MemoryBuilder {
    Document(FilterBuilder),
    Keyed(KeyLookupBuilder),
}

impl MemoryBuilder {
    pub fn new(config: &MemoryConfig, converter: Arc<Converter>) -> Self {
        match config.mode {
            MemoryMode::Document => {
                MemoryBuilder::Document(FilterBuilder::new("memory", converter))
            }
            MemoryMode::Keyed => {
                MemoryBuilder::Keyed(KeyLookupBuilder::new("memory", config.key.clone()))
            }
        }
    }
}

fn filters(operator: Operator, children: Vec<MemoryPredicate>) -> Result<Vec<Filter>> {
    children
        .into_iter()
        .map(|v| match v {
            MemoryPredicate::Filter(v) => Ok(v),
            MemoryPredicate::Keys(..) => Err(Error::new(StoreError::InvalidConditionShape {
                operator,
                detail: "cannot mix key lookups and filters".into(),
            })),
        })
        .collect()
}

fn lookups(operator: Operator, children: Vec<MemoryPredicate>) -> Result<Vec<KeyLookup>> {
    children
        .into_iter()
        .map(|v| match v {
            MemoryPredicate::Keys(v) => Ok(v),
            MemoryPredicate::Filter(..) => Err(Error::new(StoreError::InvalidConditionShape {
                operator,
                detail: "cannot mix filters and key lookups".into(),
            })),
        })
        .collect()
}

impl PredicateBuilder for MemoryBuilder {
    type Predicate = MemoryPredicate;

    fn name(&self) -> &'static str {
        match self {
            MemoryBuilder::Document(v) => v.name(),
            MemoryBuilder::Keyed(v) => v.name(),
        }
    }

    fn supported(&self) -> OperatorSet {
        match self {
            MemoryBuilder::Document(v) => v.supported(),
            MemoryBuilder::Keyed(v) => v.supported(),
        }
    }

    fn leaf(&self, operator: Operator, field: &Field) -> Result<MemoryPredicate> {
        Ok(match self {
            MemoryBuilder::Document(v) => MemoryPredicate::Filter(v.leaf(operator, field)?),
            MemoryBuilder::Keyed(v) => MemoryPredicate::Keys(v.leaf(operator, field)?),
        })
    }

    fn and(&self, children: Vec<MemoryPredicate>) -> Result<MemoryPredicate> {
        Ok(match self {
            MemoryBuilder::Document(v) => {
                MemoryPredicate::Filter(v.and(filters(Operator::And, children)?)?)
            }
            MemoryBuilder::Keyed(v) => {
                MemoryPredicate::Keys(v.and(lookups(Operator::And, children)?)?)
            }
        })
    }

    fn or(&self, children: Vec<MemoryPredicate>) -> Result<MemoryPredicate> {
        Ok(match self {
            MemoryBuilder::Document(v) => {
                MemoryPredicate::Filter(v.or(filters(Operator::Or, children)?)?)
            }
            MemoryBuilder::Keyed(v) => {
                MemoryPredicate::Keys(v.or(lookups(Operator::Or, children)?)?)
            }
        })
    }
}

/// Buffered page of rows.
#[derive(Debug)]
pub struct MemoryRows {
    rows: VecDeque<NativeMap>,
    paging_state: Option<PagingState>,
}

impl ResultSet for MemoryRows {
    fn next_row(&mut self) -> Option<NativeMap> {
        self.rows.pop_front()
    }
    fn available_without_fetching(&self) -> usize {
        self.rows.len()
    }
    fn is_exhausted(&self) -> bool {
        self.paging_state.is_none()
    }
    fn paging_state(&self) -> Option<PagingState> {
        self.paging_state.clone()
    }
}

/// Offset of the next row, big endian.
fn encode_offset(offset: usize) -> PagingState {
    PagingState::from_bytes((offset as u64).to_be_bytes())
}

fn decode_offset(paging_state: &PagingState) -> Result<usize> {
    let bytes: [u8; 8] = paging_state.as_bytes().try_into().map_err(|_| {
        Error::msg(format!(
            "Malformed paging state {:?}, expected 8 bytes",
            paging_state
        ))
    })?;
    Ok(u64::from_be_bytes(bytes) as usize)
}

/// Value of `name` in a row, a missing field sorts first.
fn sort_key(row: &NativeMap, name: &str) -> Option<Value> {
    row.get(name).cloned().map(Native::into_opaque_value)
}

fn compare_rows(a: &NativeMap, b: &NativeMap, sorts: &[Sort]) -> Ordering {
    for sort in sorts {
        let ordering = match (sort_key(a, &sort.name), sort_key(b, &sort.name)) {
            (None, None) => Ordering::Equal,
            (None, Some(..)) => Ordering::Less,
            (Some(..), None) => Ordering::Greater,
            (Some(a), Some(b)) => match (a.is_null(), b.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => compare_values(&a, &b).unwrap_or(Ordering::Equal),
            },
        };
        let ordering = match sort.order {
            Order::Asc => ordering,
            Order::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Native client of the in memory store.
pub struct MemorySession {
    config: MemoryConfig,
    builder: MemoryBuilder,
    store: RwLock<Collections>,
    closed: AtomicBool,
}

impl MemorySession {
    pub fn new(config: MemoryConfig, converter: Arc<Converter>) -> Self {
        Self {
            builder: MemoryBuilder::new(&config, converter),
            config,
            store: Default::default(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    pub fn store(&self) -> &RwLock<Collections> {
        &self.store
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(atomic::Ordering::Acquire)
    }

    pub fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::msg(format!(
                "The memory store `{}` is closed",
                self.config.name
            )));
        }
        Ok(())
    }

    /// The stored body with the identity fields appended.
    pub fn row_view(&self, row: &StoredRow) -> NativeMap {
        let mut result = row.body.clone();
        result.insert(self.config.key.clone(), Native::Scalar(row.key_value.clone()));
        result.insert(
            self.config.revision.clone(),
            Native::Scalar(Value::UInt64(Some(row.revision))),
        );
        result
    }

    /// Positions of the live rows matching `predicate`, keyed lookups in the order of the
    /// requested keys.
    pub fn matching(
        &self,
        rows: &[StoredRow],
        predicate: Option<&MemoryPredicate>,
        now: Instant,
    ) -> Vec<usize> {
        let live = |i: &usize| !rows[*i].is_expired(now);
        match predicate {
            None => (0..rows.len()).filter(live).collect(),
            Some(MemoryPredicate::Filter(filter)) => (0..rows.len())
                .filter(live)
                .filter(|i| filter.matches(&self.row_view(&rows[*i])))
                .collect(),
            Some(MemoryPredicate::Keys(lookup)) => {
                let mut seen = HashSet::new();
                lookup
                    .keys
                    .iter()
                    .filter(|k| seen.insert(k.as_str()))
                    .filter_map(|k| rows.iter().position(|v| v.key == *k))
                    .filter(live)
                    .collect()
            }
        }
    }

    fn project(&self, mut row: NativeMap, projection: &[Cow<'static, str>]) -> NativeMap {
        if projection.is_empty() {
            return row;
        }
        row.retain(|name, _| {
            *name == self.config.key
                || *name == self.config.revision
                || projection.iter().any(|v| v == name)
        });
        row
    }

    pub fn mark_closed(&self) {
        self.closed.store(true, atomic::Ordering::Release);
    }
}

impl Session for MemorySession {
    type Builder = MemoryBuilder;
    type Rows = MemoryRows;

    fn builder(&self) -> &MemoryBuilder {
        &self.builder
    }

    async fn execute(&self, statement: Statement<MemoryPredicate>) -> Result<MemoryRows> {
        self.ensure_open()?;
        let offset = statement
            .paging_state
            .as_ref()
            .map(decode_offset)
            .transpose()?
            .unwrap_or_default();
        let fetch_size = statement.fetch_size.unwrap_or(self.config.fetch_size).max(1) as usize;
        let now = Instant::now();
        let mut rows: Vec<NativeMap> = {
            let store = self.store.read().await;
            match store.get(&*statement.collection) {
                Some(stored) => self
                    .matching(stored, statement.predicate.as_ref(), now)
                    .into_iter()
                    .map(|i| self.row_view(&stored[i]))
                    .collect(),
                None => Vec::new(),
            }
        };
        if !statement.sorts.is_empty() {
            rows.sort_by(|a, b| compare_rows(a, b, &statement.sorts));
        }
        let skip = statement.skip.unwrap_or_default() as usize;
        let limit = statement.limit.map_or(usize::MAX, |v| v as usize);
        let rows: Vec<_> = rows.into_iter().skip(skip).take(limit).collect();
        let end = offset.saturating_add(fetch_size).min(rows.len());
        let paging_state = (end < rows.len()).then(|| encode_offset(end));
        log::trace!(
            "Read {} rows from `{}` starting at {}",
            end.saturating_sub(offset),
            statement.collection,
            offset
        );
        Ok(MemoryRows {
            rows: rows
                .into_iter()
                .skip(offset)
                .take(end.saturating_sub(offset))
                .map(|v| self.project(v, &statement.projection))
                .collect(),
            paging_state,
        })
    }

    async fn close(&self) -> Result<()> {
        self.mark_closed();
        Ok(())
    }
}
