use crate::{Consistency, NativeMap, PagingState, PredicateBuilder, Query, Result, Sort};
use std::{borrow::Cow, future::Future};

/// Native request handed to a [`Session`]: the query with its condition already translated.
#[derive(Debug, Clone)]
pub struct Statement<P> {
    pub collection: Cow<'static, str>,
    pub predicate: Option<P>,
    pub sorts: Vec<Sort>,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
    pub projection: Vec<Cow<'static, str>>,
    pub consistency: Option<Consistency>,
    pub fetch_size: Option<u32>,
    pub paging_state: Option<PagingState>,
}

impl<P> Statement<P> {
    pub fn from_query(query: &Query, predicate: Option<P>) -> Self {
        Self {
            collection: query.collection.clone(),
            predicate,
            sorts: query.sorts.clone(),
            limit: query.limit,
            skip: query.skip,
            projection: query.projection.clone(),
            consistency: query.consistency,
            fetch_size: query.fetch_size,
            paging_state: None,
        }
    }

    pub fn with_paging_state(mut self, paging_state: Option<PagingState>) -> Self {
        self.paging_state = paging_state;
        self
    }
}

/// Rows returned by one native execution.
pub trait ResultSet: Send {
    /// Next buffered row, `None` once the buffer is drained.
    fn next_row(&mut self) -> Option<NativeMap>;

    /// Rows still buffered, readable without another round trip.
    fn available_without_fetching(&self) -> usize;

    /// True when the server holds no rows beyond the buffer.
    fn is_exhausted(&self) -> bool;

    /// Token resuming right after the buffered rows.
    fn paging_state(&self) -> Option<PagingState>;
}

/// Native client of a back end.
pub trait Session: Send + Sync + 'static {
    type Builder: PredicateBuilder;
    type Rows: ResultSet;

    fn builder(&self) -> &Self::Builder;

    fn execute(
        &self,
        statement: Statement<<Self::Builder as PredicateBuilder>::Predicate>,
    ) -> impl Future<Output = Result<Self::Rows>> + Send;

    fn close(&self) -> impl Future<Output = Result<()>> + Send;
}
