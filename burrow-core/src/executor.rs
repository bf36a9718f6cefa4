use crate::{
    Converter, Cursor, DeleteQuery, Entity, Error, Page, PredicateBuilder, Query, Result,
    ResultSet, Session, Statement, StoreError, build_predicate,
};
use std::{str::FromStr, sync::Arc};
use tokio::task::JoinHandle;

pub type PredicateOf<S> = <<S as Session>::Builder as PredicateBuilder>::Predicate;

/// How a select drains the native result.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingMode {
    /// One page per call, stopping at the fetch size boundary. The cursor of the page
    /// resumes the read.
    #[default]
    PagingState,
    /// Every page in one call, the returned cursor is exhausted.
    Default,
}

impl FromStr for PagingMode {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "paging-state" => Ok(PagingMode::PagingState),
            "default" => Ok(PagingMode::Default),
            _ => Err(Error::new(StoreError::InvalidConfiguration(format!(
                "unknown paging mode `{s}`, expected `paging-state` or `default`"
            )))),
        }
    }
}

/// Runs queries against a [`Session`].
///
/// Holds no per query state: the position of a read is the [`Cursor`] passed in and
/// returned with the [`Page`], so one executor serves any number of concurrent reads.
pub struct Executor<S: Session> {
    session: Arc<S>,
    converter: Arc<Converter>,
    mode: PagingMode,
}

impl<S: Session> Clone for Executor<S> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            converter: self.converter.clone(),
            mode: self.mode,
        }
    }
}

impl<S: Session> Executor<S> {
    pub fn new(session: Arc<S>, converter: Arc<Converter>) -> Self {
        Self {
            session,
            converter,
            mode: PagingMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: PagingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn converter(&self) -> &Arc<Converter> {
        &self.converter
    }

    pub fn mode(&self) -> PagingMode {
        self.mode
    }

    fn predicate(&self, query: &Query) -> Result<Option<PredicateOf<S>>> {
        query
            .condition
            .as_ref()
            .map(|v| build_predicate(self.session.builder(), v))
            .transpose()
    }

    /// Translated condition of a delete, checked like a select.
    pub fn delete_predicate(&self, query: &DeleteQuery) -> Result<Option<PredicateOf<S>>> {
        query.require_collection()?;
        query
            .condition
            .as_ref()
            .map(|v| build_predicate(self.session.builder(), v))
            .transpose()
    }

    /// Reads the page following `cursor`.
    ///
    /// An exhausted cursor yields an empty page without reaching the session. On error the
    /// caller still holds its cursor and can retry the same call.
    pub async fn select(&self, query: &Query, cursor: &Cursor) -> Result<Page> {
        if cursor.is_exhausted() {
            return Ok(Page::empty(cursor.clone()));
        }
        query.require_collection()?;
        let predicate = self.predicate(query)?;
        match self.mode {
            PagingMode::PagingState => {
                let statement = Statement::from_query(query, predicate)
                    .with_paging_state(cursor.paging_state().cloned());
                let mut rows = self.execute(statement).await?;
                let mut entities = Vec::new();
                let cursor = self.drain_page(query, &mut rows, &mut entities);
                Ok(Page { entities, cursor })
            }
            PagingMode::Default => {
                let mut entities = Vec::new();
                let mut paging_state = cursor.paging_state().cloned();
                loop {
                    let statement = Statement::from_query(query, predicate.clone())
                        .with_paging_state(paging_state.take());
                    let mut rows = self.execute(statement).await?;
                    let cursor = self.drain_page(query, &mut rows, &mut entities);
                    if cursor.is_exhausted() {
                        return Ok(Page { entities, cursor });
                    }
                    paging_state = cursor.paging_state().cloned();
                }
            }
        }
    }

    async fn execute(&self, statement: Statement<PredicateOf<S>>) -> Result<S::Rows> {
        let collection = statement.collection.clone();
        self.session.execute(statement).await.map_err(|e| {
            let detail = format!("{:#}", e);
            let e = e
                .context(StoreError::execution(
                    self.session.builder().name(),
                    detail,
                ))
                .context(format!("While reading from `{}`", collection));
            log::error!("{:#}", e);
            e
        })
    }

    /// Converts the buffered rows, stopping at the fetch size boundary.
    fn drain_page(&self, query: &Query, rows: &mut S::Rows, entities: &mut Vec<Entity>) -> Cursor {
        let paging_state = rows.paging_state();
        while let Some(row) = rows.next_row() {
            entities.push(self.converter.from_native(row, query.collection.clone()));
            if rows.available_without_fetching() == 0 {
                break;
            }
        }
        let exhausted = rows.is_exhausted();
        if exhausted {
            return Cursor::exhausted();
        }
        if paging_state.is_none() {
            log::warn!(
                "The result of `{}` has more rows but no paging state, the read stops here",
                query.collection
            );
            return Cursor::exhausted();
        }
        Cursor::resume(paging_state, false)
    }

    /// Every page, in order.
    pub async fn select_all(&self, query: &Query) -> Result<Vec<Entity>> {
        let mut result = Vec::new();
        let mut cursor = Cursor::new();
        while !cursor.is_exhausted() {
            let page = self.select(query, &cursor).await?;
            result.extend(page.entities);
            cursor = page.cursor;
        }
        Ok(result)
    }

    /// Reads the page on a tokio task and hands the result to `callback`.
    pub fn select_async<F>(&self, query: Query, cursor: Cursor, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<Page>) + Send + 'static,
    {
        let executor = self.clone();
        tokio::spawn(async move {
            let result = executor.select(&query, &cursor).await;
            callback(result);
        })
    }
}
