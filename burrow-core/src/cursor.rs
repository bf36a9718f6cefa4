use crate::Entity;
use std::{
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

/// Opaque position token handed out by a paging back end.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PagingState(Arc<[u8]>);

impl PagingState {
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Self {
        Self(bytes.as_ref().into())
    }
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Debug for PagingState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "PagingState({})", hex::encode(&self.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Nothing fetched yet.
    Fresh,
    /// A token is present and more pages may follow.
    InProgress,
    /// Terminal.
    Exhausted,
}

/// Position of a paged read.
///
/// Start with [`Cursor::new`], then pass the cursor of every [`Page`] into the next call.
/// Once exhausted, further reads return empty pages without reaching the back end.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    paging_state: Option<PagingState>,
    exhausted: bool,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn exhausted() -> Self {
        Self {
            paging_state: None,
            exhausted: true,
        }
    }
    pub fn resume(paging_state: Option<PagingState>, exhausted: bool) -> Self {
        Self {
            paging_state,
            exhausted,
        }
    }
    pub fn state(&self) -> CursorState {
        match (self.exhausted, &self.paging_state) {
            (true, _) => CursorState::Exhausted,
            (false, None) => CursorState::Fresh,
            (false, Some(..)) => CursorState::InProgress,
        }
    }
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
    pub fn paging_state(&self) -> Option<&PagingState> {
        self.paging_state.as_ref()
    }
}

/// Entities of one page and the cursor to continue from.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Page {
    pub entities: Vec<Entity>,
    pub cursor: Cursor,
}

impl Page {
    pub fn empty(cursor: Cursor) -> Self {
        Self {
            entities: Vec::new(),
            cursor,
        }
    }
    pub fn len(&self) -> usize {
        self.entities.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl IntoIterator for Page {
    type Item = Entity;
    type IntoIter = std::vec::IntoIter<Entity>;
    fn into_iter(self) -> Self::IntoIter {
        self.entities.into_iter()
    }
}
