//! Per-key query state.

use std::time::Instant;

/// Lifecycle of a single query entry.
///
/// `Ready` and `Error` only go back to `Loading` when a refetch is
/// dispatched (interval tick or parameter change).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Never fetched, or the query is disabled.
    #[default]
    Idle,
    /// A fetch is in flight.
    Loading,
    /// Last fetch succeeded.
    Ready,
    /// Last fetch failed; previous data (if any) is kept.
    Error,
}

/// Cached result of a query for one set of parameters.
#[derive(Debug, Clone, Default)]
pub struct QueryState<T> {
    /// Last successfully fetched data, or the type's empty default.
    pub data: T,
    pub phase: Phase,
    /// Message of the most recent failure, cleared on success.
    pub error: Option<String>,
    /// When data was last replaced by a successful fetch.
    pub updated_at: Option<Instant>,
}

impl<T> QueryState<T> {
    /// True until the first successful fetch has landed.
    pub fn is_initial_load(&self) -> bool {
        self.updated_at.is_none() && self.phase == Phase::Loading
    }

    /// True once any fetch for this key has succeeded.
    pub fn has_data(&self) -> bool {
        self.updated_at.is_some()
    }

    pub fn is_error(&self) -> bool {
        self.phase == Phase::Error
    }
}
