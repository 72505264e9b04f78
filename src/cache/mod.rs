//! Polling cache for API reads.
//!
//! Each dashboard read (fleet status, per-probe stats, history, admin
//! lists) is wrapped in a [`Query`] keyed by its parameters. Queries
//! refetch on a fixed interval, keep the last good data on failure, and
//! ignore responses for parameters that are no longer current.
//!
//! ```text
//!  App::tick()
//!      │
//!      ▼
//!  Query::tick() ──dispatch──▶ tokio task ──▶ MonitorApi
//!      ▲                                         │
//!      └──────── mpsc (key, Result<T>) ◀─────────┘
//! ```

mod query;
mod state;

pub use query::{FetchFuture, Fetcher, Query, DEFAULT_REFETCH_INTERVAL, MAX_CACHED_KEYS};
pub use state::{Phase, QueryState};
