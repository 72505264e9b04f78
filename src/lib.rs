//! # probewatch
//!
//! A terminal dashboard for a synthetic-check monitoring service.
//!
//! The service runs HTTP and TCP checks from several probes (agents) and
//! exposes fleet status, per-probe statistics and aggregated response-time
//! history over a JSON API. This crate polls that API and renders the
//! results in an interactive terminal UI; a few subcommands cover the admin
//! side (monitor CRUD and retention settings).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Application                         │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌──────────┐  │
//! │  │  app    │───▶│   data   │───▶│   ui    │───▶│ Terminal │  │
//! │  │ (state) │    │(transform)    │(render) │    │          │  │
//! │  └────┬────┘    └──────────┘    └─────────┘    └──────────┘  │
//! │       │                                                      │
//! │       ▼                                                      │
//! │  ┌─────────┐    ┌──────────┐                                 │
//! │  │  cache  │───▶│   api    │◀── ApiClient (reqwest)          │
//! │  │ (Query) │    │(MonitorApi)                                │
//! │  └─────────┘    └──────────┘                                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`api`]**: Wire types and the [`MonitorApi`] trait with its HTTP
//!   implementation [`ApiClient`]
//! - **[`cache`]**: Keyed polling queries ([`Query`]) that refetch on an
//!   interval and drop responses for keys that are no longer current
//! - **[`data`]**: Pure transforms: history grouping into chart series,
//!   filters, fleet and probe statistics, formatting and input validation
//! - **[`app`]**: View state, navigation and the queries each view reads
//! - **[`ui`]**: ratatui rendering for the Monitors, Detail and Admin views
//! - **[`config`]**: Layered configuration file and environment
//! - **[`cli`]**: Admin and export subcommands
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch the fleet
//! probewatch --api-url https://status.example.com/api
//!
//! # Export the fleet snapshot and exit
//! probewatch export fleet.json
//!
//! # Admin
//! probewatch monitors list --keyword shop
//! probewatch monitors create --name shop --type http --target https://shop.example.com
//! probewatch metrics-config set --retention-hours 168
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::sync::Arc;
//! use probewatch::{ApiClient, App, DashboardConfig, MonitorApi};
//!
//! # fn main() -> anyhow::Result<()> {
//! let runtime = tokio::runtime::Runtime::new()?;
//! let client = ApiClient::builder()
//!     .base_url("http://localhost:8080/api")
//!     .build()?;
//! let api: Arc<dyn MonitorApi> = Arc::new(client);
//!
//! let mut app = App::new(api, DashboardConfig::default(), runtime.handle().clone())?;
//! app.tick();
//! # Ok(())
//! # }
//! ```
//!
//! ### Fetching without the UI
//!
//! ```no_run
//! use probewatch::{ApiClient, MonitorApi, TimeRange};
//! use probewatch::data::{group_history, AgentSelection};
//!
//! # tokio_test::block_on(async {
//! let client = ApiClient::builder().base_url("http://localhost:8080/api").build().unwrap();
//! let history = client.monitor_history("shop", TimeRange::OneHour).await.unwrap();
//! let series = group_history(&history, &AgentSelection::All);
//! println!("{} points", series.len());
//! # });
//! ```

pub mod api;
pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod events;
pub mod ui;

// Re-export main types for convenience
pub use api::{ApiClient, ApiError, MonitorApi, PublicMonitor, TimeRange};
pub use app::{App, FleetSnapshot, View};
pub use cache::{Query, QueryState};
pub use config::DashboardConfig;
pub use data::{HealthStatus, Thresholds};
