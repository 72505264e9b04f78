//! Non-interactive subcommands.
//!
//! The TUI only reads; configured monitors and retention settings are
//! changed from here. Input is validated locally before any request is
//! sent, and results go to the given writer as text or pretty JSON.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use tracing::info;

use crate::api::{ListQuery, MetricsConfig, MonitorApi, MonitorTask, MonitorTaskRequest, MonitorType};
use crate::app::FleetSnapshot;
use crate::config::DashboardConfig;
use crate::data::format::format_datetime;
use crate::data::validate::{validate_metrics_config, validate_monitor_request};

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Write a JSON snapshot of the fleet and exit
    Export {
        /// Output file
        path: PathBuf,
    },

    /// List, inspect and change configured monitors
    #[command(subcommand)]
    Monitors(MonitorsCommand),

    /// Show or change metrics retention
    #[command(subcommand)]
    MetricsConfig(MetricsConfigCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum MonitorsCommand {
    /// List configured monitors one page at a time
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 10)]
        page_size: u32,

        /// Server-side name search
        #[arg(long)]
        keyword: Option<String>,
    },

    /// Print one monitor as JSON
    Get { id: String },

    /// Create a monitor
    Create(MonitorArgs),

    /// Update a monitor; flags not given keep their current value
    Update {
        id: String,

        #[command(flatten)]
        args: MonitorArgs,
    },

    /// Delete a monitor
    Delete { id: String },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum MetricsConfigCommand {
    /// Print the current retention settings
    Get,

    /// Change the retention settings
    Set {
        /// Hours of raw metrics to keep (24-720)
        #[arg(long)]
        retention_hours: Option<u32>,

        /// Maximum points returned per history query
        #[arg(long)]
        max_query_points: Option<u32>,
    },
}

/// Monitor fields shared by `create` and `update`.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct MonitorArgs {
    #[arg(long)]
    pub name: Option<String>,

    /// Check protocol: tcp or http
    #[arg(long = "type")]
    pub monitor_type: Option<MonitorType>,

    /// URL for http monitors, host:port for tcp monitors
    #[arg(long)]
    pub target: Option<String>,

    /// Check interval in seconds (0 uses the server default)
    #[arg(long)]
    pub interval: Option<u32>,

    #[arg(long)]
    pub description: Option<String>,

    /// Create or leave the monitor disabled
    #[arg(long, conflicts_with = "enabled")]
    pub disabled: bool,

    /// Re-enable a disabled monitor
    #[arg(long)]
    pub enabled: bool,

    /// Probe id to run from; repeat for several (default: all probes)
    #[arg(long = "agent")]
    pub agents: Vec<String>,
}

impl MonitorArgs {
    /// Overlay the given flags on `base`.
    ///
    /// New monitors start from an enabled request with no fields set.
    pub fn into_request(self, base: Option<&MonitorTask>) -> MonitorTaskRequest {
        let mut req = match base {
            Some(task) => MonitorTaskRequest {
                name: task.name.clone(),
                monitor_type: task.monitor_type,
                target: task.target.clone(),
                description: task.description.clone(),
                enabled: task.enabled,
                interval: task.interval,
                http_config: task.http_config.clone(),
                tcp_config: task.tcp_config.clone(),
                agent_ids: task.agent_ids.clone(),
            },
            None => MonitorTaskRequest {
                enabled: true,
                ..Default::default()
            },
        };

        if let Some(name) = self.name {
            req.name = name;
        }
        if let Some(monitor_type) = self.monitor_type {
            req.monitor_type = monitor_type;
        }
        if let Some(target) = self.target {
            req.target = target;
        }
        if let Some(interval) = self.interval {
            req.interval = interval;
        }
        if let Some(description) = self.description {
            req.description = description;
        }
        if self.disabled {
            req.enabled = false;
        } else if self.enabled {
            req.enabled = true;
        }
        if !self.agents.is_empty() {
            req.agent_ids = self.agents;
        }
        req
    }
}

/// Run a subcommand to completion.
pub async fn run(
    command: Command,
    api: &dyn MonitorApi,
    config: &DashboardConfig,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::Export { path } => {
            let monitors = api
                .public_monitors()
                .await
                .context("Failed to fetch monitors")?;
            let snapshot = FleetSnapshot::new(&config.dashboard.system_name, api.base_url(), monitors);
            snapshot.write_to(&path)?;
            info!(path = %path.display(), monitors = snapshot.monitors.len(), "Exported fleet");
            writeln!(
                out,
                "Exported {} monitors to {}",
                snapshot.monitors.len(),
                path.display()
            )?;
        }
        Command::Monitors(cmd) => run_monitors(cmd, api, out).await?,
        Command::MetricsConfig(cmd) => run_metrics_config(cmd, api, out).await?,
    }
    Ok(())
}

async fn run_monitors(cmd: MonitorsCommand, api: &dyn MonitorApi, out: &mut impl Write) -> Result<()> {
    match cmd {
        MonitorsCommand::List {
            page,
            page_size,
            keyword,
        } => {
            if page == 0 || page_size == 0 {
                return Err(anyhow!("--page and --page-size must be at least 1"));
            }
            let query = ListQuery {
                page,
                page_size,
                keyword: keyword.filter(|k| !k.trim().is_empty()),
            };
            let result = api
                .list_monitors(&query)
                .await
                .context("Failed to list monitors")?;

            writeln!(
                out,
                "{:<24} {:<5} {:<40} {:>8} {:<7} UPDATED",
                "NAME", "TYPE", "TARGET", "INTERVAL", "ENABLED"
            )?;
            for task in &result.items {
                writeln!(
                    out,
                    "{:<24} {:<5} {:<40} {:>8} {:<7} {}",
                    task.name,
                    task.monitor_type.as_str(),
                    task.target,
                    task.interval,
                    if task.enabled { "yes" } else { "no" },
                    format_datetime(task.updated_at)
                )?;
            }
            writeln!(
                out,
                "page {}/{} ({} total)",
                query.page,
                query.page_count(result.total),
                result.total
            )?;
        }
        MonitorsCommand::Get { id } => {
            let task = api
                .get_monitor(&id)
                .await
                .with_context(|| format!("Failed to fetch monitor {id}"))?;
            print_json(out, &task)?;
        }
        MonitorsCommand::Create(args) => {
            let req = checked(args.into_request(None))?;
            let task = api
                .create_monitor(&req)
                .await
                .context("Failed to create monitor")?;
            info!(id = %task.id, name = %task.name, "Created monitor");
            print_json(out, &task)?;
        }
        MonitorsCommand::Update { id, args } => {
            let current = api
                .get_monitor(&id)
                .await
                .with_context(|| format!("Failed to fetch monitor {id}"))?;
            let req = checked(args.into_request(Some(&current)))?;
            let task = api
                .update_monitor(&id, &req)
                .await
                .with_context(|| format!("Failed to update monitor {id}"))?;
            info!(id = %task.id, name = %task.name, "Updated monitor");
            print_json(out, &task)?;
        }
        MonitorsCommand::Delete { id } => {
            api.delete_monitor(&id)
                .await
                .with_context(|| format!("Failed to delete monitor {id}"))?;
            info!(id = %id, "Deleted monitor");
            writeln!(out, "Deleted monitor {id}")?;
        }
    }
    Ok(())
}

async fn run_metrics_config(
    cmd: MetricsConfigCommand,
    api: &dyn MonitorApi,
    out: &mut impl Write,
) -> Result<()> {
    match cmd {
        MetricsConfigCommand::Get => {
            let cfg = api
                .metrics_config()
                .await
                .context("Failed to fetch metrics config")?;
            print_metrics_config(out, &cfg)?;
        }
        MetricsConfigCommand::Set {
            retention_hours,
            max_query_points,
        } => {
            if retention_hours.is_none() && max_query_points.is_none() {
                return Err(anyhow!(
                    "Nothing to change: pass --retention-hours and/or --max-query-points"
                ));
            }
            let mut cfg = api
                .metrics_config()
                .await
                .context("Failed to fetch metrics config")?;
            if let Some(hours) = retention_hours {
                cfg.retention_hours = hours;
            }
            if let Some(points) = max_query_points {
                cfg.max_query_points = points;
            }
            validate_metrics_config(&cfg).map_err(|e| anyhow!("Invalid metrics config: {e}"))?;

            api.save_metrics_config(&cfg)
                .await
                .context("Failed to save metrics config")?;
            info!(
                retention_hours = cfg.retention_hours,
                max_query_points = cfg.max_query_points,
                "Saved metrics config"
            );
            print_metrics_config(out, &cfg)?;
        }
    }
    Ok(())
}

fn checked(req: MonitorTaskRequest) -> Result<MonitorTaskRequest> {
    validate_monitor_request(&req).map_err(|e| anyhow!("Invalid monitor: {e}"))
}

fn print_json<T: Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}

fn print_metrics_config(out: &mut impl Write, cfg: &MetricsConfig) -> Result<()> {
    writeln!(
        out,
        "retention: {} h ({:.1} days)",
        cfg.retention_hours,
        cfg.retention_days()
    )?;
    writeln!(out, "max query points: {}", cfg.max_query_points)?;
    Ok(())
}
