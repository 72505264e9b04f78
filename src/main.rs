use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;

use probewatch::cli::{self, Command};
use probewatch::ui::{self, Theme};
use probewatch::{events, ApiClient, App, DashboardConfig, MonitorApi};

#[derive(Parser, Debug)]
#[command(name = "probewatch", version)]
#[command(about = "Terminal dashboard for synthetic-check monitors")]
struct Args {
    /// Configuration file (default: ./probewatch.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the monitoring API (e.g. http://host:8080/api)
    #[arg(long)]
    api_url: Option<String>,

    /// Bearer token sent with every request
    #[arg(long)]
    token: Option<String>,

    /// Refetch interval (e.g. "30s", "1m")
    #[arg(short, long)]
    refresh: Option<String>,

    /// Write logs to this file. The TUI logs nowhere without it.
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.command.is_some(), args.log_file.as_deref())?;

    let mut config = DashboardConfig::load(args.config.as_deref())?;
    config.apply_overrides(args.api_url, args.token, args.refresh)?;

    let mut builder = ApiClient::builder().base_url(config.api.url.clone());
    if let Some(token) = &config.api.token {
        builder = builder.token(token.clone());
    }
    let api: Arc<dyn MonitorApi> =
        Arc::new(builder.build().context("Failed to create API client")?);

    let runtime = Runtime::new().context("Failed to start async runtime")?;

    // Handle subcommands (non-interactive)
    if let Some(command) = args.command {
        let mut stdout = io::stdout().lock();
        return runtime.block_on(cli::run(command, api.as_ref(), &config, &mut stdout));
    }

    run_tui(api, config, &runtime)
}

/// Subcommands log to stderr; the TUI only logs when given a file.
fn init_logging(command: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if command {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
    Ok(())
}

/// Run the TUI against the given API
fn run_tui(api: Arc<dyn MonitorApi>, config: DashboardConfig, runtime: &Runtime) -> Result<()> {
    let mut app = App::new(api, config, runtime.handle().clone())?;
    // Query the terminal background before raw mode takes over stdin
    app.theme = Theme::auto_detect();
    info!(api = app.source_description(), "Starting dashboard");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    while app.running {
        // Collect finished fetches and start due ones
        app.tick();

        terminal.draw(|frame| ui::render(frame, app))?;

        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                // Redrawn on the next iteration
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    info!("Dashboard closed");
    Ok(())
}
