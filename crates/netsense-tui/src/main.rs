//! `netsense`: terminal dashboard for network and sensor telemetry.
//!
//! Built on [ratatui](https://ratatui.rs) over the state holders in
//! `netsense-core`. Screens are navigable via number keys (1-4):
//! Dashboard, Network, Sensors, and Settings.
//!
//! Logs go to a file (default `/tmp/netsense.log`) so they never corrupt
//! the terminal UI.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod platform;
mod screen;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use netsense_core::{SettingsState, Telemetry};

use crate::app::App;

/// Live network and sensor telemetry in the terminal.
#[derive(Parser, Debug)]
#[command(name = "netsense", version, about)]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(short, long, env = "NETSENSE_CONFIG")]
    config: Option<PathBuf>,

    /// Use the simulated handset instead of host services
    #[arg(long)]
    simulate: bool,

    /// Log file path
    #[arg(long, default_value = "/tmp/netsense.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-based tracing. Nothing may log to stdout/stderr while the TUI owns
/// the terminal. Hold the returned guard until exit so logs flush.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "netsense={log_level},netsense_core={log_level},netsense_api={log_level}"
        ))
    });

    let log_dir = cli
        .log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(std::path::Path::new("."));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("netsense.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tui::install_hooks()?;
    let _log_guard = setup_tracing(&cli);

    let config_file = cli.config.clone().unwrap_or_else(netsense_config::config_path);
    let config = netsense_config::load_config(Some(config_file.as_path()))
        .wrap_err_with(|| format!("failed to load {}", config_file.display()))?;
    let source_config = config.to_source_config().wrap_err("invalid configuration")?;

    let backend = platform::resolve_backend(&config.platform, cli.simulate);
    let platform = platform::build_platform(backend, &config.platform);
    info!(backend = backend.as_str(), config = %config_file.display(), "starting netsense");

    let telemetry = Telemetry::new(platform, &source_config)?;
    let config_label = config_file
        .exists()
        .then(|| config_file.display().to_string());
    let settings = SettingsState::new(backend.as_str(), config_label);

    let mut app = App::new(telemetry, settings, backend.as_str());
    app.run().await?;

    Ok(())
}
