//! Bootmaker - Boot disk creation wizard
//!
//! Entry point. It handles:
//! 1. CLI argument parsing (--config, --demo, --slide-ms, ...)
//! 2. Loading and validating `config.toml`
//! 3. Listing removable devices, or launching the GTK4/Libadwaita wizard

use anyhow::{Context, Result};
use bootmaker::config::{BackendKind, WizardConfig};
use bootmaker::devices;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Bootmaker - write a bootable image to a removable drive
#[derive(Parser, Debug)]
#[command(name = "bootmaker")]
#[command(about = "Boot disk creation wizard")]
#[command(version)]
struct Args {
    /// Path to config.toml (defaults to the user config directory)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use the simulated backend instead of the helper program
    #[arg(long)]
    demo: bool,

    /// Override the slide animation duration in milliseconds
    #[arg(long, value_name = "MS")]
    slide_ms: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Print removable devices and exit
    #[arg(long)]
    list_devices: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    if args.list_devices {
        return list_devices();
    }

    let mut config = WizardConfig::load(args.config.as_deref())?;
    if args.demo {
        config.backend.kind = BackendKind::Demo;
    }
    if let Some(ms) = args.slide_ms {
        config.window.slide_duration_ms = ms;
    }
    config.validate().context("Invalid command-line overrides")?;

    info!("Bootmaker v{}", env!("CARGO_PKG_VERSION"));
    info!("Backend: {:?}", config.backend.kind);

    run_gui(config)
}

/// `RUST_LOG` wins over `--verbose` when set
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .try_init();
}

fn list_devices() -> Result<()> {
    let found = devices::list_removable()?;

    if found.is_empty() {
        println!("No removable devices found");
        return Ok(());
    }

    for device in &found {
        println!("{}", device.label());
        for target in device.targets() {
            println!("  {}", target);
        }
    }

    Ok(())
}

#[cfg(feature = "gui")]
fn run_gui(config: WizardConfig) -> Result<()> {
    use bootmaker::ui::app::BootmakerApplication;

    if std::env::var("DISPLAY").is_err() && std::env::var("WAYLAND_DISPLAY").is_err() {
        anyhow::bail!("No display server detected (X11 or Wayland)");
    }

    gtk::init().context("Failed to initialize GTK4")?;
    adw::init().context("Failed to initialize Libadwaita")?;

    let app = BootmakerApplication::new(config);
    let exit_code = app.run();

    std::process::exit(exit_code.into());
}

#[cfg(not(feature = "gui"))]
fn run_gui(_config: WizardConfig) -> Result<()> {
    anyhow::bail!("Built without the `gui` feature; only --list-devices is available")
}
