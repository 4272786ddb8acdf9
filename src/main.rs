//! inputloop - replays captured input through the OS injection facility.

mod cli;

use anyhow::Context;
use cli::Cli;
use inputloop::keycode::key_name;
use inputloop::{Config, Loopback};
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    // --verbose enables debug-level output unless RUST_LOG says otherwise
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load_default().context("failed to load default config")?,
    };
    config.startup.blocked |= cli.blocked;
    config.startup.profiling |= cli.profile;
    config.validate().context("invalid configuration")?;

    let loopback = Loopback::new(config);
    print_banner(&loopback);

    let state = loopback.state();
    ctrlc::set_handler(move || {
        state.request_shutdown();
        let _ = inputloop::stop_hook();
    })
    .context("failed to install Ctrl+C handler")?;

    let stats = inputloop::run(&loopback).context("loopback failed")?;
    println!(
        "Replayed {} reports as {} inputs over {} iterations",
        stats.reports, stats.injected, stats.iterations
    );
    if stats.failed_batches > 0 {
        println!("{} batches were not fully injected", stats.failed_batches);
    }
    Ok(())
}

fn print_banner(loopback: &Loopback) {
    let controls = &loopback.config().controls;
    let state = loopback.state();
    let on_off = |flag: bool| if flag { "on" } else { "off" };

    println!("inputloop {}", env!("CARGO_PKG_VERSION"));
    println!("Controls:");
    println!(
        "  {:<5} toggle input blocking (currently {})",
        key_name(controls.toggle_block),
        on_off(state.is_blocked())
    );
    println!(
        "  {:<5} toggle performance profiling (currently {})",
        key_name(controls.toggle_profiling),
        on_off(state.is_profiling())
    );
    println!("  {:<5} exit", key_name(controls.shutdown));
}
