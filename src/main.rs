//! Raw HID CLI
//!
//! A command-line interface for discovering and exchanging packets with
//! raw HID USB devices.

use clap::Parser;
use rawhid::config::RawHidConfig;
use tracing_subscriber::EnvFilter;

// CLI definitions
mod cli;
use cli::{Cli, Commands};

// Command handlers
mod commands;
use commands::Context;

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> commands::CommandResult {
    let config_path = cli.config.clone().unwrap_or_else(RawHidConfig::default_path);
    let config = RawHidConfig::load(&config_path)?.with_overrides(
        cli.vid,
        cli.pid,
        cli.usage_page,
        cli.usage,
    );
    let ctx = Context {
        config,
        config_path,
        color: !cli.no_color,
    };

    match cli.command {
        None => commands::device::list(&ctx, None, false),
        Some(Commands::Scan) => commands::device::scan(&ctx),
        Some(Commands::List { max, json }) => commands::device::list(&ctx, max, json),
        Some(Commands::Listen { json, count }) => commands::packet::listen(&ctx, json, count),
        Some(Commands::Send { bytes }) => commands::packet::send(&ctx, &bytes),
        Some(Commands::Echo { json }) => commands::packet::echo(&ctx, json),
        Some(Commands::Config { init }) => commands::settings::config(&ctx, init),
    }
}
