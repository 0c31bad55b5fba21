mod api;
mod app;
mod center;
mod cli;
mod config;
mod consts;
mod core;
mod desktop;
mod error;
mod logging;
mod output;
mod session;
mod stream;
mod toast;
mod utils;

use clap::Parser;
use tracing::warn;

use app::{CommandContext, handle_command};
use cli::Cli;
use config::Config;

fn main() {
    let cli = Cli::parse();
    let (config, config_error) = Config::load();
    let cli = cli.with_config(&config);
    logging::init(cli.debug);
    if let Some(e) = config_error {
        warn!(error = %e, "config file ignored, using defaults");
    }

    let ctx = CommandContext {
        cli: &cli,
        config: &config,
    };
    if let Err(e) = handle_command(&ctx) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
