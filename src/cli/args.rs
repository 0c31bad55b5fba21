//! CLI argument definitions
//!
//! Global CLI options and configuration merging logic.

use std::io::IsTerminal;

use clap::Parser;

use crate::config::Config;

use super::commands::Commands;

#[derive(Parser, Debug)]
#[command(name = "pdam-notify")]
#[command(about = "PDAM dashboard notifications from the terminal", version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,

    /// Output as JSON
    #[arg(short, long, global = true)]
    pub(crate) json: bool,

    /// Dashboard base URL (e.g., "http://pdam.local:3000")
    #[arg(long, global = true, value_name = "URL")]
    pub(crate) base_url: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub(crate) no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub(crate) debug: bool,

    /// Never show system popups for new notifications
    #[arg(long, global = true)]
    pub(crate) no_popup: bool,
}

impl Cli {
    /// Merge config file values into CLI (CLI args take precedence)
    pub(crate) fn with_config(mut self, config: &Config) -> Self {
        if !self.no_color && config.no_color {
            self.no_color = true;
        }
        if !self.debug && config.debug {
            self.debug = true;
        }
        if !self.no_popup && !config.desktop {
            self.no_popup = true;
        }
        if self.base_url.is_none() {
            self.base_url = Some(config.base_url.clone());
        }
        self
    }

    pub(crate) fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(crate::consts::DEFAULT_BASE_URL)
    }

    pub(crate) fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_fills_unset_values() {
        let cli = Cli::parse_from(["pdam-notify", "list"]);
        let config = Config {
            base_url: "http://pdam.local".to_string(),
            debug: true,
            desktop: false,
            ..Config::default()
        };
        let cli = cli.with_config(&config);
        assert_eq!(cli.base_url(), "http://pdam.local");
        assert!(cli.debug);
        assert!(cli.no_popup);
    }

    #[test]
    fn cli_base_url_wins_over_config() {
        let cli = Cli::parse_from(["pdam-notify", "--base-url", "http://cli", "list"]);
        let config = Config {
            base_url: "http://config".to_string(),
            ..Config::default()
        };
        assert_eq!(cli.with_config(&config).base_url(), "http://cli");
    }

    #[test]
    fn read_all_flags_conflict() {
        assert!(Cli::try_parse_from(["pdam-notify", "read-all", "--all", "--global"]).is_err());
        assert!(Cli::try_parse_from(["pdam-notify", "read-all", "--global"]).is_ok());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["pdam-notify", "list", "--all", "--json"]);
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::List { all: true, unread: false }));
    }
}
