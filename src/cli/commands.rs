//! CLI subcommand definitions

use clap::Subcommand;

/// Main CLI commands
#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Store a session token and employee number
    Login {
        /// Bearer token issued by the dashboard
        #[arg(long)]
        token: String,
        /// Employee number (NPP)
        #[arg(long)]
        npp: String,
        /// Display name stored in the profile
        #[arg(long)]
        name: Option<String>,
    },
    /// Remove the stored session
    Logout,
    /// Follow the live notification stream
    Watch {
        /// Exit after the first notification batch
        #[arg(long)]
        once: bool,
    },
    /// Show notifications (recent by default)
    List {
        /// Show the full history instead of the recent stream batch
        #[arg(short, long)]
        all: bool,
        /// Only unread notifications
        #[arg(short = 'U', long)]
        unread: bool,
    },
    /// Mark one notification as read
    Read {
        /// Notification id
        id: String,
    },
    /// Mark all displayed notifications as read
    ReadAll {
        /// Act on the full history instead of the recent batch
        #[arg(short, long, conflicts_with = "global")]
        all: bool,
        /// Mark everything server-side, whatever is loaded locally
        #[arg(short, long)]
        global: bool,
    },
}
