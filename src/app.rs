use tracing::debug;

use crate::api::HttpApi;
use crate::center::{CenterEvent, CenterOptions, MarkOutcome, NotificationCenter, RunUntil};
use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::core::View;
use crate::desktop::{self, SystemNotifier};
use crate::error::{AppError, StreamError};
use crate::output::{
    ListOptions, output_mark_json, output_notifications_json, print_notification_table,
    print_toast,
};
use crate::session::{Session, SessionStore};
use crate::stream::SseSubscription;
use crate::utils::SystemClock;

type LiveCenter =
    NotificationCenter<HttpApi, SseSubscription, Box<dyn SystemNotifier>, SystemClock>;

pub(crate) struct CommandContext<'a> {
    pub(crate) cli: &'a Cli,
    pub(crate) config: &'a Config,
}

impl CommandContext<'_> {
    fn center(&self, session: Session, popups: bool) -> LiveCenter {
        let base_url = self.cli.base_url();
        NotificationCenter::new(
            Some(session),
            HttpApi::new(base_url, self.config.request_timeout()),
            SseSubscription::new(base_url, self.config.request_timeout()),
            desktop::select(popups && !self.cli.no_popup),
            SystemClock,
            CenterOptions::from(self.config),
        )
    }

    fn list_options(&self, view: View, unread_only: bool) -> ListOptions {
        ListOptions {
            view,
            unread_only,
            use_color: self.cli.use_color(),
        }
    }
}

fn session_path() -> Result<std::path::PathBuf, AppError> {
    SessionStore::path().ok_or(AppError::NoSessionPath)
}

fn load_session() -> Result<Option<Session>, AppError> {
    let path = session_path()?;
    Ok(SessionStore::load_from(&path)?.session())
}

/// Dispatch a parsed command
pub(crate) fn handle_command(ctx: &CommandContext<'_>) -> Result<(), AppError> {
    match &ctx.cli.command {
        Commands::Login { token, npp, name } => handle_login(token, npp, name.as_deref()),
        Commands::Logout => handle_logout(),
        Commands::Watch { once } => with_session(|s| handle_watch(ctx, s, *once)),
        Commands::List { all, unread } => with_session(|s| handle_list(ctx, s, *all, *unread)),
        Commands::Read { id } => with_session(|s| handle_read(ctx, s, id)),
        Commands::ReadAll { all, global } => {
            with_session(|s| handle_read_all(ctx, s, *all, *global))
        }
    }
}

/// Run `f` with the stored session; without one, print a hint and succeed
fn with_session(f: impl FnOnce(Session) -> Result<(), AppError>) -> Result<(), AppError> {
    let Some(session) = load_session()? else {
        println!("Not logged in. Run `pdam-notify login --token <TOKEN> --npp <NPP>` first.");
        return Ok(());
    };
    debug!(npp = %session.npp, "session loaded");
    f(session)
}

fn handle_login(token: &str, npp: &str, name: Option<&str>) -> Result<(), AppError> {
    let path = session_path()?;
    let store = SessionStore::from_login(token, npp, name)?;
    store.save_to(&path)?;
    println!("Logged in as NPP {}.", npp.trim());
    Ok(())
}

fn handle_logout() -> Result<(), AppError> {
    let path = session_path()?;
    if SessionStore::clear(&path)? {
        println!("Logged out.");
    } else {
        println!("No session to remove.");
    }
    Ok(())
}

/// Turn the event that ended a one-shot run into an error, if it was one
fn first_batch_result(ended_by: Option<CenterEvent>) -> Result<(), AppError> {
    match ended_by {
        Some(CenterEvent::Disconnected(e)) => Err(e.into()),
        Some(CenterEvent::ServerError(message)) => Err(StreamError::Server(message).into()),
        _ => Ok(()),
    }
}

fn handle_watch(ctx: &CommandContext<'_>, session: Session, once: bool) -> Result<(), AppError> {
    let json = ctx.cli.json;
    let use_color = ctx.cli.use_color();
    let reconnect_secs = ctx.config.reconnect_delay_secs;
    let npp = session.npp.clone();

    let mut center = ctx.center(session, true);
    center.start();
    if !json && center.is_loading() {
        eprintln!("Connecting to notification stream for NPP {npp}...");
    }

    let until = if once {
        RunUntil::FirstBatch
    } else {
        RunUntil::Forever
    };
    let ended_by = center.run(until, |c, event| match event {
        CenterEvent::Connected => {
            if !json {
                eprintln!("Connected.");
            }
        }
        CenterEvent::RecentUpdated => {
            if json {
                println!("{}", output_notifications_json(c.state(), View::Recent, false));
            } else {
                print_notification_table(
                    c.state(),
                    ListOptions {
                        view: View::Recent,
                        unread_only: false,
                        use_color,
                    },
                );
            }
        }
        CenterEvent::ServerError(message) => eprintln!("Server error: {message}"),
        CenterEvent::Disconnected(e) => {
            if matches!(load_session(), Ok(None)) {
                eprintln!("{e}. Session removed, stopping.");
                c.logout();
            } else if !once {
                eprintln!("{e}. Reconnecting in {reconnect_secs}s...");
            }
        }
        CenterEvent::Reconnecting => {
            if !json {
                eprintln!("Reconnecting...");
            }
        }
        CenterEvent::ToastExpired => {}
    });
    first_batch_result(ended_by)
}

/// Bring the list for `view` into the center: backlog fetch or first stream batch
fn load_view(center: &mut LiveCenter, view: View) -> Result<(), AppError> {
    match view {
        View::All => {
            center.set_view(View::All);
            Ok(())
        }
        View::Recent => {
            center.connect();
            let ended_by = center.run(RunUntil::FirstBatch, |_, _| {});
            first_batch_result(ended_by)
        }
    }
}

fn handle_list(
    ctx: &CommandContext<'_>,
    session: Session,
    all: bool,
    unread: bool,
) -> Result<(), AppError> {
    let view = if all { View::All } else { View::Recent };
    let mut center = ctx.center(session, false);
    load_view(&mut center, view)?;

    if ctx.cli.json {
        println!("{}", output_notifications_json(center.state(), center.view(), unread));
    } else {
        print_notification_table(center.state(), ctx.list_options(center.view(), unread));
    }
    Ok(())
}

fn handle_read(ctx: &CommandContext<'_>, session: Session, id: &str) -> Result<(), AppError> {
    let id: i64 = id.trim().parse().map_err(|_| AppError::InvalidId {
        input: id.to_string(),
    })?;
    let mut center = ctx.center(session, false);
    let outcome = center.mark_one(id);
    let applied = outcome == MarkOutcome::Applied;

    if ctx.cli.json {
        println!("{}", output_mark_json("read", applied, center.state(), None));
    } else if applied {
        println!("Notification {id} marked as read.");
    }
    if !applied {
        return Err(AppError::ActionFailed {
            action: format!("Marking notification {id}"),
        });
    }
    Ok(())
}

fn handle_read_all(
    ctx: &CommandContext<'_>,
    session: Session,
    all: bool,
    global: bool,
) -> Result<(), AppError> {
    let mut center = ctx.center(session, false);
    let use_color = ctx.cli.use_color();

    let (action, outcome) = if global {
        if !ctx.cli.json {
            eprintln!("Marking all notifications as read...");
        }
        ("read-all-global", center.mark_all_global())
    } else {
        let view = if all { View::All } else { View::Recent };
        load_view(&mut center, view)?;
        ("read-all", center.mark_all_displayed())
    };

    let toast = center.toast();
    if ctx.cli.json {
        println!(
            "{}",
            output_mark_json(
                action,
                outcome == MarkOutcome::Applied,
                center.state(),
                toast.as_ref()
            )
        );
    } else if outcome == MarkOutcome::NothingToDo {
        println!("No unread notifications to mark.");
    } else if let Some(toast) = &toast {
        print_toast(toast, use_color);
    }
    center.dismiss_toast();

    if outcome == MarkOutcome::Failed {
        return Err(AppError::ActionFailed {
            action: "Marking all notifications".to_string(),
        });
    }
    Ok(())
}
