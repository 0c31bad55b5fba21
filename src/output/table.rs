use comfy_table::{Cell, Color};

use crate::core::{Notification, NotificationState, View};
use crate::output::format::{
    create_styled_table, format_timestamp, header_cell, styled_cell, truncate,
};
use crate::toast::{ToastKind, ToastMessage};

const MESSAGE_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy)]
pub(crate) struct ListOptions {
    pub(crate) view: View,
    pub(crate) unread_only: bool,
    pub(crate) use_color: bool,
}

fn view_title(view: View) -> &'static str {
    match view {
        View::Recent => "Recent Notifications",
        View::All => "All Notifications",
    }
}

/// Print the displayed list with a summary line
pub(crate) fn print_notification_table(state: &NotificationState, opts: ListOptions) {
    let list: Vec<&Notification> = state
        .list(opts.view)
        .iter()
        .filter(|n| !opts.unread_only || !n.read)
        .collect();

    if list.is_empty() {
        println!("No notifications.");
        print_summary_line(state, opts);
        return;
    }

    let c = opts.use_color;
    let mut table = create_styled_table();
    table.set_header(vec![
        header_cell("", c),
        header_cell("ID", c),
        header_cell("Date", c),
        header_cell("Title", c),
        header_cell("Message", c),
        header_cell("Request", c),
    ]);

    for n in list {
        let (marker, color) = if n.read {
            ("", None)
        } else {
            ("●", if c { Some(Color::Yellow) } else { None })
        };
        table.add_row(vec![
            styled_cell(marker, color, false),
            Cell::new(n.id),
            Cell::new(format_timestamp(n.created_at)),
            styled_cell(&n.title, color, !n.read),
            Cell::new(truncate(&n.message, MESSAGE_WIDTH)),
            Cell::new(n.linked_request_id.as_deref().unwrap_or("-")),
        ]);
    }

    println!("\n  {}\n", view_title(opts.view));
    println!("{table}");
    print_summary_line(state, opts);
}

fn print_summary_line(state: &NotificationState, opts: ListOptions) {
    let text = match opts.view {
        View::Recent => format!("{} unread", state.unread_count),
        View::All => format!("{} unread | {} total", state.unread_count, state.total_count),
    };
    if opts.use_color {
        println!("\n  \x1b[36m{text}\x1b[0m\n");
    } else {
        println!("\n  {text}\n");
    }
}

/// Toasts go to stderr so piped table/JSON output stays clean
pub(crate) fn print_toast(toast: &ToastMessage, use_color: bool) {
    if !toast.visible {
        return;
    }
    let (symbol, color) = match toast.kind {
        ToastKind::Success => ("✓", "\x1b[32m"),
        ToastKind::Error => ("✗", "\x1b[31m"),
    };
    if use_color {
        eprintln!("{color}{symbol} {}\x1b[0m", toast.text);
    } else {
        eprintln!("{symbol} {}", toast.text);
    }
}
