use serde::Serialize;

use crate::core::{Notification, NotificationState, View};
use crate::toast::ToastMessage;

#[derive(Serialize)]
struct ListOutput<'a> {
    view: &'static str,
    unread_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_count: Option<usize>,
    notifications: Vec<&'a Notification>,
}

fn view_name(view: View) -> &'static str {
    match view {
        View::Recent => "recent",
        View::All => "all",
    }
}

pub(crate) fn output_notifications_json(
    state: &NotificationState,
    view: View,
    unread_only: bool,
) -> String {
    let output = ListOutput {
        view: view_name(view),
        unread_count: state.unread_count,
        total_count: (view == View::All).then_some(state.total_count),
        notifications: state
            .list(view)
            .iter()
            .filter(|n| !unread_only || !n.read)
            .collect(),
    };
    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
}

#[derive(Serialize)]
struct MarkOutput<'a> {
    action: &'a str,
    applied: bool,
    unread_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    toast: Option<&'a ToastMessage>,
}

pub(crate) fn output_mark_json(
    action: &str,
    applied: bool,
    state: &NotificationState,
    toast: Option<&ToastMessage>,
) -> String {
    let output = MarkOutput {
        action,
        applied,
        unread_count: state.unread_count,
        toast,
    };
    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
}
