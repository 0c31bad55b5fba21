mod format;
mod json;
mod table;

pub(crate) use json::{output_mark_json, output_notifications_json};
pub(crate) use table::{ListOptions, print_notification_table, print_toast};
