//! Core module - notification model and state reconciliation

mod state;
mod types;

pub(crate) use state::NotificationState;
pub(crate) use types::{Notification, StreamPayload, View, backlog_records, map_records};
