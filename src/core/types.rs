//! Notification data model
//!
//! Raw records arrive from both the stream and the backlog endpoint with
//! Indonesian field names; everything downstream works on [`Notification`].

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::utils::parse_timestamp;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Notification {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) message: String,
    pub(crate) read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) created_at: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) linked_request_id: Option<String>,
}

impl Notification {
    /// Map one raw server record, `None` when it has no usable id
    pub(crate) fn from_record(record: &Value) -> Option<Self> {
        let id = match record.get("id")? {
            Value::Number(n) => n.as_i64()?,
            Value::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };

        let read = match record.get("status").and_then(Value::as_str) {
            Some(status) => status == "read",
            None => record
                .get("read")
                .or_else(|| record.get("is_read"))
                .and_then(Value::as_bool)
                .unwrap_or(false),
        };

        Some(Notification {
            id,
            title: text_field(record, &["judul", "title"]).unwrap_or_default(),
            message: text_field(record, &["pesan", "message"]).unwrap_or_default(),
            read,
            created_at: record
                .get("created_at")
                .and_then(Value::as_str)
                .and_then(parse_timestamp),
            linked_request_id: text_field(
                record,
                &["id_pengajuan", "pengajuan_id", "linked_request_id"],
            ),
        })
    }
}

/// First present key, accepting strings and numbers
fn text_field(record: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match record.get(*key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Map a batch of raw records and order it newest first
pub(crate) fn map_records(records: &[Value]) -> Vec<Notification> {
    let mut mapped: Vec<Notification> = records
        .iter()
        .filter_map(|record| {
            let notification = Notification::from_record(record);
            if notification.is_none() {
                debug!(record = %record, "skipping notification record without id");
            }
            notification
        })
        .collect();
    sort_newest_first(&mut mapped);
    mapped
}

/// Stable descending sort by `created_at`; undated records go last
fn sort_newest_first(list: &mut [Notification]) {
    list.sort_by(|a, b| match (a.created_at, b.created_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

/// Which list the user is looking at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum View {
    #[default]
    Recent,
    All,
}

/// One parsed stream payload
#[derive(Debug, Default, PartialEq)]
pub(crate) struct StreamPayload {
    pub(crate) connected: bool,
    pub(crate) error: Option<String>,
    pub(crate) data: Option<Vec<Value>>,
    pub(crate) unread_count: Option<u64>,
}

impl StreamPayload {
    pub(crate) fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        Ok(StreamPayload {
            connected: value
                .get("connected")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            error: value.get("error").and_then(|e| match e {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            }),
            data: value.get("data").and_then(Value::as_array).cloned(),
            unread_count: value.get("unread_count").and_then(Value::as_u64),
        })
    }
}

/// Backlog body: `{ "data": [...] }` or a bare array
pub(crate) fn backlog_records(body: Value) -> Option<Vec<Value>> {
    match body {
        Value::Array(records) => Some(records),
        Value::Object(mut map) => match map.remove("data")? {
            Value::Array(records) => Some(records),
            _ => None,
        },
        _ => None,
    }
}
