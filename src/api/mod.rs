//! Dashboard notification endpoints
//!
//! The center talks to the server only through [`NotificationApi`] so tests
//! can count and script calls.

mod http;

pub(crate) use http::HttpApi;

use serde_json::Value;

use crate::error::ApiError;
use crate::session::Session;

pub(crate) trait NotificationApi {
    /// Complete history for the session's employee, raw records
    fn fetch_all(&self, session: &Session) -> Result<Vec<Value>, ApiError>;

    /// `PUT /api/notifications/update/<id>`
    fn mark_one(&self, session: &Session, id: i64) -> Result<(), ApiError>;

    /// `PUT /api/notifications/update/<npp>`
    fn mark_recent(&self, session: &Session) -> Result<(), ApiError>;

    /// `PUT /api/notifications/update/all/<npp>`
    fn mark_global(&self, session: &Session) -> Result<(), ApiError>;
}

impl<T: NotificationApi + ?Sized> NotificationApi for &T {
    fn fetch_all(&self, session: &Session) -> Result<Vec<Value>, ApiError> {
        (**self).fetch_all(session)
    }

    fn mark_one(&self, session: &Session, id: i64) -> Result<(), ApiError> {
        (**self).mark_one(session, id)
    }

    fn mark_recent(&self, session: &Session) -> Result<(), ApiError> {
        (**self).mark_recent(session)
    }

    fn mark_global(&self, session: &Session) -> Result<(), ApiError> {
        (**self).mark_global(session)
    }
}

/// Endpoint paths relative to the base URL
pub(crate) mod paths {
    pub(crate) fn stream() -> &'static str {
        "/api/notifications/stream"
    }

    pub(crate) fn backlog(npp: &str) -> String {
        format!("/api/notifications/all/{npp}")
    }

    pub(crate) fn mark_one(id: i64) -> String {
        format!("/api/notifications/update/{id}")
    }

    pub(crate) fn mark_recent(npp: &str) -> String {
        format!("/api/notifications/update/{npp}")
    }

    pub(crate) fn mark_global(npp: &str) -> String {
        format!("/api/notifications/update/all/{npp}")
    }
}

/// Join base URL and path without doubling the slash
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
