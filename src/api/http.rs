use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use super::{NotificationApi, join_url, paths};
use crate::core::backlog_records;
use crate::error::ApiError;
use crate::session::Session;

const FETCH_RETRIES: usize = 3;
const RETRY_BACKOFF_MS: u64 = 250;

/// Blocking HTTP implementation over a shared `ureq` agent
pub(crate) struct HttpApi {
    agent: ureq::Agent,
    base_url: String,
}

fn bearer(session: &Session) -> String {
    format!("Bearer {}", session.token)
}

impl HttpApi {
    pub(crate) fn new(base_url: &str, timeout: Duration) -> Self {
        // Status codes are inspected by hand so non-2xx still reach the caller
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        HttpApi {
            agent,
            base_url: base_url.to_string(),
        }
    }

    fn put(&self, session: &Session, path: &str) -> Result<(), ApiError> {
        let url = join_url(&self.base_url, path);
        let auth = bearer(session);
        let response = self
            .agent
            .put(&url)
            .header("Authorization", auth.as_str())
            .send_empty()
            .map_err(|e| ApiError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        debug!(url = %url, status = status.as_u16(), "PUT finished");
        if !status.is_success() {
            return Err(ApiError::Status {
                url,
                code: status.as_u16(),
            });
        }
        Ok(())
    }

    fn get_json_once(&self, url: &str, auth: &str) -> Result<Value, ApiError> {
        let response = self
            .agent
            .get(url)
            .header("Authorization", auth)
            .call()
            .map_err(|e| ApiError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                code: status.as_u16(),
            });
        }

        response
            .into_body()
            .read_json::<Value>()
            .map_err(|e| ApiError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            })
    }
}

impl NotificationApi for HttpApi {
    fn fetch_all(&self, session: &Session) -> Result<Vec<Value>, ApiError> {
        let url = join_url(&self.base_url, &paths::backlog(&session.npp));
        let auth = bearer(session);

        let mut attempt = 0;
        let body = loop {
            match self.get_json_once(&url, &auth) {
                Ok(body) => break body,
                Err(e) if !e.is_response() && attempt + 1 < FETCH_RETRIES => {
                    warn!(url = %url, error = %e, attempt, "backlog fetch failed, retrying");
                    std::thread::sleep(Duration::from_millis(
                        RETRY_BACKOFF_MS * (attempt as u64 + 1),
                    ));
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };

        let records = backlog_records(body).ok_or_else(|| ApiError::Decode {
            url: url.clone(),
            message: "expected an array or an object with a \"data\" array".to_string(),
        })?;
        debug!(url = %url, count = records.len(), "backlog fetched");
        Ok(records)
    }

    fn mark_one(&self, session: &Session, id: i64) -> Result<(), ApiError> {
        self.put(session, &paths::mark_one(id))
    }

    fn mark_recent(&self, session: &Session) -> Result<(), ApiError> {
        self.put(session, &paths::mark_recent(&session.npp))
    }

    fn mark_global(&self, session: &Session) -> Result<(), ApiError> {
        self.put(session, &paths::mark_global(&session.npp))
    }
}
