use std::io::{BufRead, BufReader};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{FeedEvent, Subscription, SubscriptionHandle};
use crate::api::{join_url, paths};
use crate::error::StreamError;
use crate::session::Session;

/// Incremental `text/event-stream` decoder; yields one string per event
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    data: Vec<String>,
}

impl SseDecoder {
    pub(crate) fn push_line(&mut self, line: &str) -> Option<String> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data.push(value.to_string());
        }
        None
    }

    /// True while `data:` lines are buffered without their closing blank line
    pub(crate) fn has_pending(&self) -> bool {
        !self.data.is_empty()
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        let event = self.data.join("\n");
        self.data.clear();
        Some(event)
    }
}

/// Server-Sent Events feed over a dedicated reader thread
pub(crate) struct SseSubscription {
    agent: ureq::Agent,
    base_url: String,
}

impl SseSubscription {
    pub(crate) fn new(base_url: &str, connect_timeout: Duration) -> Self {
        // No global timeout: the response body is open for the whole session
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_connect(Some(connect_timeout))
            .http_status_as_error(false)
            .build()
            .into();
        SseSubscription {
            agent,
            base_url: base_url.to_string(),
        }
    }
}

impl Subscription for SseSubscription {
    fn subscribe(&self, session: &Session, sink: Sender<FeedEvent>) -> SubscriptionHandle {
        let handle = SubscriptionHandle::new();
        let feed = handle.clone();
        let agent = self.agent.clone();
        let url = join_url(&self.base_url, paths::stream());
        let session = session.clone();

        thread::spawn(move || {
            let outcome = read_feed(&agent, &url, &session, &sink, &feed);
            feed.mark_closed();
            match outcome {
                Err(e) if !feed.is_cancelled() => {
                    warn!(url = %url, error = %e, "notification stream dropped");
                    let _ = sink.send(FeedEvent::Failed(e));
                }
                _ => debug!(url = %url, "notification stream closed"),
            }
        });

        handle
    }
}

fn read_feed(
    agent: &ureq::Agent,
    url: &str,
    session: &Session,
    sink: &Sender<FeedEvent>,
    feed: &SubscriptionHandle,
) -> Result<(), StreamError> {
    let response = agent
        .get(url)
        .query("npp", &session.npp)
        .query("token", &session.token)
        .header("Accept", "text/event-stream")
        .call()
        .map_err(|e| StreamError::Connect(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(StreamError::Rejected(status.as_u16()));
    }
    info!(npp = %session.npp, "notification stream open");

    let reader = BufReader::new(response.into_body().into_reader());
    let mut decoder = SseDecoder::default();
    for line in reader.lines() {
        if feed.is_cancelled() {
            return Ok(());
        }
        let line = line.map_err(|e| StreamError::Read(e.to_string()))?;
        if let Some(event) = decoder.push_line(&line)
            && sink.send(FeedEvent::Message(event)).is_err()
        {
            // Receiver gone, nobody is listening any more
            return Ok(());
        }
    }
    // An event is only complete at its blank line; a cut-off one is discarded
    if decoder.has_pending() {
        debug!(url = %url, "dropping unterminated event at end of stream");
    }
    Err(StreamError::Read("server closed the stream".to_string()))
}
