//! Server-push subscription abstraction
//!
//! A [`Subscription`] delivers raw payloads into the center's channel from
//! whatever thread it likes; the center drains that channel on its own thread
//! and is the only place state changes.

mod sse;

pub(crate) use sse::SseSubscription;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;

use crate::error::StreamError;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FeedEvent {
    /// One complete payload (JSON text, not yet parsed)
    Message(String),
    /// Transport-level failure; the feed is finished after this
    Failed(StreamError),
}

pub(crate) trait Subscription {
    /// Start delivering events for `session` into `sink`.
    ///
    /// Connection failures arrive as [`FeedEvent::Failed`], never as a return
    /// value, matching how a browser event source reports them.
    fn subscribe(&self, session: &Session, sink: Sender<FeedEvent>) -> SubscriptionHandle;
}

impl<T: Subscription + ?Sized> Subscription for &T {
    fn subscribe(&self, session: &Session, sink: Sender<FeedEvent>) -> SubscriptionHandle {
        (**self).subscribe(session, sink)
    }
}

/// Shared flags between a running feed and its owner
#[derive(Debug, Clone, Default)]
pub(crate) struct SubscriptionHandle {
    cancelled: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl SubscriptionHandle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Ask the feed to stop; delivery ends at the next line read. A
    /// blocking reader only notices the flag once its next read returns, so
    /// the socket itself is released at the server's next line (or at
    /// process exit); [`is_closed`](Self::is_closed) reports when it is.
    pub(crate) fn unsubscribe(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// True once the underlying connection is gone
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_closed(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
