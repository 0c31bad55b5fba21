//! The notification center: owner of all notification state for a session.
//!
//! It plays the role of the dashboard shell. Stream payloads, backlog results
//! and read-marking outcomes are all folded in here, on one thread; every
//! other part of the program only reads the state it exposes.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::api::NotificationApi;
use crate::config::{Config, MergeStrategy, ReadSync};
use crate::consts::LOOP_TICK;
use crate::core::{NotificationState, StreamPayload, View, map_records};
use crate::desktop::{Permission, SystemNotifier};
use crate::error::{ApiError, StreamError};
use crate::session::Session;
use crate::stream::{FeedEvent, Subscription, SubscriptionHandle};
use crate::toast::{ToastKind, ToastMessage, ToastSlot};
use crate::utils::Clock;

pub(crate) const MARK_ALL_OK: &str = "All notifications marked as read";
pub(crate) const MARK_ALL_FAILED: &str = "Failed to mark notifications as read";

#[derive(Debug, Clone, Copy)]
pub(crate) struct CenterOptions {
    pub(crate) merge: MergeStrategy,
    pub(crate) read_sync: ReadSync,
    pub(crate) reconnect_delay: Duration,
    pub(crate) min_spinner: Duration,
    pub(crate) toast_timeout: Duration,
}

impl From<&Config> for CenterOptions {
    fn from(config: &Config) -> Self {
        CenterOptions {
            merge: config.merge,
            read_sync: config.read_sync,
            reconnect_delay: config.reconnect_delay(),
            min_spinner: config.min_spinner(),
            toast_timeout: config.toast_timeout(),
        }
    }
}

/// Something observable happened while processing events
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CenterEvent {
    Connected,
    RecentUpdated,
    ServerError(String),
    Disconnected(StreamError),
    Reconnecting,
    ToastExpired,
}

/// Result of a user-initiated mark operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MarkOutcome {
    /// No session, nothing attempted
    Skipped,
    /// Nothing unread in the displayed list, no call made
    NothingToDo,
    Applied,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunUntil {
    FirstBatch,
    Forever,
}

pub(crate) struct NotificationCenter<A, S, N, C> {
    session: Option<Session>,
    api: A,
    subscription: S,
    notifier: N,
    clock: C,
    options: CenterOptions,
    state: NotificationState,
    view: View,
    loading: bool,
    marking_all: bool,
    permission: Permission,
    toast: ToastSlot,
    feed: Option<SubscriptionHandle>,
    reconnect_at: Option<Instant>,
    tx: Sender<FeedEvent>,
    rx: Receiver<FeedEvent>,
}

impl<A, S, N, C> NotificationCenter<A, S, N, C>
where
    A: NotificationApi,
    S: Subscription,
    N: SystemNotifier,
    C: Clock,
{
    pub(crate) fn new(
        session: Option<Session>,
        api: A,
        subscription: S,
        notifier: N,
        clock: C,
        options: CenterOptions,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        NotificationCenter {
            session,
            api,
            subscription,
            notifier,
            clock,
            options,
            state: NotificationState::default(),
            view: View::Recent,
            loading: false,
            marking_all: false,
            permission: Permission::Denied,
            toast: ToastSlot::new(options.toast_timeout),
            feed: None,
            reconnect_at: None,
            tx,
            rx,
        }
    }

    pub(crate) fn state(&self) -> &NotificationState {
        &self.state
    }

    pub(crate) fn view(&self) -> View {
        self.view
    }

    pub(crate) fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.loading
    }

    #[cfg(test)]
    pub(crate) fn is_marking_all(&self) -> bool {
        self.marking_all
    }

    #[cfg(test)]
    pub(crate) fn is_connected(&self) -> bool {
        self.feed.as_ref().is_some_and(|f| !f.is_closed())
    }

    pub(crate) fn toast(&self) -> Option<ToastMessage> {
        self.toast.get(self.clock.now())
    }

    #[cfg(test)]
    pub(crate) fn notifier(&self) -> &N {
        &self.notifier
    }

    // ─── Lifecycle ─────────────────────────────────────────────────────────

    /// Session start: popup permission, backlog prefetch, stream open
    pub(crate) fn start(&mut self) {
        if self.session.is_none() {
            debug!("no session, notification center idle");
            return;
        }
        self.permission = if self.notifier.is_supported() {
            self.notifier.request_permission()
        } else {
            Permission::Denied
        };
        self.load_backlog();
        self.connect();
    }

    /// Open the stream only (no backlog prefetch)
    pub(crate) fn connect(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        if let Some(old) = self.feed.take() {
            old.unsubscribe();
        }
        self.loading = true;
        self.reconnect_at = None;
        debug!(npp = %session.npp, "subscribing to notification stream");
        self.feed = Some(self.subscription.subscribe(session, self.tx.clone()));
    }

    /// Close the stream, forget the session and all state
    pub(crate) fn logout(&mut self) {
        if let Some(feed) = self.feed.take() {
            feed.unsubscribe();
        }
        self.session = None;
        self.reconnect_at = None;
        self.loading = false;
        self.state = NotificationState::default();
        self.view = View::Recent;
    }

    // ─── Stream side ───────────────────────────────────────────────────────

    /// Drain whatever the feed has delivered so far, without blocking
    pub(crate) fn pump(&mut self) -> Vec<CenterEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.extend(self.handle_feed_event(event));
        }
        events
    }

    /// Timers: reconnect delay and toast expiry
    pub(crate) fn tick(&mut self) -> Vec<CenterEvent> {
        let now = self.clock.now();
        let mut events = Vec::new();

        if let Some(at) = self.reconnect_at
            && now >= at
        {
            let closed = self.feed.as_ref().is_none_or(SubscriptionHandle::is_closed);
            if closed {
                info!("reconnecting notification stream");
                self.connect();
                events.push(CenterEvent::Reconnecting);
            } else {
                self.reconnect_at = Some(now + self.options.reconnect_delay);
            }
        }

        if self.toast.expire(now) {
            events.push(CenterEvent::ToastExpired);
        }
        events
    }

    fn handle_feed_event(&mut self, event: FeedEvent) -> Vec<CenterEvent> {
        match event {
            FeedEvent::Message(text) => self.on_stream_message(&text),
            FeedEvent::Failed(error) => vec![self.on_stream_failure(error)],
        }
    }

    fn on_stream_message(&mut self, text: &str) -> Vec<CenterEvent> {
        let payload = match StreamPayload::parse(text) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "malformed stream payload");
                return Vec::new();
            }
        };

        let mut events = Vec::new();
        if payload.connected {
            self.loading = false;
            events.push(CenterEvent::Connected);
        }
        if let Some(error) = payload.error {
            warn!(error = %error, "notification stream reported an error");
            self.loading = false;
            events.push(CenterEvent::ServerError(error));
        }
        if let Some(records) = payload.data {
            let batch = map_records(&records);
            debug!(count = batch.len(), unread = ?payload.unread_count, "stream batch");
            let popup =
                self.state
                    .apply_stream_batch(batch, payload.unread_count, self.options.merge);
            self.loading = false;
            if let Some(n) = popup
                && self.permission == Permission::Granted
                && self.notifier.is_supported()
            {
                self.notifier.show(&n.title, &n.message);
            }
            events.push(CenterEvent::RecentUpdated);
        }
        events
    }

    fn on_stream_failure(&mut self, error: StreamError) -> CenterEvent {
        warn!(error = %error, "notification stream failed");
        if let Some(feed) = &self.feed {
            feed.unsubscribe();
        }
        self.loading = false;
        self.state.clear_stream();
        self.reconnect_at = Some(self.clock.now() + self.options.reconnect_delay);
        CenterEvent::Disconnected(error)
    }

    /// Block on the feed, reporting each event to `on_event`.
    ///
    /// With [`RunUntil::FirstBatch`] the loop ends at the first batch or the
    /// first failure (no reconnect) and returns the event that ended it.
    /// Either mode ends when `on_event` logs the center out.
    pub(crate) fn run<F>(&mut self, until: RunUntil, mut on_event: F) -> Option<CenterEvent>
    where
        F: FnMut(&mut Self, &CenterEvent),
    {
        self.session.as_ref()?;
        loop {
            let mut events = match self.rx.recv_timeout(LOOP_TICK) {
                Ok(event) => self.handle_feed_event(event),
                Err(RecvTimeoutError::Timeout) => Vec::new(),
                Err(RecvTimeoutError::Disconnected) => return None,
            };
            events.extend(self.tick());

            let mut finished = None;
            for event in events {
                on_event(self, &event);
                let terminal = matches!(
                    event,
                    CenterEvent::RecentUpdated
                        | CenterEvent::ServerError(_)
                        | CenterEvent::Disconnected(_)
                );
                if until == RunUntil::FirstBatch && terminal && finished.is_none() {
                    finished = Some(event);
                }
            }
            if self.session.is_none() {
                return finished;
            }
            if finished.is_some() {
                if let Some(feed) = self.feed.take() {
                    feed.unsubscribe();
                }
                self.reconnect_at = None;
                return finished;
            }
        }
    }

    // ─── Backlog side ──────────────────────────────────────────────────────

    /// Fetch the full history into `all`; failures are logged only
    pub(crate) fn load_backlog(&mut self) -> bool {
        let Some(session) = &self.session else {
            return false;
        };
        match self.api.fetch_all(session) {
            Ok(records) => {
                let list = map_records(&records);
                self.state.apply_backlog(list, self.options.merge);
                debug!(count = self.state.total_count, "backlog loaded");
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to load notification backlog");
                false
            }
        }
    }

    /// Switch the displayed list; the backlog is fetched while still empty
    pub(crate) fn set_view(&mut self, view: View) {
        self.view = view;
        if view == View::All && self.state.all.is_empty() {
            self.load_backlog();
        }
    }

    // ─── Read-state mutation ───────────────────────────────────────────────

    pub(crate) fn mark_one(&mut self, id: i64) -> MarkOutcome {
        let Some(session) = &self.session else {
            return MarkOutcome::Skipped;
        };

        match self.options.read_sync {
            ReadSync::Optimistic => match self.api.mark_one(session, id) {
                Ok(()) => {
                    self.state.mark_one_read(id);
                    MarkOutcome::Applied
                }
                Err(e) if e.is_response() => {
                    // Answered but not OK: the local update still stands
                    warn!(notification_id = id, error = %e, "mark-one not acknowledged");
                    self.state.mark_one_read(id);
                    MarkOutcome::Applied
                }
                Err(e) => {
                    warn!(notification_id = id, error = %e, "mark-one failed");
                    MarkOutcome::Failed
                }
            },
            ReadSync::Rollback => {
                let snapshot = self.state.clone();
                self.state.mark_one_read(id);
                match self.api.mark_one(session, id) {
                    Ok(()) => MarkOutcome::Applied,
                    Err(e) => {
                        warn!(notification_id = id, error = %e, "mark-one failed, rolling back");
                        self.state = snapshot;
                        MarkOutcome::Failed
                    }
                }
            }
        }
    }

    /// Mark the unread items of the displayed list
    pub(crate) fn mark_all_displayed(&mut self) -> MarkOutcome {
        if self.session.is_none() {
            return MarkOutcome::Skipped;
        }
        let unread = self.state.unread_ids(self.view);
        if unread.is_empty() {
            return MarkOutcome::NothingToDo;
        }
        debug!(count = unread.len(), "marking displayed notifications read");

        let snapshot = self.begin_mark_all();
        let result = match &self.session {
            Some(session) => self.api.mark_recent(session),
            None => return MarkOutcome::Skipped,
        };
        self.finish_mark_all(snapshot, result)
    }

    /// Mark everything for this employee server-side, whatever is loaded
    pub(crate) fn mark_all_global(&mut self) -> MarkOutcome {
        if self.session.is_none() {
            return MarkOutcome::Skipped;
        }
        self.marking_all = true;
        let started = self.clock.now();

        let snapshot = self.begin_mark_all();
        let result = match &self.session {
            Some(session) => self.api.mark_global(session),
            None => return MarkOutcome::Skipped,
        };

        // Hold the spinner for a minimum visible duration
        let elapsed = self.clock.now().saturating_duration_since(started);
        if elapsed < self.options.min_spinner {
            self.clock.sleep(self.options.min_spinner - elapsed);
        }
        self.marking_all = false;
        self.finish_mark_all(snapshot, result)
    }

    /// Rollback mode applies up front and hands back the pre-call state
    fn begin_mark_all(&mut self) -> Option<NotificationState> {
        match self.options.read_sync {
            ReadSync::Optimistic => None,
            ReadSync::Rollback => {
                let snapshot = self.state.clone();
                self.state.mark_everything_read();
                Some(snapshot)
            }
        }
    }

    fn finish_mark_all(
        &mut self,
        snapshot: Option<NotificationState>,
        result: Result<(), ApiError>,
    ) -> MarkOutcome {
        let now = self.clock.now();
        match result {
            Ok(()) => {
                self.state.mark_everything_read();
                self.toast.show(MARK_ALL_OK, ToastKind::Success, now);
                MarkOutcome::Applied
            }
            Err(e) => {
                warn!(error = %e, "mark-all failed");
                if let Some(snapshot) = snapshot {
                    self.state = snapshot;
                }
                self.toast.show(MARK_ALL_FAILED, ToastKind::Error, now);
                MarkOutcome::Failed
            }
        }
    }

    pub(crate) fn dismiss_toast(&mut self) {
        self.toast.dismiss();
    }
}
