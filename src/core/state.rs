//! Session-scoped notification state and its pure reconciliation rules.
//!
//! Nothing here does I/O; the notification center calls these after the
//! network side has produced (or failed to produce) a result.

use std::collections::HashSet;

use serde::Serialize;

use super::types::{Notification, View};
use crate::config::MergeStrategy;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub(crate) struct NotificationState {
    /// Newest first, owned by the stream
    pub(crate) recent: Vec<Notification>,
    /// Newest first, lazily filled from the backlog
    pub(crate) all: Vec<Notification>,
    /// Server-reported, authoritative over anything counted locally
    pub(crate) unread_count: u64,
    /// Length of the last backlog list (client-derived)
    pub(crate) total_count: usize,
    /// Ids unread in the last stream batch; outlives a disconnect so a
    /// reconnect does not announce the same items again
    #[serde(skip)]
    pub(crate) last_unread: HashSet<i64>,
}

impl NotificationState {
    pub(crate) fn list(&self, view: View) -> &[Notification] {
        match view {
            View::Recent => &self.recent,
            View::All => &self.all,
        }
    }

    /// Ids currently known read in either list
    fn known_read(&self) -> HashSet<i64> {
        self.recent
            .iter()
            .chain(self.all.iter())
            .filter(|n| n.read)
            .map(|n| n.id)
            .collect()
    }

    fn fold_in(&self, mut incoming: Vec<Notification>, merge: MergeStrategy) -> Vec<Notification> {
        if merge == MergeStrategy::ById {
            let read = self.known_read();
            for n in &mut incoming {
                if read.contains(&n.id) {
                    n.read = true;
                }
            }
        }
        incoming
    }

    /// Apply a stream batch; returns the newest notification that was not
    /// unread in the previous batch, if any.
    pub(crate) fn apply_stream_batch(
        &mut self,
        batch: Vec<Notification>,
        unread_count: Option<u64>,
        merge: MergeStrategy,
    ) -> Option<Notification> {
        self.recent = self.fold_in(batch, merge);
        if let Some(count) = unread_count {
            self.unread_count = count;
        }

        let newly_unread = self
            .recent
            .iter()
            .find(|n| !n.read && !self.last_unread.contains(&n.id))
            .cloned();
        self.last_unread = self
            .recent
            .iter()
            .filter(|n| !n.read)
            .map(|n| n.id)
            .collect();
        newly_unread
    }

    pub(crate) fn apply_backlog(&mut self, list: Vec<Notification>, merge: MergeStrategy) {
        self.all = self.fold_in(list, merge);
        self.total_count = self.all.len();
    }

    /// Local effect of marking one notification read
    pub(crate) fn mark_one_read(&mut self, id: i64) {
        for n in self.recent.iter_mut().chain(self.all.iter_mut()) {
            if n.id == id {
                n.read = true;
            }
        }
        self.unread_count = self.unread_count.saturating_sub(1);
    }

    /// Local effect of a successful mark-all (scoped or global)
    pub(crate) fn mark_everything_read(&mut self) {
        for n in self.recent.iter_mut().chain(self.all.iter_mut()) {
            n.read = true;
        }
        self.unread_count = 0;
    }

    pub(crate) fn unread_ids(&self, view: View) -> Vec<i64> {
        self.list(view)
            .iter()
            .filter(|n| !n.read)
            .map(|n| n.id)
            .collect()
    }

    /// Drop what the stream owns; the backlog survives a disconnect
    pub(crate) fn clear_stream(&mut self) {
        self.recent.clear();
        self.unread_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(id: i64, read: bool) -> Notification {
        Notification {
            id,
            title: format!("N{id}"),
            message: String::new(),
            read,
            created_at: None,
            linked_request_id: None,
        }
    }

    #[test]
    fn stream_batch_replaces_recent_and_count() {
        let mut state = NotificationState {
            recent: vec![n(9, false)],
            unread_count: 7,
            ..Default::default()
        };
        state.apply_stream_batch(vec![n(1, false), n(2, true)], Some(1), MergeStrategy::Replace);
        assert_eq!(state.recent, vec![n(1, false), n(2, true)]);
        assert_eq!(state.unread_count, 1);
    }

    #[test]
    fn stream_batch_without_count_keeps_previous_count() {
        let mut state = NotificationState {
            unread_count: 3,
            ..Default::default()
        };
        state.apply_stream_batch(vec![n(1, false)], None, MergeStrategy::Replace);
        assert_eq!(state.unread_count, 3);
    }

    #[test]
    fn newly_unread_ignores_already_seen_unread() {
        let mut state = NotificationState::default();
        let first = state.apply_stream_batch(vec![n(1, false)], Some(1), MergeStrategy::Replace);
        assert_eq!(first.map(|n| n.id), Some(1));

        let second =
            state.apply_stream_batch(vec![n(1, false), n(2, true)], Some(1), MergeStrategy::Replace);
        assert!(second.is_none());

        let third = state.apply_stream_batch(
            vec![n(4, false), n(3, false), n(1, false)],
            Some(3),
            MergeStrategy::Replace,
        );
        assert_eq!(third.map(|n| n.id), Some(4));
    }

    #[test]
    fn replace_lets_stale_backlog_clobber_read_flag() {
        let mut state = NotificationState::default();
        state.apply_stream_batch(vec![n(1, true)], Some(0), MergeStrategy::Replace);
        state.apply_backlog(vec![n(1, false)], MergeStrategy::Replace);
        assert!(!state.all[0].read);
    }

    #[test]
    fn by_id_keeps_known_read_flag() {
        let mut state = NotificationState::default();
        state.apply_stream_batch(vec![n(1, true)], Some(0), MergeStrategy::ById);
        state.apply_backlog(vec![n(1, false), n(2, false)], MergeStrategy::ById);
        assert!(state.all[0].read);
        assert!(!state.all[1].read);
        assert_eq!(state.total_count, 2);
    }

    #[test]
    fn mark_one_sets_both_lists_and_floors_count() {
        let mut state = NotificationState {
            recent: vec![n(1, false)],
            all: vec![n(1, false), n(2, false)],
            unread_count: 0,
            total_count: 2,
            ..Default::default()
        };
        state.mark_one_read(1);
        assert!(state.recent[0].read);
        assert!(state.all[0].read);
        assert!(!state.all[1].read);
        assert_eq!(state.unread_count, 0);
    }

    #[test]
    fn unread_ids_follow_view() {
        let state = NotificationState {
            recent: vec![n(1, true)],
            all: vec![n(1, true), n(2, false)],
            ..Default::default()
        };
        assert!(state.unread_ids(View::Recent).is_empty());
        assert_eq!(state.unread_ids(View::All), vec![2]);
    }

    #[test]
    fn clear_stream_keeps_backlog() {
        let mut state = NotificationState {
            recent: vec![n(1, false)],
            all: vec![n(1, false)],
            unread_count: 1,
            total_count: 1,
            ..Default::default()
        };
        state.clear_stream();
        assert!(state.recent.is_empty());
        assert_eq!(state.unread_count, 0);
        assert_eq!(state.all.len(), 1);
    }

    #[test]
    fn unread_seen_before_a_disconnect_is_not_new_again() {
        let mut state = NotificationState::default();
        let first = state.apply_stream_batch(vec![n(1, false)], Some(1), MergeStrategy::Replace);
        assert_eq!(first.map(|n| n.id), Some(1));

        state.clear_stream();
        let again = state.apply_stream_batch(vec![n(1, false)], Some(1), MergeStrategy::Replace);
        assert!(again.is_none());

        let fresh =
            state.apply_stream_batch(vec![n(5, false), n(1, false)], Some(2), MergeStrategy::Replace);
        assert_eq!(fresh.map(|n| n.id), Some(5));
    }
}
