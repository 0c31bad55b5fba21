//! Single-slot toast for user-initiated actions.
//!
//! A new toast replaces the visible one; nothing is queued.

use std::time::{Duration, Instant};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ToastMessage {
    pub(crate) visible: bool,
    pub(crate) text: String,
    pub(crate) kind: ToastKind,
}

#[derive(Debug)]
pub(crate) struct ToastSlot {
    current: Option<(ToastMessage, Instant)>,
    timeout: Duration,
}

impl ToastSlot {
    pub(crate) fn new(timeout: Duration) -> Self {
        ToastSlot {
            current: None,
            timeout,
        }
    }

    pub(crate) fn show(&mut self, text: impl Into<String>, kind: ToastKind, now: Instant) {
        let message = ToastMessage {
            visible: true,
            text: text.into(),
            kind,
        };
        self.current = Some((message, now + self.timeout));
    }

    pub(crate) fn dismiss(&mut self) {
        if let Some((message, _)) = &mut self.current {
            message.visible = false;
        }
    }

    /// State of the slot at `now`; an expired toast reads as hidden
    pub(crate) fn get(&self, now: Instant) -> Option<ToastMessage> {
        let (message, hide_at) = self.current.as_ref()?;
        let mut message = message.clone();
        if now >= *hide_at {
            message.visible = false;
        }
        Some(message)
    }

    /// Hide the toast once its timeout has passed; true if it just expired
    pub(crate) fn expire(&mut self, now: Instant) -> bool {
        match &mut self.current {
            Some((message, hide_at)) if message.visible && now >= *hide_at => {
                message.visible = false;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toast_hides_after_timeout() {
        let start = Instant::now();
        let mut slot = ToastSlot::new(Duration::from_secs(4));
        slot.show("x", ToastKind::Success, start);

        let shown = slot.get(start).unwrap();
        assert!(shown.visible);
        assert_eq!(shown.text, "x");
        assert_eq!(shown.kind, ToastKind::Success);

        assert!(slot.get(start + Duration::from_millis(3999)).unwrap().visible);
        assert!(!slot.get(start + Duration::from_secs(4)).unwrap().visible);
    }

    #[test]
    fn new_toast_replaces_old_and_restarts_timer() {
        let start = Instant::now();
        let mut slot = ToastSlot::new(Duration::from_secs(4));
        slot.show("first", ToastKind::Success, start);
        slot.show("second", ToastKind::Error, start + Duration::from_secs(3));

        let at = start + Duration::from_secs(5);
        let current = slot.get(at).unwrap();
        assert_eq!(current.text, "second");
        assert_eq!(current.kind, ToastKind::Error);
        assert!(current.visible);
    }

    #[test]
    fn dismiss_hides_immediately() {
        let start = Instant::now();
        let mut slot = ToastSlot::new(Duration::from_secs(4));
        slot.show("x", ToastKind::Error, start);
        slot.dismiss();
        assert!(!slot.get(start).unwrap().visible);
        assert!(!slot.expire(start + Duration::from_secs(10)));
    }

    #[test]
    fn expire_fires_once() {
        let start = Instant::now();
        let mut slot = ToastSlot::new(Duration::from_secs(4));
        assert!(!slot.expire(start));
        slot.show("x", ToastKind::Success, start);
        assert!(!slot.expire(start + Duration::from_secs(1)));
        assert!(slot.expire(start + Duration::from_secs(4)));
        assert!(!slot.expire(start + Duration::from_secs(5)));
    }
}
