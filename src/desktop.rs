//! System-level popup capability.
//!
//! The notification center only sees [`SystemNotifier`]; the concrete
//! notifier is picked once at startup.

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Permission {
    Granted,
    Denied,
}

pub(crate) trait SystemNotifier {
    fn is_supported(&self) -> bool;
    fn request_permission(&mut self) -> Permission;
    fn show(&self, title: &str, body: &str);
}

/// For hosts without any popup mechanism
#[derive(Debug, Default)]
pub(crate) struct NoopNotifier;

impl SystemNotifier for NoopNotifier {
    fn is_supported(&self) -> bool {
        false
    }

    fn request_permission(&mut self) -> Permission {
        Permission::Denied
    }

    fn show(&self, _title: &str, _body: &str) {}
}

/// Rings the terminal bell and writes the popup to stderr
#[cfg(not(feature = "desktop"))]
#[derive(Debug, Default)]
pub(crate) struct TerminalNotifier;

#[cfg(not(feature = "desktop"))]
impl SystemNotifier for TerminalNotifier {
    fn is_supported(&self) -> bool {
        true
    }

    fn request_permission(&mut self) -> Permission {
        Permission::Granted
    }

    fn show(&self, title: &str, body: &str) {
        eprintln!("\x07[notifikasi] {title}: {body}");
    }
}

/// Native desktop notifications (freedesktop, macOS, Windows)
#[cfg(feature = "desktop")]
#[derive(Debug, Default)]
pub(crate) struct DesktopNotifier {
    granted: bool,
}

#[cfg(feature = "desktop")]
impl SystemNotifier for DesktopNotifier {
    fn is_supported(&self) -> bool {
        true
    }

    fn request_permission(&mut self) -> Permission {
        self.granted = true;
        Permission::Granted
    }

    fn show(&self, title: &str, body: &str) {
        if !self.granted {
            return;
        }
        if let Err(e) = notify_rust::Notification::new()
            .summary(title)
            .body(body)
            .appname(crate::consts::APP_DIR)
            .show()
        {
            tracing::warn!(error = %e, "desktop notification failed");
        }
    }
}

/// Pick the notifier for this run
pub(crate) fn select(enabled: bool) -> Box<dyn SystemNotifier> {
    if !enabled {
        debug!("system popups disabled");
        return Box::new(NoopNotifier);
    }
    platform_notifier()
}

#[cfg(feature = "desktop")]
fn platform_notifier() -> Box<dyn SystemNotifier> {
    Box::new(DesktopNotifier::default())
}

#[cfg(not(feature = "desktop"))]
fn platform_notifier() -> Box<dyn SystemNotifier> {
    if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        Box::new(TerminalNotifier)
    } else {
        debug!("stderr is not a terminal, system popups disabled");
        Box::new(NoopNotifier)
    }
}

impl<T: SystemNotifier + ?Sized> SystemNotifier for Box<T> {
    fn is_supported(&self) -> bool {
        (**self).is_supported()
    }

    fn request_permission(&mut self) -> Permission {
        (**self).request_permission()
    }

    fn show(&self, title: &str, body: &str) {
        (**self).show(title, body)
    }
}
