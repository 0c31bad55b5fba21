use std::time::Duration;

/// Directory name used under the user's config dir for config and session files
pub(crate) const APP_DIR: &str = "pdam-notify";

/// Default dashboard API host
pub(crate) const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Fixed delay before reopening a dropped stream
pub(crate) const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// How long a toast stays visible before it auto-clears
pub(crate) const TOAST_TIMEOUT: Duration = Duration::from_secs(4);

/// Minimum time the global mark-all spinner is held, avoids flicker
pub(crate) const MIN_SPINNER: Duration = Duration::from_millis(500);

/// Timeout for one-shot API calls (backlog fetch, read marking)
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Poll interval of the event loop while waiting for stream events
pub(crate) const LOOP_TICK: Duration = Duration::from_millis(100);
