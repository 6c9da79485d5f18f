// src/notifier.rs

//! Human-facing failure notifications.
//!
//! Every per-file transform failure raises one notification with a fixed
//! title/message pair; the underlying error text goes to the log. This is the
//! only user-visible error surface for transform failures, so the dev loop
//! stays alive across broken files.

use notify_rust::Notification;
use tracing::{debug, error};

/// Title used for every failure notification.
pub const FAILURE_TITLE: &str = "sitepipe";
/// Message used for every failure notification.
pub const FAILURE_MESSAGE: &str = "a build step failed";

/// Sink for failure notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

/// Notifier that writes to the log at error level.
///
/// The fallback when no desktop channel is reachable, and the sink of choice
/// in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str) {
        error!(title = %title, "{message}");
    }
}

/// Notifier that raises a desktop notification via the platform's
/// notification service. The default sink for the CLI.
///
/// Delivery failure (headless session, no notification daemon) degrades to
/// [`LogNotifier`]; the notification channel itself must never stall or kill
/// the dev loop.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, message: &str) {
        if let Err(err) = Notification::new().summary(title).body(message).show() {
            debug!(error = %err, "desktop notification unavailable; logging instead");
            LogNotifier.notify(title, message);
        }
    }
}
