//! Capabilities the watchdog uses to talk to the user. The watchdog never renders anything
//! itself: it hands typed [WarningDialog] and [Notification] values to a [Presenter] and
//! destinations to a [Navigator].

pub mod json;
pub mod terminal;

use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

use crate::utils::percentage::Percentage;

#[cfg(test)]
use mockall::automock;

pub const WARNING_DIALOG_ID: &str = "timeoutWarningModal";

/// Contents of the dialog shown before the session expires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WarningDialog {
    pub id: &'static str,
    pub title: &'static str,
    pub body: String,
    pub continue_label: &'static str,
    pub logout_label: &'static str,
    #[serde(rename = "remaining_ms", serialize_with = "serialize_millis")]
    pub remaining: Duration,
}

impl WarningDialog {
    pub fn new(remaining: Duration) -> Self {
        Self {
            id: WARNING_DIALOG_ID,
            title: "Session Timeout Warning",
            body: format!(
                "Your admin session will expire in {} due to inactivity. \
                 Please click \"Continue Session\" to stay logged in, or you will be automatically logged out.",
                describe_duration(remaining)
            ),
            continue_label: "Continue Session",
            logout_label: "Logout Now",
            remaining,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Warning,
}

/// Toast style message. Presenters are expected to dismiss it once `lifetime` passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    #[serde(rename = "lifetime_ms", serialize_with = "serialize_millis")]
    pub lifetime: Duration,
}

impl Notification {
    pub fn new(message: impl Into<String>, kind: NotificationKind, lifetime: Duration) -> Self {
        Self {
            message: message.into(),
            kind,
            lifetime,
        }
    }
}

/// Modal and toast rendering. Errors are reported back so that the caller can log them, they
/// never stop the timers.
#[cfg_attr(test, automock)]
pub trait Presenter {
    fn show_warning(&mut self, dialog: &WarningDialog) -> Result<()>;

    /// Instance lookup. Returns true if a dialog with `id` is currently displayed.
    fn warning_visible(&self, id: &str) -> bool;

    fn hide_warning(&mut self, id: &str) -> Result<()>;

    fn update_progress(&mut self, id: &str, progress: Percentage) -> Result<()>;

    fn notify(&mut self, notification: &Notification) -> Result<()>;
}

/// Leaves the current page.
#[cfg_attr(test, automock)]
pub trait Navigator {
    fn navigate(&mut self, destination: &str) -> Result<()>;
}

/// Human readable form of a duration, e.g. "1 minute" or "2 minutes 30 seconds".
pub fn describe_duration(duration: Duration) -> String {
    fn unit(value: u64, name: &str) -> String {
        if value == 1 {
            format!("{value} {name}")
        } else {
            format!("{value} {name}s")
        }
    }

    let total = duration.as_secs();
    let (minutes, seconds) = (total / 60, total % 60);
    match (minutes, seconds) {
        (0, s) => unit(s, "second"),
        (m, 0) => unit(m, "minute"),
        (m, s) => format!("{} {}", unit(m, "minute"), unit(s, "second")),
    }
}

fn serialize_millis<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(duration.as_millis() as u64)
}
