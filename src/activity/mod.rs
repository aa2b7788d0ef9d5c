//! Everything that feeds the watchdog: the recognized activity signals, explicit user commands
//! and the [SessionHandle] producers use to deliver them.

pub mod terminal;

use std::fmt::Display;

use anyhow::{anyhow, Result};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Path fragments that mark a page as part of the admin interface.
pub const ADMIN_PATH_MARKERS: [&str; 2] = ["admin", "custom_admin"];

/// The watchdog only runs on admin pages.
pub fn is_admin_page(path: &str) -> bool {
    ADMIN_PATH_MARKERS.iter().any(|marker| path.contains(marker))
}

/// User or window events that count as the session being in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivitySignal {
    PointerPress,
    PointerMove,
    KeyPress,
    Scroll,
    TouchStart,
    Click,
    WindowFocus,
    WindowBlur,
}

impl ActivitySignal {
    pub const ALL: [ActivitySignal; 8] = [
        ActivitySignal::PointerPress,
        ActivitySignal::PointerMove,
        ActivitySignal::KeyPress,
        ActivitySignal::Scroll,
        ActivitySignal::TouchStart,
        ActivitySignal::Click,
        ActivitySignal::WindowFocus,
        ActivitySignal::WindowBlur,
    ];

    /// Name of the DOM event this signal corresponds to.
    pub fn event_name(&self) -> &'static str {
        match self {
            ActivitySignal::PointerPress => "mousedown",
            ActivitySignal::PointerMove => "mousemove",
            ActivitySignal::KeyPress => "keypress",
            ActivitySignal::Scroll => "scroll",
            ActivitySignal::TouchStart => "touchstart",
            ActivitySignal::Click => "click",
            ActivitySignal::WindowFocus => "focus",
            ActivitySignal::WindowBlur => "blur",
        }
    }

    pub fn from_event_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|signal| signal.event_name() == name)
    }
}

impl Display for ActivitySignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.event_name())
    }
}

/// Input accepted by the watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Passive activity. Re-arms the timers unless the warning is already displayed.
    Activity(ActivitySignal),
    /// "Continue Session" from the warning dialog.
    Acknowledge,
    /// "Logout Now". Leaves immediately.
    Logout,
}

/// Cloneable entry point for anything that produces commands for a running watchdog.
#[derive(Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionCommand>,
    shutdown: CancellationToken,
}

impl SessionHandle {
    pub fn new(sender: mpsc::Sender<SessionCommand>, shutdown: CancellationToken) -> Self {
        Self { sender, shutdown }
    }

    pub async fn signal(&self, signal: ActivitySignal) -> Result<()> {
        self.send(SessionCommand::Activity(signal)).await
    }

    pub async fn acknowledge(&self) -> Result<()> {
        self.send(SessionCommand::Acknowledge).await
    }

    pub async fn logout(&self) -> Result<()> {
        self.send(SessionCommand::Logout).await
    }

    pub async fn send(&self, command: SessionCommand) -> Result<()> {
        self.sender
            .send(command)
            .await
            .map_err(|e| anyhow!("Watchdog is no longer receiving commands: {e}"))
    }

    /// Equivalent of the page unloading. Cancels every pending timer of the watchdog.
    pub fn teardown(&self) {
        self.shutdown.cancel();
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }
}
