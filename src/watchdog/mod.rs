//! The inactivity watchdog. [Watchdog] is a plain state machine over a handful of [Timer]s and
//! is driven by [module::WatchdogModule], which sleeps until the next deadline and feeds it
//! commands.
//!
//! ```text
//! Idle --activity--> Idle (re-armed)
//! Idle --warning deadline--> Warning
//! Warning --acknowledge--> Idle (re-armed)
//! Warning --expiry deadline--> Expired --grace--> Terminated
//! any --logout--> Terminated (immediate)
//! any --teardown--> Terminated
//! ```

pub mod config;
pub mod module;
pub mod progress;
pub mod shutdown;
pub mod timer;

use std::fmt::Display;

use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

use crate::{
    activity::{ActivitySignal, SessionCommand},
    presentation::{
        Navigator, Notification, NotificationKind, Presenter, WarningDialog, WARNING_DIALOG_ID,
    },
};

use config::TimeoutConfig;
use progress::ProgressTicker;
use timer::Timer;

pub const SESSION_EXTENDED_MESSAGE: &str = "Session extended!";
pub const SESSION_EXPIRED_MESSAGE: &str =
    "Session expired due to inactivity. Redirecting to login...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Timers are armed, nothing is displayed.
    Idle,
    /// The warning dialog is displayed, expiry is still pending.
    Warning,
    /// Expiry fired, the redirect to the login page is pending.
    Expired,
    /// Navigation happened or the page was torn down. Nothing is pending.
    Terminated,
}

/// Reason the watchdog stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    TornDown,
    LoggedOut,
    TimedOut,
}

impl Display for SessionEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionEnd::TornDown => write!(f, "torn down"),
            SessionEnd::LoggedOut => write!(f, "logged out"),
            SessionEnd::TimedOut => write!(f, "timed out"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryReason {
    /// The user chose to log out. Navigation to the logout path (`/admin/logout/` by default) is
    /// immediate, the server ends the session there and lands on the login page.
    Manual,
    /// The expiry deadline passed. Navigation waits for the grace period.
    Timeout,
}

/// Owns the warning, expiry and redirect timers. At most one of each is pending at any time.
pub struct Watchdog<P, N> {
    config: TimeoutConfig,
    state: SessionState,
    end: Option<SessionEnd>,
    warning: Timer,
    expiry: Timer,
    redirect: Timer,
    progress: Option<ProgressTicker>,
    presenter: P,
    navigator: N,
}

impl<P: Presenter, N: Navigator> Watchdog<P, N> {
    /// Creates an unarmed watchdog. Call [Watchdog::arm] to start the first cycle.
    pub fn new(config: TimeoutConfig, presenter: P, navigator: N) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            end: None,
            warning: Timer::default(),
            expiry: Timer::default(),
            redirect: Timer::default(),
            progress: None,
            presenter,
            navigator,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn end(&self) -> Option<SessionEnd> {
        self.end
    }

    pub fn is_terminated(&self) -> bool {
        self.state == SessionState::Terminated
    }

    pub fn config(&self) -> &TimeoutConfig {
        &self.config
    }

    /// Cancels both pending timers and schedules a fresh cycle relative to `now`.
    pub fn arm(&mut self, now: Instant) {
        if self.is_terminated() {
            return;
        }
        self.warning.cancel();
        self.expiry.cancel();

        self.warning.schedule(now + self.config.warning_delay());
        self.expiry.schedule(now + self.config.inactivity_limit);
        self.state = SessionState::Idle;
        trace!("Timers re-armed");
    }

    /// Passive activity only counts while nothing is displayed. Once the warning is up the user
    /// has to pick one of the dialog actions.
    pub fn on_activity_signal(&mut self, now: Instant, signal: ActivitySignal) {
        match self.state {
            SessionState::Idle => {
                trace!("Activity {signal}");
                self.arm(now);
            }
            SessionState::Warning => trace!("Ignoring {signal} while the warning is displayed"),
            SessionState::Expired | SessionState::Terminated => {
                trace!("Ignoring {signal}, session is over")
            }
        }
    }

    /// "Continue Session". Dismisses the warning if it is displayed and restarts the full cycle.
    pub fn acknowledge(&mut self, now: Instant) {
        match self.state {
            SessionState::Expired | SessionState::Terminated => {
                warn!("Session can't be extended after it expired");
                return;
            }
            SessionState::Idle | SessionState::Warning => {}
        }

        self.dismiss_warning();
        self.arm(now);
        info!("Session extended");

        let notification = Notification::new(
            SESSION_EXTENDED_MESSAGE,
            NotificationKind::Success,
            self.config.notification_lifetime,
        );
        self.notify(&notification);
    }

    pub fn expire_now(&mut self, now: Instant, reason: ExpiryReason) {
        if self.is_terminated() {
            return;
        }
        match reason {
            ExpiryReason::Manual => {
                info!("Logging out on request");
                let destination = self.config.logout_path.clone();
                self.leave(&destination, SessionEnd::LoggedOut);
            }
            ExpiryReason::Timeout => {
                if self.state == SessionState::Expired {
                    return;
                }
                info!("Session expired due to inactivity");
                self.warning.cancel();
                self.expiry.cancel();
                self.state = SessionState::Expired;

                let notification = Notification::new(
                    SESSION_EXPIRED_MESSAGE,
                    NotificationKind::Warning,
                    self.config.notification_lifetime,
                );
                self.notify(&notification);
                self.redirect.schedule(now + self.config.redirect_grace);
            }
        }
    }

    /// The page is going away. Leaves nothing pending.
    pub fn teardown(&mut self) {
        if self.is_terminated() {
            return;
        }
        debug!("Tearing down watchdog in state {:?}", self.state);
        self.cancel_all();
        self.state = SessionState::Terminated;
        self.end = Some(SessionEnd::TornDown);
    }

    pub fn handle(&mut self, now: Instant, command: SessionCommand) {
        match command {
            SessionCommand::Activity(signal) => self.on_activity_signal(now, signal),
            SessionCommand::Acknowledge => self.acknowledge(now),
            SessionCommand::Logout => self.expire_now(now, ExpiryReason::Manual),
        }
    }

    /// Earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.warning.deadline(),
            self.progress.as_ref().and_then(ProgressTicker::deadline),
            self.expiry.deadline(),
            self.redirect.deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Runs every callback whose deadline is at or before `now`, oldest first. Ties are resolved
    /// as warning, progress, expiry, redirect.
    pub fn fire_due(&mut self, now: Instant) {
        while let Some(deadline) = self.next_deadline().filter(|deadline| *deadline <= now) {
            if self.warning.is_due(deadline) {
                self.warning.cancel();
                self.show_warning(deadline);
            } else if self
                .progress
                .as_ref()
                .and_then(ProgressTicker::deadline)
                .is_some_and(|tick| tick <= deadline)
            {
                self.advance_progress(deadline);
            } else if self.expiry.fire_if_due(deadline) {
                self.expire_now(deadline, ExpiryReason::Timeout);
            } else if self.redirect.fire_if_due(deadline) {
                let destination = self.config.login_path.clone();
                self.leave(&destination, SessionEnd::TimedOut);
            } else {
                break;
            }
        }
    }

    fn show_warning(&mut self, now: Instant) {
        if self.state != SessionState::Idle {
            return;
        }
        info!("Session is about to expire, showing warning");
        self.state = SessionState::Warning;

        if self.presenter.warning_visible(WARNING_DIALOG_ID) {
            self.dismiss_warning();
        }
        let dialog = WarningDialog::new(self.config.warning_lead);
        if let Err(e) = self.presenter.show_warning(&dialog) {
            error!("Failed to show the timeout warning {e:?}");
        }
        self.progress = Some(ProgressTicker::start(
            now,
            self.config.progress_interval,
            self.config.warning_lead,
        ));
    }

    fn advance_progress(&mut self, now: Instant) {
        let Some(ticker) = self.progress.as_mut() else {
            return;
        };
        let progress = ticker.tick(now);
        if ticker.is_finished() {
            self.progress = None;
        }
        if let Some(progress) = progress {
            if let Err(e) = self.presenter.update_progress(WARNING_DIALOG_ID, progress) {
                debug!("Failed to update progress {e:?}");
            }
        }
    }

    fn dismiss_warning(&mut self) {
        self.progress = None;
        if !self.presenter.warning_visible(WARNING_DIALOG_ID) {
            return;
        }
        if let Err(e) = self.presenter.hide_warning(WARNING_DIALOG_ID) {
            error!("Failed to hide the timeout warning {e:?}");
        }
    }

    fn notify(&mut self, notification: &Notification) {
        if let Err(e) = self.presenter.notify(notification) {
            error!("Failed to show notification {e:?}");
        }
    }

    fn leave(&mut self, destination: &str, end: SessionEnd) {
        info!("Navigating to {destination}");
        if let Err(e) = self.navigator.navigate(destination) {
            error!("Failed to navigate to {destination} {e:?}");
        }
        self.cancel_all();
        self.state = SessionState::Terminated;
        self.end = Some(end);
    }

    fn cancel_all(&mut self) {
        self.warning.cancel();
        self.expiry.cancel();
        self.redirect.cancel();
        self.progress = None;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::anyhow;
    use mockall::Sequence;
    use tokio::time::Instant;

    use crate::{
        activity::{ActivitySignal, SessionCommand},
        presentation::{MockNavigator, MockPresenter, NotificationKind, WARNING_DIALOG_ID},
    };

    use super::{config::TimeoutConfig, ExpiryReason, SessionEnd, SessionState, Watchdog};

    const LIMIT: Duration = Duration::from_secs(300);
    const LEAD: Duration = Duration::from_secs(60);

    fn config() -> TimeoutConfig {
        TimeoutConfig::with_timings(LIMIT, LEAD)
    }

    fn quiet_presenter() -> MockPresenter {
        let mut presenter = MockPresenter::new();
        presenter.expect_warning_visible().return_const(false);
        presenter.expect_show_warning().returning(|_| Ok(()));
        presenter.expect_hide_warning().returning(|_| Ok(()));
        presenter.expect_update_progress().returning(|_, _| Ok(()));
        presenter.expect_notify().returning(|_| Ok(()));
        presenter
    }

    #[test]
    fn arm_schedules_warning_before_expiry() {
        let start = Instant::now();
        let mut watchdog = Watchdog::new(config(), quiet_presenter(), MockNavigator::new());
        assert_eq!(watchdog.next_deadline(), None);

        watchdog.arm(start);
        assert_eq!(watchdog.next_deadline(), Some(start + LIMIT - LEAD));
        assert_eq!(watchdog.state(), SessionState::Idle);
    }

    #[test]
    fn activity_moves_deadline() {
        let start = Instant::now();
        let mut watchdog = Watchdog::new(config(), quiet_presenter(), MockNavigator::new());
        watchdog.arm(start);

        let later = start + Duration::from_secs(100);
        watchdog.handle(later, SessionCommand::Activity(ActivitySignal::Click));
        watchdog.fire_due(start + LIMIT - LEAD);

        assert_eq!(watchdog.state(), SessionState::Idle);
        assert_eq!(watchdog.next_deadline(), Some(later + LIMIT - LEAD));
    }

    #[test]
    fn activity_during_warning_is_ignored() {
        let start = Instant::now();
        let mut watchdog = Watchdog::new(config(), quiet_presenter(), MockNavigator::new());
        watchdog.arm(start);

        let warning_at = start + LIMIT - LEAD;
        watchdog.fire_due(warning_at);
        assert_eq!(watchdog.state(), SessionState::Warning);

        watchdog.on_activity_signal(warning_at + Duration::from_secs(5), ActivitySignal::PointerMove);
        assert_eq!(watchdog.state(), SessionState::Warning);

        // Progress ticks keep the loop busy, the expiry deadline is untouched.
        watchdog.fire_due(start + LIMIT - Duration::from_millis(1));
        assert_eq!(watchdog.state(), SessionState::Warning);
        watchdog.fire_due(start + LIMIT);
        assert_eq!(watchdog.state(), SessionState::Expired);
    }

    #[test]
    fn timeout_redirects_to_login_after_grace() {
        let start = Instant::now();
        let mut presenter = MockPresenter::new();
        presenter.expect_warning_visible().return_const(false);
        presenter.expect_update_progress().returning(|_, _| Ok(()));

        let mut sequence = Sequence::new();
        presenter
            .expect_show_warning()
            .withf(|dialog| dialog.body.contains("1 minute"))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));
        presenter
            .expect_notify()
            .withf(|n| n.kind == NotificationKind::Warning)
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));

        let mut navigator = MockNavigator::new();
        navigator
            .expect_navigate()
            .withf(|destination| destination == "/admin/login/")
            .times(1)
            .returning(|_| Ok(()));

        let mut watchdog = Watchdog::new(config(), presenter, navigator);
        watchdog.arm(start);
        watchdog.fire_due(start + LIMIT);
        assert_eq!(watchdog.state(), SessionState::Expired);

        watchdog.fire_due(start + LIMIT + Duration::from_millis(1999));
        assert_eq!(watchdog.state(), SessionState::Expired);

        watchdog.fire_due(start + LIMIT + Duration::from_millis(2000));
        assert_eq!(watchdog.state(), SessionState::Terminated);
        assert_eq!(watchdog.end(), Some(SessionEnd::TimedOut));
        assert_eq!(watchdog.next_deadline(), None);
    }

    #[test]
    fn acknowledge_hides_visible_warning() {
        let start = Instant::now();
        let mut presenter = MockPresenter::new();
        presenter.expect_show_warning().returning(|_| Ok(()));
        presenter.expect_update_progress().returning(|_, _| Ok(()));
        presenter
            .expect_warning_visible()
            .withf(|id| id == WARNING_DIALOG_ID)
            .return_const(true);
        presenter
            .expect_hide_warning()
            .withf(|id| id == WARNING_DIALOG_ID)
            .times(2)
            .returning(|_| Ok(()));
        presenter
            .expect_notify()
            .withf(|n| n.kind == NotificationKind::Success && n.message == "Session extended!")
            .times(1)
            .returning(|_| Ok(()));

        let mut watchdog = Watchdog::new(config(), presenter, MockNavigator::new());
        watchdog.arm(start);
        // The stale dialog reported by the lookup is removed before the new one is shown.
        watchdog.fire_due(start + LIMIT - LEAD);

        let ack = start + LIMIT - LEAD + Duration::from_secs(1);
        watchdog.acknowledge(ack);
        assert_eq!(watchdog.state(), SessionState::Idle);
        assert_eq!(watchdog.next_deadline(), Some(ack + LIMIT - LEAD));
    }

    #[test]
    fn acknowledge_without_dialog_skips_hide() {
        let start = Instant::now();
        let mut presenter = MockPresenter::new();
        presenter.expect_warning_visible().return_const(false);
        presenter.expect_hide_warning().never();
        presenter.expect_notify().times(1).returning(|_| Ok(()));

        let mut watchdog = Watchdog::new(config(), presenter, MockNavigator::new());
        watchdog.arm(start);
        watchdog.acknowledge(start + Duration::from_secs(10));
        assert_eq!(watchdog.state(), SessionState::Idle);
    }

    #[test]
    fn logout_navigates_immediately() {
        let start = Instant::now();
        let mut navigator = MockNavigator::new();
        navigator
            .expect_navigate()
            .withf(|destination| destination == "/admin/logout/")
            .times(1)
            .returning(|_| Ok(()));

        let mut watchdog = Watchdog::new(config(), quiet_presenter(), navigator);
        watchdog.arm(start);
        watchdog.fire_due(start + LIMIT);
        assert_eq!(watchdog.state(), SessionState::Expired);

        watchdog.expire_now(start + LIMIT + Duration::from_millis(500), ExpiryReason::Manual);
        assert_eq!(watchdog.end(), Some(SessionEnd::LoggedOut));
        assert_eq!(watchdog.next_deadline(), None);
    }

    #[test]
    fn rendering_failures_do_not_stop_expiry() {
        let start = Instant::now();
        let mut presenter = MockPresenter::new();
        presenter.expect_warning_visible().return_const(false);
        presenter
            .expect_show_warning()
            .returning(|_| Err(anyhow!("no modal library")));
        presenter
            .expect_update_progress()
            .returning(|_, _| Err(anyhow!("no progress bar")));
        presenter
            .expect_notify()
            .returning(|_| Err(anyhow!("no toast container")));

        let mut navigator = MockNavigator::new();
        navigator
            .expect_navigate()
            .times(1)
            .returning(|_| Err(anyhow!("navigation blocked")));

        let mut watchdog = Watchdog::new(config(), presenter, navigator);
        watchdog.arm(start);
        watchdog.fire_due(start + LIMIT + Duration::from_secs(2));

        assert_eq!(watchdog.state(), SessionState::Terminated);
        assert_eq!(watchdog.end(), Some(SessionEnd::TimedOut));
    }

    #[test]
    fn teardown_cancels_everything() {
        let start = Instant::now();
        let mut watchdog = Watchdog::new(config(), quiet_presenter(), MockNavigator::new());
        watchdog.arm(start);
        watchdog.fire_due(start + LIMIT - LEAD);

        watchdog.teardown();
        watchdog.teardown();
        assert_eq!(watchdog.next_deadline(), None);
        assert_eq!(watchdog.end(), Some(SessionEnd::TornDown));

        // Nothing fires and nothing re-arms after teardown.
        watchdog.fire_due(start + LIMIT * 2);
        watchdog.arm(start + LIMIT * 2);
        assert_eq!(watchdog.next_deadline(), None);
    }

    #[test]
    fn teardown_during_grace_cancels_redirect() {
        let start = Instant::now();
        let mut navigator = MockNavigator::new();
        navigator.expect_navigate().never();
        let mut watchdog = Watchdog::new(config(), quiet_presenter(), navigator);
        watchdog.arm(start);
        watchdog.fire_due(start + LIMIT + Duration::from_millis(500));
        assert_eq!(watchdog.state(), SessionState::Expired);

        watchdog.teardown();
        assert_eq!(watchdog.next_deadline(), None);
        assert_eq!(watchdog.end(), Some(SessionEnd::TornDown));

        watchdog.fire_due(start + LIMIT + Duration::from_secs(3));
        assert_eq!(watchdog.state(), SessionState::Terminated);
    }

    #[test]
    fn elapsed_expiry_fires_before_late_activity() {
        let start = Instant::now();
        let mut watchdog = Watchdog::new(config(), quiet_presenter(), MockNavigator::new());
        watchdog.arm(start);

        // What the driver does when a command arrives after the deadlines have passed.
        let now = start + LIMIT + Duration::from_millis(100);
        watchdog.fire_due(now);
        watchdog.handle(now, SessionCommand::Activity(ActivitySignal::KeyPress));

        assert_eq!(watchdog.state(), SessionState::Expired);
        assert_eq!(
            watchdog.next_deadline(),
            Some(start + LIMIT + config().redirect_grace)
        );
    }
}
