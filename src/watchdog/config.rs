use std::time::Duration;

use anyhow::{bail, Result};

/// Idle time after which the session is treated as expired.
pub const DEFAULT_INACTIVITY_LIMIT: Duration = Duration::from_secs(5 * 60);
/// How long before the inactivity limit the warning dialog shows up.
pub const DEFAULT_WARNING_LEAD: Duration = Duration::from_secs(60);
/// Delay between the expiry notification and the redirect to the login page.
pub const REDIRECT_GRACE: Duration = Duration::from_millis(2000);
/// Period of the cosmetic progress bar inside the warning dialog.
pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);
/// Lifetime of a toast notification before the presenter dismisses it.
pub const NOTIFICATION_LIFETIME: Duration = Duration::from_secs(5);

pub const DEFAULT_LOGIN_PATH: &str = "/admin/login/";
pub const DEFAULT_LOGOUT_PATH: &str = "/admin/logout/";

/// Everything the watchdog needs to know about timing and destinations. Fixed once the watchdog
/// is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutConfig {
    pub inactivity_limit: Duration,
    pub warning_lead: Duration,
    pub redirect_grace: Duration,
    pub progress_interval: Duration,
    pub notification_lifetime: Duration,
    pub login_path: String,
    pub logout_path: String,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            inactivity_limit: DEFAULT_INACTIVITY_LIMIT,
            warning_lead: DEFAULT_WARNING_LEAD,
            redirect_grace: REDIRECT_GRACE,
            progress_interval: PROGRESS_INTERVAL,
            notification_lifetime: NOTIFICATION_LIFETIME,
            login_path: DEFAULT_LOGIN_PATH.into(),
            logout_path: DEFAULT_LOGOUT_PATH.into(),
        }
    }
}

impl TimeoutConfig {
    pub fn with_timings(inactivity_limit: Duration, warning_lead: Duration) -> Self {
        Self {
            inactivity_limit,
            warning_lead,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.warning_lead.is_zero() {
            bail!("Warning lead time must be greater than zero");
        }
        if self.warning_lead >= self.inactivity_limit {
            bail!(
                "Warning lead time {:?} must be shorter than the inactivity limit {:?}",
                self.warning_lead,
                self.inactivity_limit
            );
        }
        if self.progress_interval.is_zero() {
            bail!("Progress interval must be greater than zero");
        }
        Ok(())
    }

    /// Idle time after which the warning fires.
    pub fn warning_delay(&self) -> Duration {
        self.inactivity_limit - self.warning_lead
    }
}
