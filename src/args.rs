use std::{fmt::Display, path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};
use tracing::level_filters::LevelFilter;

use crate::watchdog::config::{
    TimeoutConfig, DEFAULT_INACTIVITY_LIMIT, DEFAULT_LOGIN_PATH, DEFAULT_LOGOUT_PATH,
    DEFAULT_WARNING_LEAD,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputStyle {
    Terminal,
    Json,
}

impl Display for OutputStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputStyle::Terminal => write!(f, "terminal"),
            OutputStyle::Json => write!(f, "json"),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "admin-timeout", version, long_about = None)]
#[command(about = "Warns about and ends idle admin sessions")]
pub struct Args {
    #[arg(
        long,
        default_value = "/admin/",
        help = "Path of the current page. The watchdog only starts on admin pages"
    )]
    pub path: String,
    #[arg(
        long = "inactivity-limit",
        default_value_t = DEFAULT_INACTIVITY_LIMIT.as_secs(),
        help = "Seconds of inactivity after which the session expires"
    )]
    pub inactivity_limit_secs: u64,
    #[arg(
        long = "warning-lead",
        default_value_t = DEFAULT_WARNING_LEAD.as_secs(),
        help = "Seconds before expiry at which the warning is shown"
    )]
    pub warning_lead_secs: u64,
    #[arg(long, default_value = DEFAULT_LOGIN_PATH)]
    pub login_path: String,
    #[arg(long, default_value = DEFAULT_LOGOUT_PATH)]
    pub logout_path: String,
    #[arg(long, default_value_t = OutputStyle::Terminal, help = "How the warning and notifications are rendered")]
    pub output: OutputStyle,
    #[arg(long = "no-color")]
    pub no_color: bool,
    #[arg(
        long,
        help = "Application directory. By default logs go into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    pub dir: Option<PathBuf>,
    /// This option is for debugging purposes only.
    #[arg(long = "log-console")]
    pub log_console: bool,
    #[arg(long = "log-filter")]
    pub log: Option<LevelFilter>,
}

impl Args {
    pub fn timeout_config(&self) -> TimeoutConfig {
        TimeoutConfig {
            login_path: self.login_path.clone(),
            logout_path: self.logout_path.clone(),
            ..TimeoutConfig::with_timings(
                Duration::from_secs(self.inactivity_limit_secs),
                Duration::from_secs(self.warning_lead_secs),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clap::Parser;

    use crate::watchdog::config::TimeoutConfig;

    use super::{Args, OutputStyle};

    #[test]
    fn defaults_match_admin_timings() {
        let args = Args::parse_from(["admin-timeout"]);
        assert_eq!(args.path, "/admin/");
        assert_eq!(args.output, OutputStyle::Terminal);
        assert_eq!(args.timeout_config(), TimeoutConfig::default());
    }

    #[test]
    fn overrides_timings_and_destinations() {
        let args = Args::parse_from([
            "admin-timeout",
            "--inactivity-limit",
            "120",
            "--warning-lead",
            "30",
            "--login-path",
            "/myapp/admin-login/",
            "--output",
            "json",
        ]);
        let config = args.timeout_config();
        assert_eq!(config.inactivity_limit, Duration::from_secs(120));
        assert_eq!(config.warning_lead, Duration::from_secs(30));
        assert_eq!(config.login_path, "/myapp/admin-login/");
        assert_eq!(config.logout_path, "/admin/logout/");
        assert_eq!(args.output, OutputStyle::Json);
    }
}
