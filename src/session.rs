//! Wires a watchdog to its collaborators for the terminal binary: stdin is the activity source,
//! stdout hosts the presenter and the navigator.

use std::io;

use anyhow::Result;
use tokio::{
    io::{AsyncBufRead, BufReader},
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    activity::{is_admin_page, terminal::forward_input, SessionHandle},
    args::{Args, OutputStyle},
    presentation::{
        json::{JsonLinesNavigator, JsonLinesPresenter},
        terminal::{TerminalNavigator, TerminalPresenter},
        Navigator, Presenter,
    },
    utils::clock::DefaultClock,
    watchdog::{
        config::TimeoutConfig, module::WatchdogModule, shutdown::detect_shutdown, SessionEnd,
        Watchdog,
    },
};

const COMMAND_BUFFER: usize = 32;

/// Starts the watchdog for the page given in `args`. Returns `None` without doing anything if the
/// page is not part of the admin interface.
pub async fn start_session(args: Args) -> Result<Option<SessionEnd>> {
    if !is_admin_page(&args.path) {
        info!("{} is not an admin page, watchdog stays inactive", args.path);
        return Ok(None);
    }

    let config = args.timeout_config();
    config.validate()?;

    let input = BufReader::new(tokio::io::stdin());
    let end = match args.output {
        OutputStyle::Terminal => {
            println!(
                "Watching {} for inactivity. Press Enter to report activity, type an event name \
                 (mousemove, scroll, ...) to simulate one, 'c' to continue the session, 'q' to log out.",
                args.path
            );
            let presenter =
                TerminalPresenter::new(io::stdout(), Box::new(DefaultClock), !args.no_color);
            let navigator = TerminalNavigator::new(io::stdout());
            run_watchdog(config, presenter, navigator, input).await?
        }
        OutputStyle::Json => {
            let presenter = JsonLinesPresenter::new(io::stdout(), Box::new(DefaultClock));
            let navigator = JsonLinesNavigator::new(io::stdout(), Box::new(DefaultClock));
            run_watchdog(config, presenter, navigator, input).await?
        }
    };
    Ok(Some(end))
}

/// Runs the watchdog together with the input pump and the interrupt listener. All three stop
/// once the watchdog does.
pub async fn run_watchdog<P: Presenter, N: Navigator>(
    config: TimeoutConfig,
    presenter: P,
    navigator: N,
    input: impl AsyncBufRead + Unpin,
) -> Result<SessionEnd> {
    let (sender, receiver) = mpsc::channel(COMMAND_BUFFER);
    let shutdown = CancellationToken::new();
    let handle = SessionHandle::new(sender, shutdown.clone());

    let watchdog = Watchdog::new(config, presenter, navigator);
    let module = WatchdogModule::new(watchdog, receiver, shutdown.clone(), Box::new(DefaultClock));

    let (_, input_result, end) = tokio::join!(
        detect_shutdown(shutdown),
        forward_input(input, handle),
        module.run(),
    );

    if let Err(input_result) = input_result {
        error!("Reading input failed {:?}", input_result);
    }

    end
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::Result;
    use clap::Parser;
    use tokio::io::BufReader;

    use crate::{
        args::Args,
        presentation::{MockNavigator, MockPresenter},
        utils::logging::TEST_LOGGING,
        watchdog::{config::TimeoutConfig, SessionEnd},
    };

    use super::{run_watchdog, start_session};

    fn quiet_presenter() -> MockPresenter {
        let mut presenter = MockPresenter::new();
        presenter.expect_warning_visible().return_const(false);
        presenter.expect_show_warning().returning(|_| Ok(()));
        presenter.expect_hide_warning().returning(|_| Ok(()));
        presenter.expect_update_progress().returning(|_, _| Ok(()));
        presenter.expect_notify().returning(|_| Ok(()));
        presenter
    }

    #[tokio::test]
    async fn skips_non_admin_pages() -> Result<()> {
        *TEST_LOGGING;
        let args = Args::parse_from(["admin-timeout", "--path", "/dashboard/"]);
        assert_eq!(start_session(args).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn rejects_invalid_timings() {
        let args = Args::parse_from([
            "admin-timeout",
            "--inactivity-limit",
            "60",
            "--warning-lead",
            "60",
        ]);
        assert!(start_session(args).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn logout_from_input() -> Result<()> {
        *TEST_LOGGING;
        let mut navigator = MockNavigator::new();
        navigator
            .expect_navigate()
            .withf(|destination| destination == "/admin/logout/")
            .times(1)
            .returning(|_| Ok(()));

        let input = BufReader::new("mousemove\nscroll\nq\n".as_bytes());
        let end = run_watchdog(TimeoutConfig::default(), quiet_presenter(), navigator, input).await?;
        assert_eq!(end, SessionEnd::LoggedOut);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_after_input_ends() -> Result<()> {
        *TEST_LOGGING;
        let mut navigator = MockNavigator::new();
        navigator
            .expect_navigate()
            .withf(|destination| destination == "/admin/login/")
            .times(1)
            .returning(|_| Ok(()));

        let config = TimeoutConfig::with_timings(Duration::from_secs(10), Duration::from_secs(5));
        let start = tokio::time::Instant::now();
        let end = run_watchdog(config, quiet_presenter(), navigator, BufReader::new(&b""[..])).await?;

        assert_eq!(end, SessionEnd::TimedOut);
        assert_eq!(start.elapsed(), Duration::from_secs(12));
        Ok(())
    }
}
