use std::future;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::{
    activity::SessionCommand,
    presentation::{Navigator, Presenter},
    utils::clock::Clock,
};

use super::{SessionEnd, Watchdog};

/// Drives a [Watchdog]: sleeps until the next pending deadline, forwards commands and reacts to
/// teardown.
pub struct WatchdogModule<P, N> {
    watchdog: Watchdog<P, N>,
    commands: mpsc::Receiver<SessionCommand>,
    shutdown: CancellationToken,
    time_provider: Box<dyn Clock>,
}

impl<P: Presenter, N: Navigator> WatchdogModule<P, N> {
    pub fn new(
        watchdog: Watchdog<P, N>,
        commands: mpsc::Receiver<SessionCommand>,
        shutdown: CancellationToken,
        time_provider: Box<dyn Clock>,
    ) -> Self {
        Self {
            watchdog,
            commands,
            shutdown,
            time_provider,
        }
    }

    /// Arms the watchdog and runs its event loop until it navigates away or gets torn down.
    /// Cancels the shutdown token on the way out so that sibling tasks stop as well.
    #[instrument(name = "watchdog", skip_all)]
    pub async fn run(mut self) -> Result<SessionEnd> {
        self.watchdog.arm(self.time_provider.instant());
        info!(
            "Watchdog armed, limit {:?}, warning {:?} before expiry",
            self.watchdog.config().inactivity_limit,
            self.watchdog.config().warning_lead
        );

        let mut commands_open = true;
        while !self.watchdog.is_terminated() {
            let deadline = self.watchdog.next_deadline();
            let clock = &self.time_provider;
            let next_deadline = async move {
                match deadline {
                    Some(deadline) => clock.sleep_until(deadline).await,
                    None => future::pending().await,
                }
            };

            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    self.watchdog.teardown();
                }
                command = self.commands.recv(), if commands_open => match command {
                    Some(command) => {
                        debug!("Received {command:?}");
                        let now = self.time_provider.instant();
                        // Deadlines that passed while the command was queued fire first, the
                        // command then sees the state they produced.
                        self.watchdog.fire_due(now);
                        self.watchdog.handle(now, command);
                    }
                    None => {
                        // Nobody can report activity anymore, only the timers are left.
                        debug!("Command channel closed");
                        commands_open = false;
                    }
                },
                _ = next_deadline => {
                    self.watchdog.fire_due(self.time_provider.instant());
                }
            }
        }

        let end = self.watchdog.end().unwrap_or(SessionEnd::TornDown);
        info!("Watchdog stopped, session {end}");
        self.commands.close();
        self.shutdown.cancel();
        Ok(end)
    }
}
