use anyhow::Result;
use futures::StreamExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_stream::wrappers::LinesStream;
use tracing::{debug, info, warn};

use super::{ActivitySignal, SessionCommand, SessionHandle};

/// Translates a line typed into the terminal into a command. An empty line counts as a key
/// press, DOM event names map to their signal.
pub fn parse_command(line: &str) -> Option<SessionCommand> {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "" => Some(SessionCommand::Activity(ActivitySignal::KeyPress)),
        "c" | "continue" => Some(SessionCommand::Acknowledge),
        "q" | "logout" => Some(SessionCommand::Logout),
        name => ActivitySignal::from_event_name(name).map(SessionCommand::Activity),
    }
}

/// Feeds lines from `input` to the watchdog until the input ends, the watchdog stops listening
/// or the session is torn down. End of input doesn't tear the session down, the timers keep
/// running without further activity.
pub async fn forward_input(input: impl AsyncBufRead + Unpin, handle: SessionHandle) -> Result<()> {
    let mut lines = LinesStream::new(input.lines());
    let shutdown = handle.shutdown_token().clone();

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            line = lines.next() => line,
        };

        let Some(line) = line else {
            info!("Input closed, no more activity will be reported");
            return Ok(());
        };

        match parse_command(&line?) {
            Some(command) => {
                debug!("Forwarding {command:?}");
                if handle.send(command).await.is_err() {
                    debug!("Watchdog stopped, dropping input");
                    return Ok(());
                }
            }
            None => warn!("Unrecognized input ignored"),
        }
    }
}
