use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Treats a termination signal as the page being unloaded. Returns once either the signal arrives
/// or the session ends on its own.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received interrupt, tearing down");
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => (),
    };
}
