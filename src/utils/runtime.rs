use anyhow::Result;

/// The watchdog is a single threaded, event driven component, so this is the only runtime the
/// binary needs.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
