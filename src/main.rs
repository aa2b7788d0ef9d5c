use admin_timeout::{
    args::Args,
    session::start_session,
    utils::{
        dir::create_application_default_path,
        logging::{enable_logging, LOG_PREFIX},
        runtime::single_thread_runtime,
    },
};
use anyhow::Result;
use clap::Parser;
use tracing::error;

fn main() -> Result<()> {
    let args = Args::parse();

    let app_dir = args.dir.clone().map_or_else(create_application_default_path, Ok)?;
    enable_logging(LOG_PREFIX, &app_dir.join("logs"), args.log, args.log_console)?;

    let runtime = single_thread_runtime()?;
    let result = runtime.block_on(start_session(args));
    // A pending stdin read would otherwise keep the process alive until the next line.
    runtime.shutdown_background();

    match result.inspect_err(|e| error!("Error running watchdog {e:?}"))? {
        Some(end) => println!("Session {end}"),
        None => println!("Not an admin page, watchdog inactive"),
    }
    Ok(())
}
