use color_eyre::Result;
use controller_link::config::LinkConfig;
use controller_link::controller::{DeviceSession, GilrsBackend};
use controller_link::link::status::render_status;
use controller_link::link::{LinkSnapshot, LiveLink};
use controller_link::outputs::OutputGroup;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;
    let apply_log_level = setup_logging_env();

    let config = setup_config().await?;
    apply_log_level(config.level());
    info!("Starting controller link with {:?}", config);

    let session = match GilrsBackend::new() {
        Ok(backend) => DeviceSession::start(Box::new(backend), config.device),
        Err(e) => {
            warn!("{}, continuing without controller input", e);
            DeviceSession::detached().discover()
        }
    };
    println!("{}", session.status());

    let link = LiveLink::new(session, OutputGroup::new());
    let (stop_tx, stop_rx) = watch::channel(false);
    let (snapshot_tx, snapshot_rx) = watch::channel(LinkSnapshot::default());

    let reporter = tokio::spawn(report_status(snapshot_rx, config.report_interval()));
    let shutdown = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl-C received, stopping link"),
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
        let _ = stop_tx.send(true);
    });

    // The session stays on this task; it is released when run returns
    let ticks = link.run(config.poll_interval(), stop_rx, snapshot_tx).await;

    shutdown.abort();
    let _ = reporter.await;
    info!("Controller link finished after {} ticks", ticks);
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    Ok(())
}

/// Installs the subscriber at `RUST_LOG` or `info`
///
/// Returns a setter for the configured level, which only takes effect when
/// `RUST_LOG` is unset.
fn setup_logging_env() -> impl Fn(Level) {
    let from_env = std::env::var("RUST_LOG").is_ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .with_filter_reloading();
    let handle = builder.reload_handle();
    builder.init();

    move |level: Level| {
        if from_env {
            debug!("RUST_LOG is set, ignoring configured level {}", level);
            return;
        }
        let filter = EnvFilter::default().add_directive(LevelFilter::from_level(level).into());
        if let Err(e) = handle.reload(filter) {
            warn!("Failed to apply log level {}: {}", level, e);
        }
    }
}

async fn setup_config() -> Result<LinkConfig> {
    // An explicit path is used as-is; the default one is created on first run
    if let Some(path) = std::env::args().nth(1).map(PathBuf::from) {
        return LinkConfig::load(&path).await;
    }

    let path = LinkConfig::default_path()?;
    LinkConfig::ensure_default_config(&path).await?;
    Ok(LinkConfig::load_or_default(&path).await)
}

async fn report_status(snapshots: watch::Receiver<LinkSnapshot>, every: Duration) {
    let mut ticker = tokio::time::interval(every);

    loop {
        ticker.tick().await;
        if snapshots.has_changed().is_err() {
            break;
        }
        let snapshot = snapshots.borrow().clone();
        println!("{}", render_status(&snapshot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_replaces_startup_filter() {
        std::env::remove_var("RUST_LOG");
        let apply_log_level = setup_logging_env();
        assert_eq!(LevelFilter::current(), LevelFilter::INFO);

        apply_log_level(Level::WARN);
        assert_eq!(LevelFilter::current(), LevelFilter::WARN);

        apply_log_level(Level::TRACE);
        assert_eq!(LevelFilter::current(), LevelFilter::TRACE);
    }
}
