use std::sync::OnceLock;

static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// Installs the process logger. Safe to call more than once.
///
/// Apple targets log to unified logging under `com.threepointo.recap`;
/// everywhere else goes to stderr through `tracing-subscriber`, filtered by
/// `RUST_LOG` (default `info`).
pub fn init() {
    LOGGER_INIT.get_or_init(install);
}

#[cfg(target_vendor = "apple")]
fn install() {
    use log::LevelFilter;
    use oslog::OsLogger;

    if let Err(err) = OsLogger::new("com.threepointo.recap")
        .level_filter(LevelFilter::Info)
        .init()
    {
        eprintln!("failed to initialize unified logging: {err}");
    }
}

#[cfg(not(target_vendor = "apple"))]
fn install() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Another logger may already be installed by the host application.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
