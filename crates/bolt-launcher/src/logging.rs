use tracing_subscriber::EnvFilter;

pub const ENV_LOG: &str = "BOLT_LOG";

/// Installs a stderr `fmt` subscriber filtered by `BOLT_LOG` (default
/// `info`). Safe to call more than once; later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
