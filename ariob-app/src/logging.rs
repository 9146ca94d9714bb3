use tracing_subscriber::EnvFilter;

/// Installs the global `fmt` subscriber.
///
/// `filter` wins when given; otherwise `RUST_LOG`, otherwise `info`.
/// Returns `false` if a subscriber was already installed.
pub fn init_tracing(filter: Option<&str>) -> bool {
    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .is_ok()
}
