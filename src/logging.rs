use tracing_subscriber::{fmt, EnvFilter};

/// Installs a compact stderr subscriber honoring `RUST_LOG`, defaulting to
/// `info`. Intended for binaries and examples embedding this crate; does
/// nothing if a global subscriber is already set.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}
