//! Logging bootstrap.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_DIRECTIVE: &str = "resource_sdk=info";

/// Install the global fmt subscriber; `RUST_LOG` adds to the default directive.
/// Calling it again is a no-op.
pub fn init() {
    let filter = match DEFAULT_DIRECTIVE.parse() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
