use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "coderefine=info";

static INIT_LOGGER: OnceLock<()> = OnceLock::new();

/// Install the stderr subscriber. Safe to call more than once.
///
/// `verbose` raises the default level to debug; an explicit `RUST_LOG` wins.
pub fn init(verbose: bool) {
    INIT_LOGGER.get_or_init(|| {
        let default = if verbose {
            "coderefine=debug"
        } else {
            DEFAULT_FILTER
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
