use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "streams_channel=info,streams=info";
const VERBOSE_FILTER: &str = "streams_channel=debug,streams=debug,streams_c=debug";

/// Installs the global subscriber. `RUST_LOG` takes precedence over `verbose`.
pub fn init(verbose: bool) {
    let default_filter = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .compact()
        .init();
}
