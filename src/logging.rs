use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "gomoku_term=info,gomoku_adapter=info,gomoku_core=info";
const VERBOSE_FILTER: &str = "gomoku_term=debug,gomoku_adapter=debug,gomoku_core=debug,info";

/// Install the global subscriber. `RUST_LOG` wins over `verbose`.
///
/// Output goes to stderr so the client's stdout stays the game transcript.
pub fn init_logger(verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}
