pub mod commands;
pub mod inference;

/// Default filter when `RUST_LOG` is unset: our warnings only.
const DEFAULT_LOG_FILTER: &str = "llama_client=warn";

/// Initialize the tracing subscriber.
///
/// Logs go to stderr so stdout carries nothing but model output. `RUST_LOG`
/// overrides the default filter; `json` switches to one JSON object per line.
pub fn init_tracing(json: bool) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let builder = fmt::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        eprintln!("tracing already initialized: {e}");
        return;
    }

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        pid = std::process::id(),
        "llama-client starting"
    );
}
