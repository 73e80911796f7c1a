//! fortest CLI entry point

fn main() {
    // `--verbose` raises our own target to debug unless RUST_LOG says otherwise.
    let verbose = std::env::args().any(|a| a == "-v" || a == "--verbose");
    let default_filter = if verbose { "info,fortest=debug" } else { "info" };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .try_init();

    fortest::cli::run();
}
