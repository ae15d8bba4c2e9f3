use log::LevelFilter;

/// Sets up `env_logger` for the command line tools: info by default, debug
/// with `verbose`. `RUST_LOG` takes precedence over both.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();
}
