use tracing_subscriber::filter::LevelFilter;

/// Install a stderr subscriber. `log` records are bridged into it, at
/// debug level only when `debug` is set.
pub fn init(debug: bool) {
    let level = if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
