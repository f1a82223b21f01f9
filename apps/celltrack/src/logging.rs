//! `env_logger` setup shared by the binaries.

use env_logger::Env;

/// Default filter for a `-v` count: warn, info, debug, trace.
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Initialise logging.  `RUST_LOG`, when set, overrides the `-v` count.
pub fn init_logging(verbosity: u8) {
    let env = Env::default().default_filter_or(default_filter(verbosity));
    // A second initialisation (tests) is harmless.
    let _ = env_logger::Builder::from_env(env).format_timestamp_millis().try_init();
}
