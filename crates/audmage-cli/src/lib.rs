//! Shared pieces of the audmage binaries

pub mod output;

/// Initialize logging.
///
/// Default: warnings only, so skipped files are reported on stderr while
/// stdout stays clean JSON. Verbose: Info level progress.
pub fn init_logger(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}
