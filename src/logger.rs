use log::{LevelFilter, Log, Metadata, Record};
use std::io::Write;
use std::str::FromStr;

pub const LOG_ENV: &str = "SPLICE_LOG";

/// Writes `[LEVEL target] message` lines to stderr.
struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "[{:<5} {}] {}", record.level(), record.target(), record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// `-v` count wins; otherwise `SPLICE_LOG` (`error`..`trace`, `off`); otherwise warnings.
pub fn level_for(verbose: u8, env: Option<&str>) -> LevelFilter {
    match verbose {
        0 => env
            .and_then(|value| LevelFilter::from_str(value.trim()).ok())
            .unwrap_or(LevelFilter::Warn),
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

pub fn init(verbose: u8) {
    let env = std::env::var(LOG_ENV).ok();
    let level = level_for(verbose, env.as_deref());
    if log::set_boxed_logger(Box::new(StderrLogger { level })).is_ok() {
        log::set_max_level(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_overrides_environment() {
        assert_eq!(level_for(0, None), LevelFilter::Warn);
        assert_eq!(level_for(0, Some("debug")), LevelFilter::Debug);
        assert_eq!(level_for(0, Some("nonsense")), LevelFilter::Warn);
        assert_eq!(level_for(1, Some("off")), LevelFilter::Info);
        assert_eq!(level_for(5, None), LevelFilter::Trace);
    }
}
