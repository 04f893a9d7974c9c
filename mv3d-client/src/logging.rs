//! Log output setup.

use std::str::FromStr;

use log::LevelFilter;

/// Environment variable holding the default log level.
pub const LOG_ENV: &str = "MV3D_LOG";

/// Picks the level: an explicit override wins, then [`LOG_ENV`], then `info`.
pub fn level(explicit: Option<LevelFilter>) -> LevelFilter {
    choose_level(explicit, std::env::var(LOG_ENV).ok().as_deref())
}

fn choose_level(explicit: Option<LevelFilter>, env: Option<&str>) -> LevelFilter {
    explicit
        .or_else(|| env.and_then(|value| LevelFilter::from_str(value.trim()).ok()))
        .unwrap_or(LevelFilter::Info)
}

/// Installs the global logger, writing `[time LEVEL target] message` lines to stdout.
pub fn init(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {:<5} {}] {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout())
        .apply()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_level_wins() {
        assert_eq!(level(Some(LevelFilter::Trace)), LevelFilter::Trace);
        assert_eq!(
            choose_level(Some(LevelFilter::Warn), Some("debug")),
            LevelFilter::Warn
        );
    }

    #[test]
    fn environment_is_the_fallback() {
        assert_eq!(choose_level(None, Some("debug")), LevelFilter::Debug);
        assert_eq!(choose_level(None, Some(" TRACE\n")), LevelFilter::Trace);
    }

    #[test]
    fn info_is_the_default() {
        assert_eq!(choose_level(None, None), LevelFilter::Info);
        assert_eq!(choose_level(None, Some("loud")), LevelFilter::Info);
    }
}
