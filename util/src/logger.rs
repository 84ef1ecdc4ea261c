//! Logger setup
//!
//! Every executable logs through the `log` facade. [`logger_init`] installs a `fern` dispatcher
//! which stamps each line with the seconds since the session started and writes it to stdout and
//! to the session's log file.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use colored::{ColoredString, Colorize};
use log::{info, Level};
use std::fmt::Arguments;
use thiserror::Error;

use crate::session::{self, Session};

pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Dependencies which are capped at `Info` whatever level is chosen.
const QUIET_TARGETS: [&str; 2] = ["serialport", "rustyline"];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("The log level must include INFO messages, found {0}")]
    LevelTooQuiet(LevelFilter),

    #[error("Could not open the log file: {0}")]
    LogFileError(std::io::Error),

    #[error("A logger is already installed: {0}")]
    AlreadyInstalled(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Install the logger for this process.
///
/// State transitions and faults are reported at `Info` and above, so `min_level` may not be
/// quieter than that. Must only be called once.
pub fn logger_init(min_level: LevelFilter, session: &Session) -> Result<(), LoggerInitError> {
    if min_level < Level::Info {
        return Err(LoggerInitError::LevelTooQuiet(min_level));
    }

    let log_file =
        fern::log_file(&session.log_file_path).map_err(LoggerInitError::LogFileError)?;

    QUIET_TARGETS
        .iter()
        .fold(fern::Dispatch::new().level(min_level), |d, target| {
            d.level_for(*target, LevelFilter::Info)
        })
        .format(|out, message, record| {
            let line = format_line(
                session::get_elapsed_seconds(),
                record.level(),
                record.target(),
                message,
            );
            out.finish(format_args!("{}", line))
        })
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::AlreadyInstalled)?;

    info!("Logging initialised at {}", min_level);
    if let Some(epoch) = session::epoch() {
        info!("    Session started: {}", epoch);
    }
    info!("    Log file: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Debug and trace lines also name the module they came from.
fn format_line(elapsed_s: f64, level: Level, target: &str, message: &Arguments) -> String {
    if level > Level::Info {
        format!("[{:10.6} {}] {}: {}", elapsed_s, level_tag(level), target, message)
    } else {
        format!("[{:10.6} {}] {}", elapsed_s, level_tag(level), message)
    }
}

fn level_tag(level: Level) -> ColoredString {
    match level {
        Level::Trace => "TRC".dimmed().italic(),
        Level::Debug => "DBG".dimmed(),
        Level::Info => "INF".normal(),
        Level::Warn => "WRN".yellow(),
        Level::Error => "ERR".red().bold(),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_level_tags() {
        colored::control::set_override(false);

        assert_eq!(level_tag(Level::Info).to_string(), "INF");
        assert_eq!(level_tag(Level::Warn).to_string(), "WRN");
        assert_eq!(level_tag(Level::Error).to_string(), "ERR");
        assert_eq!(level_tag(Level::Trace).to_string(), "TRC");
    }

    #[test]
    fn test_format_line() {
        colored::control::set_override(false);

        assert_eq!(
            format_line(1.5, Level::Info, "arm_lib::state_mgr", &format_args!("hello")),
            "[  1.500000 INF] hello"
        );
        assert_eq!(
            format_line(12.25, Level::Debug, "arm_lib::state_mgr", &format_args!("x = {}", 3)),
            "[ 12.250000 DBG] arm_lib::state_mgr: x = 3"
        );
    }
}
