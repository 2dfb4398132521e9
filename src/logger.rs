use colored::{Color, ColoredString, Colorize};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};

struct LoggerState {
    level: LevelFilter,
    output: Box<dyn Write + Send>,
    /// Messages held back until the configured level is known. `None` once
    /// they've been flushed.
    deferred: Option<Vec<(Level, ColoredString)>>,
}

/**
 * Colored stderr logger.
 *
 * Logging starts before the config files have been read, so until
 * `print_deferred` is called every message is kept and only the ones that
 * pass the final level get printed. Lines carry the pid, after the fork both
 * the supervisor and the jailed process log to the same terminal.
 */
pub struct JailLogger {
    state: Mutex<LoggerState>,
}

impl JailLogger {
    pub fn new(level: LevelFilter) -> &'static Self {
        Box::leak(Box::new(Self {
            state: Mutex::new(LoggerState {
                level,
                output: Box::new(io::stderr()),
                deferred: Some(Vec::new()),
            }),
        }))
    }

    pub fn init(&'static self) -> Result<&'static Self, log::SetLoggerError> {
        log::set_logger(self)?;
        log::set_max_level(LevelFilter::Trace);
        Ok(self)
    }

    fn state(&self) -> MutexGuard<'_, LoggerState> {
        self.state.lock().expect("Failed to lock logger state")
    }

    pub fn set_level(&self, level: LevelFilter) {
        self.state().level = level;
    }

    pub fn print_deferred(&self) {
        let mut state = self.state();
        let level = state.level;
        if let Some(deferred) = state.deferred.take() {
            for (message_level, message) in deferred {
                if message_level <= level {
                    let _ = writeln!(state.output, "{}", message);
                }
            }
        }
    }
}

fn level_color(level: Level) -> Color {
    match level {
        Level::Error => Color::Red,
        Level::Warn => Color::Yellow,
        Level::Info => Color::White,
        Level::Debug => Color::Blue,
        Level::Trace => Color::BrightBlack,
    }
}

impl Log for JailLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.state().level
    }

    fn log(&self, record: &Record) {
        let color = level_color(record.level());
        let line = format!(
            "[{:<5}] cowjail[{}]: {}",
            record.level(),
            std::process::id(),
            record.args()
        )
        .color(color);

        let mut state = self.state();
        if let Some(deferred) = state.deferred.as_mut() {
            deferred.push((record.level(), line));
        } else if record.level() <= state.level {
            let _ = writeln!(state.output, "{}", line);
        }
    }

    fn flush(&self) {
        let _ = self.state().output.flush();
    }
}
