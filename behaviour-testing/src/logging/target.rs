//! Where a test logger writes

use super::layout::Layout;
use crate::config;
use crate::error::LoggingError;
use fern::colors::{Color, ColoredLevelConfig};
use log::{LevelFilter, Record};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// Output destination of a [`TestLogger`](super::TestLogger)
#[derive(Debug, Clone, Default)]
pub enum LoggingTarget {
    /// Standard output, each line coloured by level
    #[default]
    ColoredConsole,
    /// Standard output, uncoloured
    Console,
    /// Shared in-memory buffer, for asserting on log output
    Memory(MemoryLog),
    /// Append to a file, created if missing
    File(PathBuf),
}

impl LoggingTarget {
    pub fn memory() -> (Self, MemoryLog) {
        let log = MemoryLog::default();
        (LoggingTarget::Memory(log.clone()), log)
    }
}

/// Rendered log lines kept in memory
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryLog {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    /// Whether any line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|line| line.contains(needle))
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }

    fn push(&self, line: String) {
        self.lines.lock().push(line);
    }
}

enum Output {
    Console(Option<ColoredLevelConfig>),
    Memory(MemoryLog),
    File(Mutex<File>),
}

/// Threshold + layout + opened output of one logger
pub(crate) struct Sink {
    threshold: LevelFilter,
    layout: Layout,
    output: Output,
}

impl Sink {
    pub(crate) fn open(
        target: &LoggingTarget,
        threshold: LevelFilter,
        layout: Layout,
    ) -> Result<Self, LoggingError> {
        let output = match target {
            LoggingTarget::ColoredConsole if !config::global().disable_log_color => {
                Output::Console(Some(
                    ColoredLevelConfig::new()
                        .error(Color::Red)
                        .warn(Color::Yellow)
                        .info(Color::Green)
                        .debug(Color::Cyan)
                        .trace(Color::BrightBlack),
                ))
            }
            LoggingTarget::ColoredConsole | LoggingTarget::Console => Output::Console(None),
            LoggingTarget::Memory(log) => Output::Memory(log.clone()),
            LoggingTarget::File(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|source| LoggingError::Io {
                        path: path.clone(),
                        source,
                    })?;
                Output::File(Mutex::new(file))
            }
        };
        Ok(Self {
            threshold,
            layout,
            output,
        })
    }

    pub(crate) fn threshold(&self) -> LevelFilter {
        self.threshold
    }

    pub(crate) fn enabled(&self, level: log::Level) -> bool {
        level <= self.threshold
    }

    pub(crate) fn write(&self, record: &Record) {
        if !self.enabled(record.level()) {
            return;
        }

        let line = self.layout.render(record);
        match &self.output {
            Output::Console(Some(colors)) => println!(
                "\x1B[{}m{}\x1B[0m",
                colors.get_color(&record.level()).to_fg_str(),
                line
            ),
            Output::Console(None) => println!("{}", line),
            Output::Memory(log) => log.push(line),
            Output::File(file) => {
                // A failing log write must not fail the test
                let _ = writeln!(file.lock(), "{}", line);
            }
        }
    }
}
