//! Logging capability used across the lifecycle phases.

use std::io::Write;
use std::sync::Mutex;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// The logging seam of the engine. Phases report progress and classification
/// decisions through this trait; they never write to the console directly.
pub trait Logger {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Console logger writing leveled, styled output to stderr.
pub struct ConsoleLogger {
    level: LogLevel,
}

impl ConsoleLogger {
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }

    fn write(&self, level: LogLevel, message: &str, color: Option<Color>) {
        if level < self.level {
            return;
        }

        let mut stream = StandardStream::stderr(ColorChoice::Auto);

        // Style each line separately so that prefixes added by streaming
        // consumers don't inherit the line color.
        for line in message.split('\n') {
            let mut spec = ColorSpec::new();
            spec.set_fg(color);
            let _ = stream.set_color(&spec);
            let _ = write!(stream, "{line}");
            let _ = stream.reset();
            let _ = writeln!(stream);
        }
        let _ = stream.flush();
    }
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new(LogLevel::Info)
    }
}

impl Logger for ConsoleLogger {
    fn debug(&self, message: &str) {
        self.write(LogLevel::Debug, message, None);
    }

    fn info(&self, message: &str) {
        self.write(LogLevel::Info, message, None);
    }

    fn warn(&self, message: &str) {
        self.write(LogLevel::Warn, message, Some(Color::Yellow));
    }

    fn error(&self, message: &str) {
        self.write(LogLevel::Error, message, Some(Color::Red));
    }
}

/// Logger that records entries in memory. Intended for tests that assert on
/// classification decisions.
#[derive(Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn contains(&self, fragment: &str) -> bool {
        self.entries()
            .iter()
            .any(|(_, message)| message.contains(fragment))
    }

    fn push(&self, level: LogLevel, message: &str) {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((level, String::from(message)));
    }
}

impl Logger for MemoryLogger {
    fn debug(&self, message: &str) {
        self.push(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.push(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }
}
