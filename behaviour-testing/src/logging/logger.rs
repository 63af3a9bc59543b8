use super::target::{LoggingTarget, Sink};
use crate::config::LogLevel;
use log::{Level, Record};
use std::fmt;
use std::sync::Arc;

/// Logger handle owned by one test instance
///
/// Messages go through the `log` facade under this handle's unique
/// [`name`](TestLogger::name), so the standard macros work too:
///
/// ```rust,ignore
/// log::warn!(target: self.state().log().name(), "balance is {}", balance);
/// self.state().log().warn(format_args!("balance is {}", balance));
/// ```
///
/// Dropping the handle removes its route.
pub struct TestLogger {
    name: String,
    target: LoggingTarget,
    threshold: LogLevel,
    sink: Option<Arc<Sink>>,
    routed: bool,
}

impl TestLogger {
    pub(crate) fn new(
        name: String,
        target: LoggingTarget,
        threshold: LogLevel,
        sink: Arc<Sink>,
        routed: bool,
    ) -> Self {
        Self {
            name,
            target,
            threshold,
            sink: Some(sink),
            routed,
        }
    }

    /// A handle that discards everything, used until the instance is initialized
    pub fn detached() -> Self {
        Self {
            name: String::new(),
            target: LoggingTarget::Console,
            threshold: LogLevel::Off,
            sink: None,
            routed: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &LoggingTarget {
        &self.target
    }

    pub fn threshold(&self) -> LogLevel {
        self.threshold
    }

    pub(crate) fn sink(&self) -> Option<Arc<Sink>> {
        self.sink.clone()
    }

    pub fn is_detached(&self) -> bool {
        self.sink.is_none()
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.sink.as_ref().is_some_and(|sink| sink.enabled(level))
    }

    pub fn log(&self, level: Level, args: fmt::Arguments) {
        let Some(sink) = &self.sink else {
            return;
        };
        if !sink.enabled(level) {
            return;
        }

        let record = Record::builder()
            .args(args)
            .level(level)
            .target(&self.name)
            .build();
        if self.routed {
            log::logger().log(&record);
        } else {
            sink.write(&record);
        }
    }

    pub fn error(&self, args: fmt::Arguments) {
        self.log(Level::Error, args)
    }

    pub fn warn(&self, args: fmt::Arguments) {
        self.log(Level::Warn, args)
    }

    pub fn info(&self, args: fmt::Arguments) {
        self.log(Level::Info, args)
    }

    pub fn debug(&self, args: fmt::Arguments) {
        self.log(Level::Debug, args)
    }

    pub fn trace(&self, args: fmt::Arguments) {
        self.log(Level::Trace, args)
    }
}

impl Drop for TestLogger {
    fn drop(&mut self) {
        if self.routed {
            super::unregister(&self.name);
        }
    }
}

impl fmt::Debug for TestLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestLogger")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("threshold", &self.threshold)
            .field("routed", &self.routed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{configure, Layout};

    #[test]
    fn test_detached_discards() {
        let logger = TestLogger::detached();
        assert!(logger.is_detached());
        assert!(!logger.enabled(Level::Error));
        logger.error(format_args!("goes nowhere"));
    }

    #[test]
    fn test_threshold_and_layout() {
        let (target, memory) = LoggingTarget::memory();
        let layout = Layout::parse("${level}: ${message}").unwrap();
        let logger = configure("handle", target, LogLevel::Info, layout).unwrap();

        logger.debug(format_args!("hidden"));
        logger.info(format_args!("shown {}", 1));
        logger.error(format_args!("shown {}", 2));

        assert!(logger.enabled(Level::Info));
        assert!(!logger.enabled(Level::Debug));
        assert_eq!(
            memory.lines(),
            vec!["INFO: shown 1".to_string(), "ERROR: shown 2".to_string()]
        );
    }

    #[test]
    fn test_default_threshold_is_warn_and_above() {
        let (target, memory) = LoggingTarget::memory();
        let logger = configure("defaults", target, LogLevel::default(), Layout::default()).unwrap();

        logger.info(format_args!("info"));
        logger.warn(format_args!("warn"));

        assert_eq!(memory.lines(), vec!["warn".to_string()]);
    }
}
