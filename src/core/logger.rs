/// Logging capability handed to the fetcher and poller
///
/// The polling core only needs three levels; the concrete backend is chosen
/// by whoever builds the poller.

pub trait PollLogger: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards to `tracing` under the `metrics_dash::poller` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl PollLogger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!(target: "metrics_dash::poller", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "metrics_dash::poller", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "metrics_dash::poller", "{}", message);
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Level, RecordingLogger};
    use super::*;

    #[test]
    fn test_recording_logger_keeps_levels() {
        let logger = RecordingLogger::default();
        logger.info("starting");
        logger.warn("odd status");
        logger.error("boom");

        assert_eq!(logger.count(Level::Info), 1);
        assert!(logger.contains(Level::Warn, "odd"));
        assert!(logger.contains(Level::Error, "boom"));
        assert!(!logger.contains(Level::Info, "boom"));
    }

    #[test]
    fn test_tracing_logger_without_subscriber() {
        let logger = TracingLogger;
        logger.info("no subscriber installed");
        logger.warn("still fine");
        logger.error("still fine");
    }
}
