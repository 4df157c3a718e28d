//! Optional debug channel for generation runs

pub const DEFAULT_DEBUG_CHANNEL: &str = "real_generator.debug";

/// Sink for debug messages
pub trait DebugLog {
    fn log(&self, message: &str);
}

impl<T: DebugLog + ?Sized> DebugLog for &T {
    fn log(&self, message: &str) {
        (**self).log(message)
    }
}

/// Sends messages to `tracing` at debug level, tagged with a channel name.
/// Does nothing unless enabled.
#[derive(Debug, Clone)]
pub struct DebugLogger {
    enabled: bool,
    channel: String,
}

impl DebugLogger {
    pub fn new(enabled: bool, channel: impl Into<String>) -> Self {
        Self {
            enabled,
            channel: channel.into(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(false, DEFAULT_DEBUG_CHANNEL)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }
}

impl Default for DebugLogger {
    fn default() -> Self {
        Self::disabled()
    }
}

impl DebugLog for DebugLogger {
    fn log(&self, message: &str) {
        if self.enabled {
            tracing::debug!(channel = %self.channel, "{}", message);
        }
    }
}

/// Keeps every message in memory, for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryDebugLog {
    messages: std::cell::RefCell<Vec<String>>,
}

impl MemoryDebugLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl DebugLog for MemoryDebugLog {
    fn log(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_logger_defaults() {
        let logger = DebugLogger::default();
        assert!(!logger.is_enabled());
        assert_eq!(logger.channel(), "real_generator.debug");
        logger.log("ignored");
    }

    #[test]
    fn test_memory_log_keeps_order() {
        let log = MemoryDebugLog::new();
        log.log("first");
        log.log("second");
        assert_eq!(log.messages(), vec!["first", "second"]);
    }
}
