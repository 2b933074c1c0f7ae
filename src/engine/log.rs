use chrono::Local;
use tracing::{info, warn};

/// Operator-facing log lines returned with a sync result.
///
/// Every line is also emitted through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct SyncLog {
    entries: Vec<String>,
}

impl SyncLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.push(message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.push(message);
    }

    fn push(&mut self, message: String) {
        self.entries
            .push(format!("[{}] {}", Local::now().format("%H:%M:%S"), message));
    }

    /// Append another log's lines, keeping their order
    pub fn append(&mut self, other: SyncLog) {
        self.entries.extend(other.entries);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<String> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_timestamped_and_ordered() {
        let mut log = SyncLog::new();
        log.info("first");
        let mut other = SyncLog::new();
        other.warn("second");
        log.append(other);

        let entries = log.into_entries();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].starts_with('[') && entries[0].ends_with("] first"));
        assert!(entries[1].ends_with("] second"));
    }
}
