//! Stage markers written to the build's activity log.
//!
//! The activity log is for humans reading a build's output. Nothing reads it
//! back for control flow.

use crate::core::ActivitySink;
use std::fmt;
use std::io::Write;
use std::sync::Mutex;

const PREFIX: &str = "[Build Notifier]";

/// One stage of a dispatch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityEntry {
    Start,
    BeforeExpand(String),
    AfterExpand(String),
    /// Carries the room's display form, which never includes the token.
    PublishBegin(String),
    PublishEnd,
    Skipped,
    Error { message: String, trace: String },
    Finished { success: bool },
}

impl fmt::Display for ActivityEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityEntry::Start => write!(f, "{PREFIX}================[start]================="),
            ActivityEntry::BeforeExpand(text) => write!(f, "{PREFIX}[content] before expansion: {text}"),
            ActivityEntry::AfterExpand(text) => write!(f, "{PREFIX}[content] after expansion: {text}"),
            ActivityEntry::PublishBegin(room) => write!(f, "{PREFIX}[publish][begin] using {room}"),
            ActivityEntry::PublishEnd => write!(f, "{PREFIX}[publish][end]"),
            ActivityEntry::Skipped => write!(f, "{PREFIX}================[skipped]================="),
            ActivityEntry::Error { message, trace } if trace.is_empty() => {
                write!(f, "{PREFIX}[error] {message}")
            }
            ActivityEntry::Error { message, trace } => {
                write!(f, "{PREFIX}[error] {message}\n{PREFIX}[trace] {trace}")
            }
            ActivityEntry::Finished { success: true } => {
                write!(f, "{PREFIX}================[end][success]=================")
            }
            ActivityEntry::Finished { success: false } => {
                write!(f, "{PREFIX}================[end][failure]=================")
            }
        }
    }
}

/// Keeps every entry in memory, in order.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<ActivityEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Renders every entry as it would appear in a build log.
    pub fn lines(&self) -> Vec<String> {
        self.entries().iter().map(ToString::to_string).collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl ActivitySink for MemorySink {
    fn record(&self, entry: ActivityEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }
}

/// Writes one line per entry to a writer such as the build console.
pub struct WriterSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> ActivitySink for WriterSink<W> {
    fn record(&self, entry: ActivityEntry) {
        // Diagnostics only; a broken console must not affect dispatch.
        if let Ok(mut w) = self.writer.lock() {
            let _ = writeln!(w, "{}", entry);
            let _ = w.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_sink_writes_lines_in_order() {
        let sink = WriterSink::new(Vec::new());
        sink.record(ActivityEntry::Start);
        sink.record(ActivityEntry::BeforeExpand("${JOB_NAME}".to_string()));
        sink.record(ActivityEntry::Finished { success: true });

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("[start]================="));
        assert_eq!(lines[1], "[Build Notifier][content] before expansion: ${JOB_NAME}");
        assert!(lines[2].contains("[end][success]"));
    }

    #[test]
    fn test_error_entry_includes_trace_when_present() {
        let entry = ActivityEntry::Error {
            message: "boom".to_string(),
            trace: "caused by: io".to_string(),
        };
        assert_eq!(
            entry.to_string(),
            "[Build Notifier][error] boom\n[Build Notifier][trace] caused by: io"
        );
    }

    #[test]
    fn test_memory_sink_contains() {
        let sink = MemorySink::new();
        sink.record(ActivityEntry::Skipped);
        assert!(sink.contains("[skipped]"));
        assert!(!sink.contains("[start]"));
    }
}
