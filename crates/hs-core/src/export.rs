//! Export sinks for rendered reports.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use hs_common::{Error, Result};

/// Destination for rendered report text.
pub trait ExportSink {
    /// Short label for logs.
    fn name(&self) -> &str;

    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// Writes to standard output.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl ExportSink for StdoutSink {
    fn name(&self) -> &str {
        "stdout"
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}", text)
            .and_then(|_| handle.flush())
            .map_err(|e| Error::ExportFailed(format!("stdout: {}", e)))
    }
}

/// Writes to a file, replacing its contents. The write goes to a sibling
/// temp file first and is renamed into place.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSink { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ExportSink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, text.as_bytes()).map_err(|e| {
            Error::ExportFailed(format!("failed to write {}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            Error::ExportFailed(format!("failed to move report to {}: {}", self.path.display(), e))
        })
    }
}

/// Keeps every export in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    exports: Vec<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink::default()
    }

    pub fn last(&self) -> Option<&str> {
        self.exports.last().map(String::as_str)
    }

    pub fn exports(&self) -> &[String] {
        &self.exports
    }
}

impl ExportSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        self.exports.push(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_sink_keeps_history() {
        let mut sink = MemorySink::new();
        sink.write_text("one").unwrap();
        sink.write_text("two").unwrap();
        assert_eq!(sink.last(), Some("two"));
        assert_eq!(sink.exports().len(), 2);
    }

    #[test]
    fn test_file_sink_replaces_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.txt");
        fs::write(&path, "stale").unwrap();

        let mut sink = FileSink::new(&path);
        sink.write_text("fresh").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "fresh");
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_file_sink_missing_dir_fails() {
        let dir = tempdir().unwrap();
        let mut sink = FileSink::new(dir.path().join("nope").join("report.txt"));
        let err = sink.write_text("x").unwrap_err();
        assert!(matches!(err, Error::ExportFailed(_)));
        assert!(err.is_recoverable());
    }
}
