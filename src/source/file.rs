//! File-based snapshot source.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use brokerprobe_types::BrokerSnapshot;
use tracing::{debug, warn};

use super::DataSource;
use crate::error::SourceError;

/// Read and parse one snapshot file.
///
/// Fails when the file cannot be read, is not a snapshot, or carries a schema
/// major version this build does not understand.
pub fn read_snapshot(path: impl AsRef<Path>) -> Result<BrokerSnapshot, SourceError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| SourceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let snapshot: BrokerSnapshot =
        serde_json::from_str(&content).map_err(|source| SourceError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    if !snapshot.version.is_compatible() {
        return Err(SourceError::IncompatibleSchema {
            major: snapshot.version.major,
            minor: snapshot.version.minor,
        });
    }
    Ok(snapshot)
}

/// Polls a JSON snapshot file.
///
/// The source tracks the file's modification time and only reads the file
/// again once it has changed, whether the previous read succeeded or not.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    last_error: Option<String>,
    last_modified: Option<SystemTime>,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            last_error: None,
            last_modified: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn modified_time(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).ok()?.modified().ok()
    }
}

impl DataSource for FileSource {
    fn poll(&mut self) -> Option<BrokerSnapshot> {
        let current_modified = self.modified_time();

        let file_changed = match (&self.last_modified, &current_modified) {
            (None, _) => true,
            // file disappeared; keep the last snapshot
            (Some(_), None) => false,
            (Some(last), Some(current)) => current > last,
        };
        if !file_changed {
            return None;
        }

        match read_snapshot(&self.path) {
            Ok(snapshot) => {
                debug!(path = %self.path.display(), "snapshot loaded");
                self.last_error = None;
                self.last_modified = current_modified;
                Some(snapshot)
            }
            Err(err) => {
                let message = err.to_string();
                if self.last_error.as_deref() == Some(message.as_str()) {
                    debug!(error = %message, "snapshot still unavailable");
                } else {
                    warn!(error = %message, "snapshot unavailable");
                }
                self.last_error = Some(message);
                self.last_modified = current_modified;
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Replace the file's content and push its mtime forward so the change
    /// is visible even on filesystems with coarse timestamps.
    fn rewrite(path: &Path, content: &str) {
        std::fs::write(path, content).unwrap();
        let later = SystemTime::now() + std::time::Duration::from_secs(10);
        std::fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(later)
            .unwrap();
    }

    fn sample_json() -> &'static str {
        r#"{
            "version": { "major": 1, "minor": 0 },
            "cluster": "prod",
            "nodes": [
                { "identifier": "rabbit@a", "available_cores_detected": 4 }
            ],
            "virtual_hosts": [
                { "name": "/", "queues": [ { "identifier": "orders", "consumers": 2 } ] }
            ]
        }"#
    }

    #[test]
    fn new_source() {
        let source = FileSource::new("/tmp/snapshot.json");
        assert_eq!(source.path(), Path::new("/tmp/snapshot.json"));
        assert_eq!(source.description(), "file: /tmp/snapshot.json");
        assert!(source.error().is_none());
    }

    #[test]
    fn read_snapshot_parses_tree() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", sample_json()).unwrap();

        let snapshot = read_snapshot(file.path()).unwrap();
        assert_eq!(snapshot.cluster, "prod");
        assert_eq!(snapshot.nodes[0].available_cores_detected, 4);
        assert_eq!(snapshot.queue_count(), 1);
    }

    #[test]
    fn poll_reads_once_until_changed() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", sample_json()).unwrap();

        let mut source = FileSource::new(file.path());
        assert!(source.poll().is_some());
        assert!(source.poll().is_none());
    }

    #[test]
    fn missing_file() {
        let mut source = FileSource::new("/nonexistent/path/snapshot.json");
        assert!(source.poll().is_none());
        assert!(source.error().unwrap().contains("failed to read"));

        assert!(matches!(
            read_snapshot("/nonexistent/path/snapshot.json"),
            Err(SourceError::Read { .. })
        ));
    }

    #[test]
    fn invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let mut source = FileSource::new(file.path());
        assert!(source.poll().is_none());
        assert!(source.error().unwrap().contains("failed to parse"));
    }

    #[test]
    fn incompatible_schema_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "version": {{ "major": 99, "minor": 0 }} }}"#).unwrap();

        assert!(matches!(
            read_snapshot(file.path()),
            Err(SourceError::IncompatibleSchema { major: 99, .. })
        ));
    }

    #[test]
    fn error_clears_after_successful_read() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{").unwrap();

        let mut source = FileSource::new(file.path());
        assert!(source.poll().is_none());
        assert!(source.error().is_some());

        rewrite(file.path(), sample_json());
        assert!(source.poll().is_some());
        assert!(source.error().is_none());
    }

    #[test]
    fn unchanged_broken_file_is_not_reread() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{").unwrap();

        let mut source = FileSource::new(file.path());
        assert!(source.poll().is_none());
        let first = source.error().unwrap().to_string();

        // same content and mtime: nothing to do, the error stays
        assert!(source.poll().is_none());
        assert_eq!(source.error(), Some(first.as_str()));

        // a broken rewrite is read again and replaces the error
        rewrite(file.path(), "not json");
        assert!(source.poll().is_none());
        assert_ne!(source.error(), Some(first.as_str()));
    }
}
