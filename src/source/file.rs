//! File-based data source.
//!
//! Polls a JSON file of readings that a gateway exporter rewrites.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use leakwatch_types::AssetReading;

use super::{DataSource, Payload};

/// A data source that reads asset readings from a JSON file.
///
/// The file holds either one reading or an array of them. The source
/// tracks the file's modification time and only returns readings when
/// the file has been updated.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    last_error: Option<String>,
    last_modified: Option<SystemTime>,
}

impl FileSource {
    /// Create a new file source for the given path.
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

    /// Returns the path being monitored.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn modified_time(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).ok()?.modified().ok()
    }

    fn read_file(&mut self) -> Option<Vec<AssetReading>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str::<Payload>(&content) {
                Ok(payload) => {
                    self.last_error = None;
                    Some(payload.into_readings())
                }
                Err(e) => {
                    self.last_error = Some(format!("Parse error: {}", e));
                    None
                }
            },
            Err(e) => {
                self.last_error = Some(format!("Read error: {}", e));
                None
            }
        }
    }
}

impl DataSource for FileSource {
    fn poll(&mut self) -> Option<Vec<AssetReading>> {
        let current_modified = self.modified_time();

        let file_changed = match (&self.last_modified, &current_modified) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(last), Some(current)) => current > last,
        };

        if file_changed {
            if let Some(readings) = self.read_file() {
                self.last_modified = current_modified;
                return Some(readings);
            }
        }

        None
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
