//! FileHook - appends dispatched batches to a JSON Lines file

use chrono::{SecondsFormat, Utc};
use contracts::{ContractError, DispatchHook};
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

#[derive(Serialize)]
struct BatchRecord<'a> {
    timestamp: String,
    count: usize,
    metrics: &'a [Value],
}

/// Hook that writes one JSON line per attempted batch
pub struct FileHook {
    name: String,
    path: PathBuf,
    file: Mutex<File>,
}

impl FileHook {
    /// Open (or create) the output file in append mode
    pub fn new(name: impl Into<String>, path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let name = name.into();
        debug!(hook = %name, path = %path.display(), "FileHook opened");

        Ok(Self {
            name,
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, metrics: &[Value]) -> Result<(), ContractError> {
        let record = BatchRecord {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            count: metrics.len(),
            metrics,
        };
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let mut file = self
            .file
            .lock()
            .map_err(|_| ContractError::hook(&self.name, "file lock poisoned"))?;
        file.write_all(&line)?;
        file.flush()?;
        Ok(())
    }
}

impl DispatchHook for FileHook {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_dispatched(&self, metrics: &[Value]) -> Result<(), ContractError> {
        self.append(metrics)
    }
}
