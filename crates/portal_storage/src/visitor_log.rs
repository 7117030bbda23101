#![forbid(unsafe_code)]

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use chrono::{SecondsFormat, Utc};
use portal_contracts::visitor::{RequestOrigin, VisitorEntry, VisitorRecord};

use crate::repo::VisitorLogRepo;
use crate::StorageError;

const DEFAULT_LOG_RELATIVE_PATH: &str = ".portal/data/users.json";

pub fn server_timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// `$HOME/.portal/data/users.json`, or the same path relative to the working
/// directory when no home is known.
pub fn default_visitor_log_path(home: Option<&str>) -> PathBuf {
    match home {
        Some(home) => PathBuf::from(home).join(DEFAULT_LOG_RELATIVE_PATH),
        None => PathBuf::from(DEFAULT_LOG_RELATIVE_PATH),
    }
}

/// Visitor log backed by a single JSON array file, rewritten wholesale on
/// every append.
#[derive(Debug)]
pub struct JsonFileVisitorLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileVisitorLog {
    /// Creates the parent directory and an empty `[]` log when the file is absent.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let log = Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        };
        log.ensure_ready()?;
        Ok(log)
    }

    /// Attaches to `path` without creating anything. A missing file reads as empty.
    pub fn attach_read_only(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn ensure_ready(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| {
                    StorageError::io(
                        "create_dir",
                        format!("'{}': {}", parent.display(), err),
                    )
                })?;
            }
        }
        if !self.path.exists() {
            self.write_rows(&[])?;
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // The guarded value is `()`, so a panic in another holder leaves nothing inconsistent.
        self.write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_rows(&self) -> Result<Vec<VisitorRecord>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(StorageError::io(
                    "read",
                    format!("'{}': {}", self.path.display(), err),
                ))
            }
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).map_err(|err| {
            StorageError::io("decode", format!("'{}': {}", self.path.display(), err))
        })
    }

    fn write_rows(&self, rows: &[VisitorRecord]) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(rows).map_err(|err| StorageError::io("encode", err))?;
        let mut tmp = self.path.clone();
        tmp.set_extension("json.tmp");
        fs::write(&tmp, &json).map_err(|err| {
            StorageError::io("write", format!("'{}': {}", tmp.display(), err))
        })?;
        fs::rename(&tmp, &self.path).map_err(|err| {
            let _ = fs::remove_file(&tmp);
            StorageError::io("rename", format!("'{}': {}", self.path.display(), err))
        })
    }
}

impl VisitorLogRepo for JsonFileVisitorLog {
    fn append_visitor_row(
        &self,
        entry: VisitorEntry,
        origin: &RequestOrigin,
    ) -> Result<(), StorageError> {
        let _guard = self.lock();
        // A read failure aborts the append so an unreadable file is never replaced by a
        // one-row log.
        let mut rows = self.read_rows()?;
        rows.push(entry.into_record(origin, server_timestamp_now()));
        self.write_rows(&rows)
    }

    fn load_visitor_rows(&self) -> Result<Vec<VisitorRecord>, StorageError> {
        self.read_rows()
    }

    fn visitor_log_label(&self) -> String {
        format!("json_file:{}", self.path.display())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryVisitorLog {
    rows: Mutex<Vec<VisitorRecord>>,
}

impl InMemoryVisitorLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn rows(&self) -> MutexGuard<'_, Vec<VisitorRecord>> {
        // Rows are only ever pushed whole, so a poisoned guard still holds a valid log.
        self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl VisitorLogRepo for InMemoryVisitorLog {
    fn append_visitor_row(
        &self,
        entry: VisitorEntry,
        origin: &RequestOrigin,
    ) -> Result<(), StorageError> {
        let record = entry.into_record(origin, server_timestamp_now());
        self.rows().push(record);
        Ok(())
    }

    fn load_visitor_rows(&self) -> Result<Vec<VisitorRecord>, StorageError> {
        Ok(self.rows().clone())
    }

    fn visitor_log_label(&self) -> String {
        "in_memory".to_string()
    }
}
