#![forbid(unsafe_code)]

pub mod admin_sessions;
pub mod repo;
pub mod visitor_log;

pub use repo::{AdminSessionRepo, VisitorListing, VisitorLogRepo};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Backing medium unreadable or unwritable. `operation` names the failing step.
    IoFailure {
        operation: &'static str,
        detail: String,
    },
    DuplicateKey {
        table: &'static str,
        key: String,
    },
}

impl StorageError {
    pub(crate) fn io(operation: &'static str, detail: impl std::fmt::Display) -> Self {
        Self::IoFailure {
            operation,
            detail: detail.to_string(),
        }
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoFailure { operation, detail } => {
                write!(f, "storage io failure during {operation}: {detail}")
            }
            Self::DuplicateKey { table, key } => write!(f, "duplicate key in {table}: {key}"),
        }
    }
}

impl std::error::Error for StorageError {}
