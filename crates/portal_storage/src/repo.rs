#![forbid(unsafe_code)]

use portal_contracts::admin::AdminSession;
use portal_contracts::visitor::{RequestOrigin, VisitorEntry, VisitorRecord};
use portal_contracts::MonotonicTimeNs;

use crate::StorageError;

/// Result of the lenient visitor listing. An unreadable log yields no records
/// plus a `degraded` reason instead of an error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VisitorListing {
    pub records: Vec<VisitorRecord>,
    pub degraded: Option<String>,
}

impl VisitorListing {
    pub fn complete(records: Vec<VisitorRecord>) -> Self {
        Self {
            records,
            degraded: None,
        }
    }

    pub fn degraded(reason: String) -> Self {
        Self {
            records: Vec::new(),
            degraded: Some(reason),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

/// Typed repository interface for the append-only visitor log.
pub trait VisitorLogRepo: Send + Sync {
    /// Stamps server time and the request origin onto `entry` and persists it.
    /// Concurrent calls are serialized; a failed call persists nothing.
    fn append_visitor_row(
        &self,
        entry: VisitorEntry,
        origin: &RequestOrigin,
    ) -> Result<(), StorageError>;

    /// Full insertion-ordered log. Propagates read failures.
    fn load_visitor_rows(&self) -> Result<Vec<VisitorRecord>, StorageError>;

    fn visitor_log_label(&self) -> String;

    fn list_visitor_rows(&self) -> VisitorListing {
        match self.load_visitor_rows() {
            Ok(records) => VisitorListing::complete(records),
            Err(err) => {
                tracing::error!(
                    store = %self.visitor_log_label(),
                    error = %err,
                    "visitor log unreadable, reporting empty listing as degraded"
                );
                VisitorListing::degraded(err.to_string())
            }
        }
    }
}

/// Typed repository interface for admin sessions, keyed by token digest.
pub trait AdminSessionRepo: Send + Sync {
    fn insert_session_row(
        &self,
        token_digest: String,
        session: AdminSession,
    ) -> Result<(), StorageError>;
    fn session_row(&self, token_digest: &str) -> Result<Option<AdminSession>, StorageError>;
    /// Returns whether a row was removed. Removing an unknown digest is not an error.
    fn remove_session_row(&self, token_digest: &str) -> Result<bool, StorageError>;
    fn purge_expired_session_rows(&self, now: MonotonicTimeNs) -> Result<usize, StorageError>;
    fn active_session_count(&self, now: MonotonicTimeNs) -> Result<usize, StorageError>;
}
