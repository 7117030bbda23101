#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use portal_contracts::admin::{AdminSession, AdminSessionState};
use portal_contracts::MonotonicTimeNs;

use crate::repo::AdminSessionRepo;
use crate::StorageError;

/// Process-local session table. Rows are keyed by token digest, never by the raw token.
#[derive(Debug, Default)]
pub struct InMemoryAdminSessionStore {
    rows: Mutex<BTreeMap<String, AdminSession>>,
}

impl InMemoryAdminSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn rows(&self) -> MutexGuard<'_, BTreeMap<String, AdminSession>> {
        self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AdminSessionRepo for InMemoryAdminSessionStore {
    fn insert_session_row(
        &self,
        token_digest: String,
        session: AdminSession,
    ) -> Result<(), StorageError> {
        let mut rows = self.rows();
        if rows.contains_key(&token_digest) {
            return Err(StorageError::DuplicateKey {
                table: "admin_sessions",
                key: token_digest,
            });
        }
        rows.insert(token_digest, session);
        Ok(())
    }

    fn session_row(&self, token_digest: &str) -> Result<Option<AdminSession>, StorageError> {
        Ok(self.rows().get(token_digest).cloned())
    }

    fn remove_session_row(&self, token_digest: &str) -> Result<bool, StorageError> {
        Ok(self.rows().remove(token_digest).is_some())
    }

    fn purge_expired_session_rows(&self, now: MonotonicTimeNs) -> Result<usize, StorageError> {
        let mut rows = self.rows();
        let before = rows.len();
        rows.retain(|_, session| session.state_at(now) == AdminSessionState::Active);
        Ok(before - rows.len())
    }

    fn active_session_count(&self, now: MonotonicTimeNs) -> Result<usize, StorageError> {
        Ok(self
            .rows()
            .values()
            .filter(|session| session.state_at(now) == AdminSessionState::Active)
            .count())
    }
}
