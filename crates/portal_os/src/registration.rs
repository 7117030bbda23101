#![forbid(unsafe_code)]

use std::sync::Arc;

use portal_contracts::admin::SessionToken;
use portal_contracts::visitor::{RequestOrigin, VisitorSubmission};
use portal_contracts::{MonotonicTimeNs, ValidationError};
use portal_storage::{StorageError, VisitorListing, VisitorLogRepo};

use crate::admin_gate::AdminSessionGate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    Validation(ValidationError),
    Storage(StorageError),
}

impl std::fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for RegistrationError {}

impl From<ValidationError> for RegistrationError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StorageError> for RegistrationError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Front desk for the visitor log: validates before anything touches storage,
/// and only hands the listing to callers holding a live admin session.
#[derive(Clone)]
pub struct RegistrationDesk {
    log: Arc<dyn VisitorLogRepo>,
}

impl RegistrationDesk {
    pub fn new(log: Arc<dyn VisitorLogRepo>) -> Self {
        Self { log }
    }

    pub fn register(
        &self,
        submission: VisitorSubmission,
        origin: &RequestOrigin,
    ) -> Result<(), RegistrationError> {
        let entry = submission.into_entry().map_err(|err| {
            tracing::info!(field = err.field(), "visitor submission rejected");
            err
        })?;
        if entry.known_purpose().is_none() {
            tracing::debug!(
                purpose = %entry.purpose(),
                "visitor purpose outside the form options"
            );
        }
        let full_name = entry.full_name().to_string();
        let purpose = entry.purpose().to_string();
        self.log.append_visitor_row(entry, origin).map_err(|err| {
            tracing::error!(
                store = %self.log.visitor_log_label(),
                error = %err,
                "failed to save visitor record"
            );
            err
        })?;
        tracing::info!(
            visitor = %full_name,
            purpose = %purpose,
            source_address = %origin.source_address,
            "new visitor registered"
        );
        Ok(())
    }

    pub fn visitor_listing(&self) -> VisitorListing {
        self.log.list_visitor_rows()
    }

    /// `None` means the caller is not authorized and should be sent to the login page.
    pub fn admin_visitor_listing(
        &self,
        gate: &AdminSessionGate,
        token: Option<&SessionToken>,
        now: MonotonicTimeNs,
    ) -> Option<VisitorListing> {
        let token = token?;
        if !gate.is_authorized(token, now) {
            return None;
        }
        Some(self.visitor_listing())
    }

    /// Strict read used for health reporting.
    pub fn log_health(&self) -> Result<usize, StorageError> {
        self.log.load_visitor_rows().map(|rows| rows.len())
    }

    pub fn log_label(&self) -> String {
        self.log.visitor_log_label()
    }
}
