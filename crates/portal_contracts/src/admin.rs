#![forbid(unsafe_code)]

use crate::{MonotonicTimeNs, Validate, ValidationError};

/// Upper bound for a configured session lifetime (24h).
pub const ADMIN_SESSION_LIFETIME_MAX_NS: u64 = 86_400_000_000_000;
pub const ADMIN_SESSION_LIFETIME_DEFAULT_NS: u64 = 3_600_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AdminIdentity(String);

impl AdminIdentity {
    pub fn new(username: impl Into<String>) -> Result<Self, ValidationError> {
        let identity = Self(username.into());
        identity.validate()?;
        Ok(identity)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for AdminIdentity {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.0.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "username" });
        }
        if self.0.len() > 128 {
            return Err(ValidationError::InvalidValue {
                field: "username",
                reason: "must be <= 128 bytes",
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for AdminIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Opaque bearer value handed to the browser. Only its digest is kept server side.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminSessionState {
    Unauthenticated,
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    pub identity: AdminIdentity,
    pub issued_at: MonotonicTimeNs,
    pub expires_at: MonotonicTimeNs,
}

impl AdminSession {
    pub fn v1(identity: AdminIdentity, issued_at: MonotonicTimeNs, lifetime_ns: u64) -> Self {
        Self {
            identity,
            issued_at,
            expires_at: issued_at.saturating_add_ns(lifetime_ns),
        }
    }

    pub fn state_at(&self, now: MonotonicTimeNs) -> AdminSessionState {
        if now < self.expires_at {
            AdminSessionState::Active
        } else {
            AdminSessionState::Unauthenticated
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Never says whether the username or the password was wrong.
    InvalidCredentials,
    /// Credentials were fine but the session could not be recorded.
    SessionUnavailable,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCredentials => f.write_str("Invalid credentials"),
            Self::SessionUnavailable => f.write_str("Session could not be created"),
        }
    }
}

impl std::error::Error for AuthError {}
