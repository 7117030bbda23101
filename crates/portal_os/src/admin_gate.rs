#![forbid(unsafe_code)]

use portal_contracts::admin::{
    AdminCredentials, AdminIdentity, AdminSession, AdminSessionState, AuthError, SessionToken,
    ADMIN_SESSION_LIFETIME_DEFAULT_NS, ADMIN_SESSION_LIFETIME_MAX_NS,
};
use portal_contracts::{MonotonicTimeNs, ValidationError};
use portal_engines::{mint_session_token, session_token_digest, CredentialVerifier};
use portal_storage::admin_sessions::InMemoryAdminSessionStore;
use portal_storage::AdminSessionRepo;

const NS_PER_SEC: u64 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminGateConfig {
    /// Fixed lifetime counted from the grant; lookups do not extend it.
    pub session_lifetime_ns: u64,
}

impl AdminGateConfig {
    pub fn mvp_v1() -> Self {
        Self {
            session_lifetime_ns: ADMIN_SESSION_LIFETIME_DEFAULT_NS,
        }
    }

    pub fn with_lifetime_secs(secs: u64) -> Result<Self, ValidationError> {
        let lifetime_ns = secs.saturating_mul(NS_PER_SEC);
        if secs == 0 || lifetime_ns > ADMIN_SESSION_LIFETIME_MAX_NS {
            return Err(ValidationError::InvalidValue {
                field: "admin_gate_config.session_lifetime",
                reason: "must be within 1..=86400 seconds",
            });
        }
        Ok(Self {
            session_lifetime_ns: lifetime_ns,
        })
    }

    pub fn session_lifetime_secs(&self) -> u64 {
        self.session_lifetime_ns / NS_PER_SEC
    }
}

impl Default for AdminGateConfig {
    fn default() -> Self {
        Self::mvp_v1()
    }
}

#[derive(Debug, Clone)]
pub struct AdminGrant {
    pub session: AdminSession,
    pub token: SessionToken,
}

/// Credential check plus session lifecycle for the admin surface.
pub struct AdminSessionGate {
    config: AdminGateConfig,
    verifier: Box<dyn CredentialVerifier>,
    sessions: Box<dyn AdminSessionRepo>,
}

impl AdminSessionGate {
    pub fn new(
        config: AdminGateConfig,
        verifier: Box<dyn CredentialVerifier>,
        sessions: Box<dyn AdminSessionRepo>,
    ) -> Self {
        Self {
            config,
            verifier,
            sessions,
        }
    }

    pub fn with_in_memory_sessions(
        config: AdminGateConfig,
        verifier: Box<dyn CredentialVerifier>,
    ) -> Self {
        Self::new(config, verifier, Box::new(InMemoryAdminSessionStore::new()))
    }

    pub fn config(&self) -> AdminGateConfig {
        self.config
    }

    pub fn credential_backend(&self) -> &'static str {
        self.verifier.backend_label()
    }

    pub fn authenticate(
        &self,
        credentials: &AdminCredentials,
        now: MonotonicTimeNs,
    ) -> Result<AdminGrant, AuthError> {
        let Some(identity) = self.verifier.verify(credentials) else {
            tracing::warn!(
                username = %credentials.username,
                "failed admin login attempt"
            );
            return Err(AuthError::InvalidCredentials);
        };

        if let Err(err) = self.sessions.purge_expired_session_rows(now) {
            tracing::warn!(error = %err, "admin session purge failed");
        }

        let token = mint_session_token();
        let session = AdminSession::v1(identity, now, self.config.session_lifetime_ns);
        self.sessions
            .insert_session_row(session_token_digest(&token), session.clone())
            .map_err(|err| {
                tracing::error!(error = %err, "admin session could not be recorded");
                AuthError::SessionUnavailable
            })?;

        tracing::info!(admin = %session.identity, "admin logged in");
        Ok(AdminGrant { session, token })
    }

    /// Live session for `token`, if any. Expired rows are dropped on the way.
    pub fn resolve_session(
        &self,
        token: &SessionToken,
        now: MonotonicTimeNs,
    ) -> Option<AdminSession> {
        let digest = session_token_digest(token);
        let session = match self.sessions.session_row(&digest) {
            Ok(session) => session?,
            Err(err) => {
                tracing::error!(error = %err, "admin session lookup failed");
                return None;
            }
        };
        match session.state_at(now) {
            AdminSessionState::Active => Some(session),
            AdminSessionState::Unauthenticated => {
                if let Err(err) = self.sessions.remove_session_row(&digest) {
                    tracing::warn!(error = %err, "expired admin session could not be dropped");
                }
                None
            }
        }
    }

    pub fn is_authorized(&self, token: &SessionToken, now: MonotonicTimeNs) -> bool {
        self.resolve_session(token, now).is_some()
    }

    /// Idempotent. Returns the identity whose session was ended, if one was live.
    pub fn end_session(&self, token: &SessionToken) -> Option<AdminIdentity> {
        let digest = session_token_digest(token);
        let identity = self
            .sessions
            .session_row(&digest)
            .ok()
            .flatten()
            .map(|session| session.identity);
        if let Err(err) = self.sessions.remove_session_row(&digest) {
            tracing::warn!(error = %err, "admin session could not be removed");
        }
        if let Some(identity) = &identity {
            tracing::info!(admin = %identity, "admin logged out");
        }
        identity
    }

    pub fn active_session_count(&self, now: MonotonicTimeNs) -> usize {
        self.sessions.active_session_count(now).unwrap_or(0)
    }
}
