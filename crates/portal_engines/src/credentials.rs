#![forbid(unsafe_code)]

use portal_contracts::admin::{AdminCredentials, AdminIdentity};

use crate::session_token::sha256_hex;

/// Pluggable admin credential check. Implementations return the verified
/// identity, or `None` without saying which part was wrong.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, credentials: &AdminCredentials) -> Option<AdminIdentity>;
    fn backend_label(&self) -> &'static str;
}

/// Single fixed operator identity compared as exact strings.
#[derive(Clone)]
pub struct PlaintextCredentialVerifier {
    identity: AdminIdentity,
    password: String,
}

impl PlaintextCredentialVerifier {
    pub fn new(identity: AdminIdentity, password: impl Into<String>) -> Self {
        Self {
            identity,
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for PlaintextCredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaintextCredentialVerifier")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl CredentialVerifier for PlaintextCredentialVerifier {
    fn verify(&self, credentials: &AdminCredentials) -> Option<AdminIdentity> {
        let username_ok = credentials.username == self.identity.as_str();
        let password_ok = credentials.password == self.password;
        (username_ok & password_ok).then(|| self.identity.clone())
    }

    fn backend_label(&self) -> &'static str {
        "plaintext"
    }
}

/// Same operator identity, but only the SHA-256 hex of the password is configured.
#[derive(Debug, Clone)]
pub struct Sha256CredentialVerifier {
    identity: AdminIdentity,
    password_sha256_hex: String,
}

impl Sha256CredentialVerifier {
    /// Returns `None` when `password_sha256_hex` is not 64 hex characters.
    pub fn new(identity: AdminIdentity, password_sha256_hex: &str) -> Option<Self> {
        let normalized = password_sha256_hex.trim().to_ascii_lowercase();
        if normalized.len() != 64 || !normalized.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self {
            identity,
            password_sha256_hex: normalized,
        })
    }
}

impl CredentialVerifier for Sha256CredentialVerifier {
    fn verify(&self, credentials: &AdminCredentials) -> Option<AdminIdentity> {
        let username_ok = credentials.username == self.identity.as_str();
        let candidate = sha256_hex(credentials.password.as_bytes());
        let password_ok = fixed_time_eq(candidate.as_bytes(), self.password_sha256_hex.as_bytes());
        (username_ok & password_ok).then(|| self.identity.clone())
    }

    fn backend_label(&self) -> &'static str {
        "sha256"
    }
}

fn fixed_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
