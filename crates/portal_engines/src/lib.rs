#![forbid(unsafe_code)]

pub mod credentials;
pub mod session_token;

pub use credentials::{CredentialVerifier, PlaintextCredentialVerifier, Sha256CredentialVerifier};
pub use session_token::{mint_session_token, session_token_digest, sha256_hex};
