#![forbid(unsafe_code)]

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use portal_contracts::admin::AdminIdentity;
use portal_engines::{CredentialVerifier, PlaintextCredentialVerifier, Sha256CredentialVerifier};
use portal_os::admin_gate::AdminGateConfig;
use portal_storage::visitor_log::default_visitor_log_path;

use crate::telemetry::LogFormat;

const DEFAULT_BIND: &str = "0.0.0.0:5000";
const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_SESSION_LIFETIME_SECS: u64 = 3_600;

#[derive(Clone, PartialEq, Eq)]
pub enum AdminSecret {
    Plaintext(String),
    Sha256Hex(String),
}

#[derive(Clone)]
pub struct PortalConfig {
    pub bind: SocketAddr,
    pub data_path: PathBuf,
    pub admin_username: String,
    pub admin_secret: AdminSecret,
    pub session_lifetime_secs: u64,
    pub cookie_secure: bool,
    pub log_filter: String,
    pub log_format: LogFormat,
}

impl std::fmt::Debug for PortalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let secret_kind = match self.admin_secret {
            AdminSecret::Plaintext(_) => "plaintext",
            AdminSecret::Sha256Hex(_) => "sha256",
        };
        f.debug_struct("PortalConfig")
            .field("bind", &self.bind)
            .field("data_path", &self.data_path)
            .field("admin_username", &self.admin_username)
            .field("admin_secret", &secret_kind)
            .field("session_lifetime_secs", &self.session_lifetime_secs)
            .field("cookie_secure", &self.cookie_secure)
            .field("log_filter", &self.log_filter)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl PortalConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_env_var_map(|key| env::var(key).ok())
    }

    pub fn from_env_var_map<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_raw = var("PORTAL_HTTP_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind_raw
            .parse()
            .map_err(|err| format!("invalid PORTAL_HTTP_BIND '{bind_raw}': {err}"))?;

        let data_path = var("PORTAL_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_visitor_log_path(var("HOME").as_deref()));

        let admin_username =
            var("PORTAL_ADMIN_USERNAME").unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string());

        // Raw lookup: leading/trailing spaces may be part of a password.
        let admin_secret = match (
            var("PORTAL_ADMIN_PASSWORD_SHA256"),
            lookup("PORTAL_ADMIN_PASSWORD").filter(|v| !v.is_empty()),
        ) {
            (Some(digest), _) => AdminSecret::Sha256Hex(digest),
            (None, Some(password)) => AdminSecret::Plaintext(password),
            (None, None) => {
                return Err(
                    "admin credential missing: set PORTAL_ADMIN_PASSWORD or PORTAL_ADMIN_PASSWORD_SHA256"
                        .to_string(),
                )
            }
        };

        let session_lifetime_secs = match var("PORTAL_SESSION_LIFETIME_SECS") {
            None => DEFAULT_SESSION_LIFETIME_SECS,
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|v| (60..=86_400).contains(v))
                .ok_or_else(|| {
                    format!("invalid PORTAL_SESSION_LIFETIME_SECS '{raw}': expected 60..=86400")
                })?,
        };

        let cookie_secure = var("PORTAL_COOKIE_SECURE")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        let log_filter = var("PORTAL_LOG")
            .or_else(|| var("RUST_LOG"))
            .unwrap_or_else(|| "info".to_string());
        let log_format = match var("PORTAL_LOG_FORMAT") {
            None => LogFormat::Text,
            Some(raw) => LogFormat::parse(&raw).ok_or_else(|| {
                format!("invalid PORTAL_LOG_FORMAT '{raw}': expected text or json")
            })?,
        };

        Ok(Self {
            bind,
            data_path,
            admin_username,
            admin_secret,
            session_lifetime_secs,
            cookie_secure,
            log_filter,
            log_format,
        })
    }

    pub fn gate_config(&self) -> Result<AdminGateConfig, String> {
        AdminGateConfig::with_lifetime_secs(self.session_lifetime_secs)
            .map_err(|err| format!("invalid session lifetime: {err}"))
    }

    pub fn credential_verifier(&self) -> Result<Box<dyn CredentialVerifier>, String> {
        let identity = AdminIdentity::new(self.admin_username.clone())
            .map_err(|err| format!("invalid PORTAL_ADMIN_USERNAME: {err}"))?;
        match &self.admin_secret {
            AdminSecret::Plaintext(password) => Ok(Box::new(PlaintextCredentialVerifier::new(
                identity,
                password.clone(),
            ))),
            AdminSecret::Sha256Hex(digest) => Sha256CredentialVerifier::new(identity, digest)
                .map(|v| Box::new(v) as Box<dyn CredentialVerifier>)
                .ok_or_else(|| {
                    "invalid PORTAL_ADMIN_PASSWORD_SHA256: expected 64 hex characters".to_string()
                }),
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}
