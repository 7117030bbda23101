#![forbid(unsafe_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use portal_contracts::admin::{AdminCredentials, AuthError, SessionToken};
use portal_contracts::visitor::{RequestOrigin, VisitorRecord, VisitorSubmission};
use portal_contracts::MonotonicTimeNs;
use portal_os::admin_gate::{AdminGrant, AdminSessionGate};
use portal_os::registration::{RegistrationDesk, RegistrationError};
use portal_storage::visitor_log::JsonFileVisitorLog;
use portal_storage::VisitorListing;

pub mod config;
pub mod http;
pub mod session_cookie;
pub mod telemetry;

pub use config::PortalConfig;
pub use http::{build_router, serve};

pub mod app_ui_assets {
    pub const PORTAL_HTML: &str = include_str!("web/portal.html");
    pub const SUCCESS_HTML: &str = include_str!("web/success.html");
    pub const TERMS_HTML: &str = include_str!("web/terms.html");
    pub const PRIVACY_HTML: &str = include_str!("web/privacy.html");
    pub const ADMIN_LOGIN_HTML: &str = include_str!("web/admin_login.html");
    pub const ADMIN_DASHBOARD_HTML: &str = include_str!("web/admin_dashboard.html");
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AdminLoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalActionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

impl PortalActionResponse {
    pub fn ok(message: Option<&str>, redirect_url: &str) -> Self {
        Self {
            success: true,
            message: message.map(str::to_string),
            redirect_url: Some(redirect_url.to_string()),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            redirect_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VisitorListResponse {
    pub success: bool,
    pub count: usize,
    pub users: Vec<VisitorRecord>,
    /// True when the log could not be read and `users` is empty for that reason.
    pub degraded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<VisitorListing> for VisitorListResponse {
    fn from(listing: VisitorListing) -> Self {
        Self {
            success: true,
            count: listing.records.len(),
            degraded: listing.degraded.is_some(),
            reason: listing.degraded,
            users: listing.records,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PortalHealthResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visitors: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_admin_sessions: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Everything the HTTP surface needs, shared across requests behind an `Arc`.
/// Internals synchronize themselves, so no outer lock is held across handlers.
pub struct PortalRuntime {
    desk: RegistrationDesk,
    gate: AdminSessionGate,
    cookie_secure: bool,
}

impl PortalRuntime {
    pub fn new(desk: RegistrationDesk, gate: AdminSessionGate, cookie_secure: bool) -> Self {
        Self {
            desk,
            gate,
            cookie_secure,
        }
    }

    pub fn from_config(config: &PortalConfig) -> Result<Self, String> {
        let log = JsonFileVisitorLog::open(config.data_path.clone()).map_err(|err| {
            format!(
                "failed to open visitor log '{}': {}",
                config.data_path.display(),
                err
            )
        })?;
        let desk = RegistrationDesk::new(Arc::new(log));
        let gate = AdminSessionGate::with_in_memory_sessions(
            config.gate_config()?,
            config.credential_verifier()?,
        );
        Ok(Self::new(desk, gate, config.cookie_secure))
    }

    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }

    pub fn credential_backend(&self) -> &'static str {
        self.gate.credential_backend()
    }

    pub fn session_lifetime_secs(&self) -> u64 {
        self.gate.config().session_lifetime_secs()
    }

    pub fn register_visitor(
        &self,
        submission: VisitorSubmission,
        origin: &RequestOrigin,
    ) -> Result<(), RegistrationError> {
        self.desk.register(submission, origin)
    }

    pub fn admin_login(&self, request: AdminLoginRequest) -> Result<AdminGrant, AuthError> {
        let credentials = AdminCredentials::new(request.username, request.password);
        self.gate.authenticate(&credentials, now_monotonic())
    }

    pub fn admin_logout(&self, token: Option<&SessionToken>) {
        if let Some(token) = token {
            self.gate.end_session(token);
        }
    }

    pub fn is_admin(&self, token: Option<&SessionToken>) -> bool {
        token.is_some_and(|token| self.gate.is_authorized(token, now_monotonic()))
    }

    pub fn admin_visitor_listing(&self, token: Option<&SessionToken>) -> Option<VisitorListing> {
        self.desk
            .admin_visitor_listing(&self.gate, token, now_monotonic())
    }

    pub fn health_report(&self) -> PortalHealthResponse {
        let active_admin_sessions = Some(self.gate.active_session_count(now_monotonic()));
        match self.desk.log_health() {
            Ok(count) => PortalHealthResponse {
                status: "healthy".to_string(),
                visitors: Some(count),
                active_admin_sessions,
                reason: None,
            },
            Err(err) => {
                tracing::error!(
                    store = %self.desk.log_label(),
                    error = %err,
                    "health check found visitor log unreadable"
                );
                PortalHealthResponse {
                    status: "degraded".to_string(),
                    visitors: None,
                    active_admin_sessions,
                    reason: Some(err.to_string()),
                }
            }
        }
    }
}

pub fn request_origin(peer: Option<SocketAddr>, user_agent: Option<&str>) -> RequestOrigin {
    let source_address = peer
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    RequestOrigin::new(source_address, user_agent)
}

fn now_monotonic() -> MonotonicTimeNs {
    MonotonicTimeNs(system_time_now_ns())
}

fn system_time_now_ns() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(1);
    if nanos > u64::MAX as u128 {
        u64::MAX
    } else {
        nanos as u64
    }
}
