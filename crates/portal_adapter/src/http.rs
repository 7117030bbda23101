#![forbid(unsafe_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use portal_contracts::admin::AuthError;
use portal_contracts::visitor::VisitorSubmission;
use portal_os::registration::RegistrationError;
use tokio::net::TcpListener;

use crate::app_ui_assets::{
    ADMIN_DASHBOARD_HTML, ADMIN_LOGIN_HTML, PORTAL_HTML, PRIVACY_HTML, SUCCESS_HTML, TERMS_HTML,
};
use crate::session_cookie::{extract_session_token, SessionCookie};
use crate::{
    request_origin, AdminLoginRequest, PortalActionResponse, PortalHealthResponse, PortalRuntime,
    VisitorListResponse,
};

pub type SharedRuntime = Arc<PortalRuntime>;

const ADMIN_LOGIN_PATH: &str = "/admin/login";

pub fn build_router(runtime: SharedRuntime) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/success", get(success))
        .route("/terms", get(terms))
        .route("/privacy", get(privacy))
        .route("/admin", get(admin_dashboard))
        .route(ADMIN_LOGIN_PATH, get(admin_login_page).post(admin_login))
        .route("/admin/logout", get(admin_logout))
        .route("/api/auth", post(submit_visitor))
        .route("/api/admin/users", get(list_visitors))
        .route("/api/users", get(list_visitors))
        .route("/health", get(health))
        .with_state(runtime)
}

/// Serves until `shutdown` resolves. Peer addresses are captured for visitor records.
pub async fn serve<F>(
    listener: TcpListener,
    runtime: SharedRuntime,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(runtime).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn index() -> Html<&'static str> {
    Html(PORTAL_HTML)
}

async fn success() -> Html<String> {
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    Html(SUCCESS_HTML.replace("{{timestamp}}", &timestamp))
}

async fn terms() -> Html<&'static str> {
    Html(TERMS_HTML)
}

async fn privacy() -> Html<&'static str> {
    Html(PRIVACY_HTML)
}

async fn admin_login_page() -> Html<&'static str> {
    Html(ADMIN_LOGIN_HTML)
}

async fn admin_dashboard(State(runtime): State<SharedRuntime>, headers: HeaderMap) -> Response {
    let token = extract_session_token(&headers);
    if !runtime.is_admin(token.as_ref()) {
        return Redirect::to(ADMIN_LOGIN_PATH).into_response();
    }
    Html(ADMIN_DASHBOARD_HTML).into_response()
}

async fn admin_login(
    State(runtime): State<SharedRuntime>,
    payload: Result<Json<AdminLoginRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "malformed admin login body");
            return (
                StatusCode::BAD_REQUEST,
                Json(PortalActionResponse::failed("Invalid request body")),
            )
                .into_response();
        }
    };
    match runtime.admin_login(request) {
        Ok(grant) => {
            let cookie = SessionCookie::new(
                &grant.token,
                runtime.session_lifetime_secs(),
                runtime.cookie_secure(),
            );
            (
                StatusCode::OK,
                [(header::SET_COOKIE, cookie.to_header_value())],
                Json(PortalActionResponse::ok(None, "/admin")),
            )
                .into_response()
        }
        Err(AuthError::InvalidCredentials) => (
            StatusCode::UNAUTHORIZED,
            Json(PortalActionResponse::failed(
                AuthError::InvalidCredentials.to_string(),
            )),
        )
            .into_response(),
        Err(err @ AuthError::SessionUnavailable) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(PortalActionResponse::failed(err.to_string())),
        )
            .into_response(),
    }
}

async fn admin_logout(State(runtime): State<SharedRuntime>, headers: HeaderMap) -> Response {
    let token = extract_session_token(&headers);
    runtime.admin_logout(token.as_ref());
    let cleared = SessionCookie::clear(runtime.cookie_secure());
    (
        [(header::SET_COOKIE, cleared.to_header_value())],
        Redirect::to(ADMIN_LOGIN_PATH),
    )
        .into_response()
}

async fn submit_visitor(
    State(runtime): State<SharedRuntime>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<VisitorSubmission>, JsonRejection>,
) -> (StatusCode, Json<PortalActionResponse>) {
    let submission = match payload {
        Ok(Json(submission)) => submission,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "malformed visitor submission body");
            return (
                StatusCode::BAD_REQUEST,
                Json(PortalActionResponse::failed("Invalid request body")),
            );
        }
    };
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok());
    let origin = request_origin(peer.map(|ConnectInfo(addr)| addr), user_agent);

    let result =
        tokio::task::spawn_blocking(move || runtime.register_visitor(submission, &origin)).await;
    match result {
        Ok(Ok(())) => (
            StatusCode::OK,
            Json(PortalActionResponse::ok(
                Some("Authentication successful"),
                "/success",
            )),
        ),
        Ok(Err(RegistrationError::Validation(err))) => (
            StatusCode::BAD_REQUEST,
            Json(PortalActionResponse::failed(err.to_string())),
        ),
        Ok(Err(RegistrationError::Storage(_))) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(PortalActionResponse::failed("Failed to save user data")),
        ),
        Err(err) => {
            tracing::error!(error = %err, "visitor registration task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(PortalActionResponse::failed("Internal server error")),
            )
        }
    }
}

async fn list_visitors(State(runtime): State<SharedRuntime>, headers: HeaderMap) -> Response {
    let token = extract_session_token(&headers);
    let result =
        tokio::task::spawn_blocking(move || runtime.admin_visitor_listing(token.as_ref())).await;
    match result {
        Ok(Some(listing)) => Json(VisitorListResponse::from(listing)).into_response(),
        Ok(None) => Redirect::to(ADMIN_LOGIN_PATH).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "visitor listing task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(PortalActionResponse::failed("Failed to fetch users")),
            )
                .into_response()
        }
    }
}

async fn health(State(runtime): State<SharedRuntime>) -> Response {
    match tokio::task::spawn_blocking(move || runtime.health_report()).await {
        Ok(report) => Json(report).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "health check task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(PortalHealthResponse {
                    status: "degraded".to_string(),
                    visitors: None,
                    active_admin_sessions: None,
                    reason: Some("health check task failed".to_string()),
                }),
            )
                .into_response()
        }
    }
}
