#![forbid(unsafe_code)]

use std::sync::Arc;

use portal_adapter::{serve, PortalRuntime};
use portal_contracts::admin::AdminIdentity;
use portal_engines::PlaintextCredentialVerifier;
use portal_os::admin_gate::{AdminGateConfig, AdminSessionGate};
use portal_os::registration::RegistrationDesk;
use portal_storage::visitor_log::InMemoryVisitorLog;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

struct RawResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl RawResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("json body")
    }
}

async fn start_portal() -> std::net::SocketAddr {
    let runtime = PortalRuntime::new(
        RegistrationDesk::new(Arc::new(InMemoryVisitorLog::new())),
        AdminSessionGate::with_in_memory_sessions(
            AdminGateConfig::mvp_v1(),
            Box::new(PlaintextCredentialVerifier::new(
                AdminIdentity::new("admin").unwrap(),
                "pw",
            )),
        ),
        false,
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(
        listener,
        Arc::new(runtime),
        std::future::pending::<()>(),
    ));
    addr
}

async fn send_raw(
    addr: std::net::SocketAddr,
    method: &str,
    path: &str,
    cookie: Option<&str>,
    body: Option<&str>,
) -> RawResponse {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let mut request = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nUser-Agent: portal-test\r\nConnection: close\r\n"
    );
    if let Some(cookie) = cookie {
        request.push_str(&format!("Cookie: {cookie}\r\n"));
    }
    let body = body.unwrap_or("");
    if !body.is_empty() {
        request.push_str("Content-Type: application/json\r\n");
    }
    request.push_str(&format!("Content-Length: {}\r\n\r\n{body}", body.len()));
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8_lossy(&raw).to_string();
    let (head, body) = text.split_once("\r\n\r\n").expect("complete response");
    let mut lines = head.lines();
    let status = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
        .expect("status line");
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    RawResponse {
        status,
        headers,
        body: body.to_string(),
    }
}

async fn submit(addr: std::net::SocketAddr, body: &str) -> RawResponse {
    send_raw(addr, "POST", "/api/auth", None, Some(body)).await
}

async fn admin_cookie(addr: std::net::SocketAddr) -> String {
    let response = send_raw(
        addr,
        "POST",
        "/admin/login",
        None,
        Some(r#"{"username":"admin","password":"pw"}"#),
    )
    .await;
    assert_eq!(response.status, 200);
    let set_cookie = response.header("set-cookie").expect("session cookie");
    set_cookie
        .split(';')
        .next()
        .expect("cookie pair")
        .to_string()
}

#[tokio::test]
async fn at_http_01_valid_submission_redirects_to_success() {
    let addr = start_portal().await;
    let response = submit(
        addr,
        r#"{"fullName":"Jane Doe","purpose":"guest","terms":true,"timestamp":"2025-01-01T10:00:00Z"}"#,
    )
    .await;
    assert_eq!(response.status, 200);
    let json = response.json();
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Authentication successful");
    assert_eq!(json["redirectUrl"], "/success");
}

#[tokio::test]
async fn at_http_02_unaccepted_terms_are_rejected() {
    let addr = start_portal().await;
    let response = submit(addr, r#"{"fullName":"Jane Doe","purpose":"guest","terms":false}"#).await;
    assert_eq!(response.status, 400);
    let json = response.json();
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Missing required field: terms");

    let response = send_raw(addr, "POST", "/api/auth", None, Some("{not json")).await;
    assert_eq!(response.status, 400);
}

#[tokio::test]
async fn at_http_03_listing_without_session_redirects_to_login() {
    let addr = start_portal().await;
    for path in ["/api/admin/users", "/api/users", "/admin"] {
        let response = send_raw(addr, "GET", path, None, None).await;
        assert_eq!(response.status, 303, "{path}");
        assert_eq!(response.header("location"), Some("/admin/login"));
    }
}

#[tokio::test]
async fn at_http_04_wrong_password_is_unauthorized() {
    let addr = start_portal().await;
    let response = send_raw(
        addr,
        "POST",
        "/admin/login",
        None,
        Some(r#"{"username":"admin","password":"nope"}"#),
    )
    .await;
    assert_eq!(response.status, 401);
    assert!(response.header("set-cookie").is_none());
    assert_eq!(response.json()["message"], "Invalid credentials");
}

#[tokio::test]
async fn at_http_05_admin_sees_registered_visitor_with_peer_address() {
    let addr = start_portal().await;
    submit(addr, r#"{"fullName":"Jane Doe","purpose":"guest","terms":true}"#).await;
    let cookie = admin_cookie(addr).await;

    let response = send_raw(addr, "GET", "/api/admin/users", Some(&cookie), None).await;
    assert_eq!(response.status, 200);
    let json = response.json();
    assert_eq!(json["success"], true);
    assert_eq!(json["count"], 1);
    assert_eq!(json["degraded"], false);
    let user = &json["users"][0];
    assert_eq!(user["fullName"], "Jane Doe");
    assert_eq!(user["sourceAddress"], "127.0.0.1");
    assert_eq!(user["userAgent"], "portal-test");
    assert!(user["serverTimestamp"].as_str().is_some_and(|ts| !ts.is_empty()));

    let dashboard = send_raw(addr, "GET", "/admin", Some(&cookie), None).await;
    assert_eq!(dashboard.status, 200);
}

#[tokio::test]
async fn at_http_06_logout_ends_admin_access() {
    let addr = start_portal().await;
    let cookie = admin_cookie(addr).await;

    let response = send_raw(addr, "GET", "/admin/logout", Some(&cookie), None).await;
    assert_eq!(response.status, 303);
    assert!(response
        .header("set-cookie")
        .is_some_and(|value| value.contains("Max-Age=0")));

    let response = send_raw(addr, "GET", "/api/admin/users", Some(&cookie), None).await;
    assert_eq!(response.status, 303);
}

#[tokio::test]
async fn at_http_07_health_and_static_pages() {
    let addr = start_portal().await;
    let response = send_raw(addr, "GET", "/health", None, None).await;
    assert_eq!(response.status, 200);
    let json = response.json();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["visitors"], 0);

    let success = send_raw(addr, "GET", "/success", None, None).await;
    assert_eq!(success.status, 200);
    assert!(!success.body.contains("{{timestamp}}"));
    for path in ["/", "/terms", "/privacy", "/admin/login"] {
        assert_eq!(send_raw(addr, "GET", path, None, None).await.status, 200, "{path}");
    }
}

#[tokio::test]
async fn at_http_08_concurrent_submissions_both_persist() {
    let addr = start_portal().await;
    let (alice, bob) = tokio::join!(
        submit(addr, r#"{"fullName":"Alice","purpose":"business","terms":true}"#),
        submit(addr, r#"{"fullName":"Bob","purpose":"personal","terms":true}"#),
    );
    assert_eq!(alice.status, 200);
    assert_eq!(bob.status, 200);

    let cookie = admin_cookie(addr).await;
    let json = send_raw(addr, "GET", "/api/admin/users", Some(&cookie), None)
        .await
        .json();
    assert_eq!(json["count"], 2);
    let mut names: Vec<String> = json["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["fullName"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Alice".to_string(), "Bob".to_string()]);
}

#[tokio::test]
async fn at_http_09_numeric_client_timestamp_is_accepted() {
    let addr = start_portal().await;
    let response = submit(
        addr,
        r#"{"fullName":"Jane","purpose":"guest","terms":true,"timestamp":1735725600000}"#,
    )
    .await;
    assert_eq!(response.status, 200);
    assert_eq!(response.json()["success"], true);

    let cookie = admin_cookie(addr).await;
    let json = send_raw(addr, "GET", "/api/admin/users", Some(&cookie), None)
        .await
        .json();
    assert_eq!(json["users"][0]["submittedAt"], "1735725600000");
}
