#![forbid(unsafe_code)]

use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;

use portal_contracts::visitor::{RequestOrigin, VisitorEntry, VisitorSubmission};
use portal_storage::visitor_log::{InMemoryVisitorLog, JsonFileVisitorLog};
use portal_storage::VisitorLogRepo;

fn entry(name: &str, purpose: &str) -> VisitorEntry {
    VisitorSubmission::v1(name, purpose, true)
        .into_entry()
        .unwrap()
}

fn origin(addr: &str) -> RequestOrigin {
    RequestOrigin::new(addr, Some("Mozilla/5.0 (test)"))
}

fn repos(dir: &tempfile::TempDir) -> Vec<Box<dyn VisitorLogRepo>> {
    vec![
        Box::new(JsonFileVisitorLog::open(dir.path().join("users.json")).unwrap()),
        Box::new(InMemoryVisitorLog::new()),
    ]
}

#[test]
fn at_visitor_db_01_append_grows_log_by_one_with_server_fields() {
    let dir = tempfile::tempdir().unwrap();
    for repo in repos(&dir) {
        let before = repo.load_visitor_rows().unwrap().len();
        repo.append_visitor_row(entry("Jane Doe", "guest"), &origin("192.168.1.20"))
            .unwrap();
        let rows = repo.load_visitor_rows().unwrap();
        assert_eq!(rows.len(), before + 1);

        let last = rows.last().unwrap();
        assert_eq!(last.full_name, "Jane Doe");
        assert_eq!(last.purpose, "guest");
        assert!(last.terms_accepted);
        assert!(!last.server_timestamp.is_empty());
        assert!(last.server_timestamp.contains('T'));
        assert_eq!(last.source_address, "192.168.1.20");
        assert_eq!(last.user_agent, "Mozilla/5.0 (test)");
    }
}

#[test]
fn at_visitor_db_02_sequential_appends_keep_submission_order() {
    let dir = tempfile::tempdir().unwrap();
    for repo in repos(&dir) {
        let names: Vec<String> = (0..12).map(|i| format!("visitor-{i:02}")).collect();
        for name in &names {
            repo.append_visitor_row(entry(name, "business"), &origin("10.0.0.1"))
                .unwrap();
        }
        let stored: Vec<String> = repo
            .load_visitor_rows()
            .unwrap()
            .into_iter()
            .map(|r| r.full_name)
            .collect();
        assert_eq!(stored, names);
    }
}

#[test]
fn at_visitor_db_03_duplicates_are_allowed() {
    let dir = tempfile::tempdir().unwrap();
    for repo in repos(&dir) {
        repo.append_visitor_row(entry("Sam", "guest"), &origin("10.0.0.9"))
            .unwrap();
        repo.append_visitor_row(entry("Sam", "guest"), &origin("10.0.0.9"))
            .unwrap();
        assert_eq!(repo.load_visitor_rows().unwrap().len(), 2);
    }
}

#[test]
fn at_visitor_db_04_concurrent_appends_lose_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(JsonFileVisitorLog::open(dir.path().join("users.json")).unwrap());
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = ["Alice", "Bob"]
        .into_iter()
        .map(|name| {
            let log = Arc::clone(&log);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                log.append_visitor_row(entry(name, "guest"), &origin("10.0.0.2"))
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let mut names: Vec<String> = log
        .load_visitor_rows()
        .unwrap()
        .into_iter()
        .map(|r| r.full_name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["Alice", "Bob"]);
}

#[test]
fn at_visitor_db_05_many_threads_many_appends() {
    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(JsonFileVisitorLog::open(dir.path().join("users.json")).unwrap());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let log = Arc::clone(&log);
            thread::spawn(move || {
                for i in 0..5 {
                    log.append_visitor_row(entry(&format!("t{t}-{i}"), "other"), &origin("::1"))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(log.load_visitor_rows().unwrap().len(), 40);
}

#[test]
fn at_visitor_db_06_reopen_reads_previous_rows_including_legacy_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.json");
    fs::write(
        &path,
        r#"[
  {
    "fullName": "Legacy Guest",
    "purpose": "personal",
    "terms": true,
    "timestamp": "2025-03-01T09:00:00.000Z",
    "server_timestamp": "2025-03-01T09:00:01.123456",
    "ip_address": "172.16.0.4",
    "user_agent": "Safari"
  }
]"#,
    )
    .unwrap();

    let log = JsonFileVisitorLog::open(&path).unwrap();
    log.append_visitor_row(entry("New Guest", "guest"), &origin("172.16.0.5"))
        .unwrap();

    let reopened = JsonFileVisitorLog::open(&path).unwrap();
    let rows = reopened.load_visitor_rows().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].full_name, "Legacy Guest");
    assert_eq!(rows[0].source_address, "172.16.0.4");
    assert_eq!(rows[1].full_name, "New Guest");

    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"sourceAddress\": \"172.16.0.4\""));
}

#[test]
fn at_visitor_db_07_unreadable_log_lists_empty_but_keeps_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.json");
    let log = JsonFileVisitorLog::open(&path).unwrap();
    log.append_visitor_row(entry("Kept", "guest"), &origin("10.0.0.3"))
        .unwrap();
    let good = fs::read_to_string(&path).unwrap();
    fs::write(&path, format!("{good}trailing")).unwrap();

    let listing = log.list_visitor_rows();
    assert!(listing.records.is_empty());
    assert!(listing.degraded.as_deref().unwrap().contains("decode"));

    assert!(log
        .append_visitor_row(entry("Lost?", "guest"), &origin("10.0.0.3"))
        .is_err());
    assert!(fs::read_to_string(&path).unwrap().contains("Kept"));
}

#[test]
fn at_visitor_db_08_checkbox_style_legacy_rows_stay_appendable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.json");
    fs::write(
        &path,
        r#"[{"fullName":"Old","purpose":"guest","terms":"on","timestamp":1735725600000,
             "server_timestamp":"2024-12-01T09:00:00","ip_address":"10.0.0.1","user_agent":"curl"}]"#,
    )
    .unwrap();
    let log = JsonFileVisitorLog::open(&path).unwrap();

    let listing = log.list_visitor_rows();
    assert!(!listing.is_degraded());
    assert_eq!(listing.records.len(), 1);
    assert!(listing.records[0].terms_accepted);

    log.append_visitor_row(entry("New", "business"), &origin("10.0.0.2"))
        .unwrap();
    let rows = log.load_visitor_rows().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].full_name, "Old");
    assert_eq!(rows[0].submitted_at.as_deref(), Some("1735725600000"));
    assert_eq!(rows[1].full_name, "New");
}
