#![forbid(unsafe_code)]

use portal_contracts::admin::{AdminIdentity, AdminSession};
use portal_contracts::MonotonicTimeNs;
use portal_storage::admin_sessions::InMemoryAdminSessionStore;
use portal_storage::{AdminSessionRepo, StorageError};

const HOUR_NS: u64 = 3_600_000_000_000;

fn session(at: u64) -> AdminSession {
    AdminSession::v1(AdminIdentity::new("admin").unwrap(), MonotonicTimeNs(at), HOUR_NS)
}

#[test]
fn at_session_db_01_insert_get_remove() {
    let store = InMemoryAdminSessionStore::new();
    store
        .insert_session_row("digest_a".to_string(), session(1))
        .unwrap();
    assert_eq!(
        store
            .session_row("digest_a")
            .unwrap()
            .unwrap()
            .identity
            .as_str(),
        "admin"
    );
    assert!(store.remove_session_row("digest_a").unwrap());
    assert!(store.session_row("digest_a").unwrap().is_none());
    assert!(!store.remove_session_row("digest_a").unwrap());
}

#[test]
fn at_session_db_02_duplicate_digest_is_rejected() {
    let store = InMemoryAdminSessionStore::new();
    store
        .insert_session_row("digest_a".to_string(), session(1))
        .unwrap();
    let err = store
        .insert_session_row("digest_a".to_string(), session(2))
        .unwrap_err();
    assert_eq!(
        err,
        StorageError::DuplicateKey {
            table: "admin_sessions",
            key: "digest_a".to_string(),
        }
    );
}

#[test]
fn at_session_db_03_purge_drops_only_expired_rows() {
    let store = InMemoryAdminSessionStore::new();
    store
        .insert_session_row("old".to_string(), session(1))
        .unwrap();
    store
        .insert_session_row("new".to_string(), session(HOUR_NS))
        .unwrap();

    let now = MonotonicTimeNs(HOUR_NS + 1);
    assert_eq!(store.active_session_count(now).unwrap(), 1);
    assert_eq!(store.purge_expired_session_rows(now).unwrap(), 1);
    assert!(store.session_row("old").unwrap().is_none());
    assert!(store.session_row("new").unwrap().is_some());
}
