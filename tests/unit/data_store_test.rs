//! Unit tests for the SQLite-backed login store and its published list.

use std::sync::Arc;
use std::time::Duration;

use lockbox::database::Database;
use lockbox::services::data_store::{CredentialSource, DataStore};
use lockbox::services::dispatcher::Dispatcher;
use lockbox::types::action::DataStoreAction;
use lockbox::types::errors::StoreError;
use tempfile::TempDir;

fn setup() -> DataStore {
    let db = Arc::new(Database::open_in_memory().expect("open_in_memory failed"));
    DataStore::new(db, "master-password")
}

fn unlocked() -> DataStore {
    let store = setup();
    assert!(store.unlock().unwrap(), "first unlock should succeed");
    store
}

// ─── Locking ───

#[test]
fn test_new_store_is_locked() {
    let store = setup();
    assert!(!store.is_unlocked());
    assert!(store.list().borrow().is_none());
    assert!(matches!(store.list_logins(), Err(StoreError::Locked)));
    assert!(matches!(store.add("https://example.com", "u", "p"), Err(StoreError::Locked)));
}

#[test]
fn test_unlock_publishes_and_lock_clears() {
    let store = setup();
    let rx = store.list();
    assert!(store.unlock().unwrap());
    assert!(store.is_unlocked());
    assert_eq!(rx.borrow().as_ref().map(|l| l.len()), Some(0));

    store.lock();
    assert!(!store.is_unlocked());
    assert!(rx.borrow().is_none());
}

#[test]
fn test_wrong_master_password_stays_locked() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lockbox.db");

    {
        let store = DataStore::new(Arc::new(Database::open(&path).unwrap()), "right");
        assert!(store.unlock().unwrap());
        store.add("https://example.com", "alice", "s3cret").unwrap();
    }

    let wrong = DataStore::new(Arc::new(Database::open(&path).unwrap()), "wrong");
    assert!(!wrong.unlock().unwrap());
    assert!(!wrong.is_unlocked());

    let right = DataStore::new(Arc::new(Database::open(&path).unwrap()), "right");
    assert!(right.unlock().unwrap());
    assert_eq!(right.list_logins().unwrap()[0].password, "s3cret");
}

// ─── Logins ───

#[test]
fn test_add_get_list() {
    let store = unlocked();
    let b = store.add("https://b.example.com", "bob", "pw-b").unwrap();
    let a = store.add("https://a.example.com", "alice", "pw-a").unwrap();

    let login = store.get(&a).unwrap();
    assert_eq!(login.hostname, "https://a.example.com");
    assert_eq!(login.username, "alice");
    assert_eq!(login.password, "pw-a");
    assert_eq!(login.times_used, 0);
    assert!(login.time_created > 0);

    let ids: Vec<String> = store.list_logins().unwrap().iter().map(|l| l.id.clone()).collect();
    assert_eq!(ids, vec![a, b], "ordered by hostname");
}

#[test]
fn test_passwords_are_sealed_at_rest() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let store = DataStore::new(db.clone(), "master-password");
    store.unlock().unwrap();
    let id = store.add("https://example.com", "alice", "plaintext-secret").unwrap();

    let stored: Vec<u8> = db
        .connection()
        .query_row("SELECT encrypted_password FROM logins WHERE id = ?1", [&id], |row| row.get(0))
        .unwrap();
    assert_ne!(stored, b"plaintext-secret".to_vec());
}

#[test]
fn test_update_username_and_password() {
    let store = unlocked();
    let id = store.add("https://example.com", "alice", "old").unwrap();
    let before = store.get(&id).unwrap();

    store.update(&id, Some("alice2"), None).unwrap();
    let renamed = store.get(&id).unwrap();
    assert_eq!(renamed.username, "alice2");
    assert_eq!(renamed.password, "old");

    store.update(&id, None, Some("new")).unwrap();
    let changed = store.get(&id).unwrap();
    assert_eq!(changed.password, "new");
    assert!(changed.time_password_changed >= before.time_password_changed);
}

#[test]
fn test_missing_ids_are_not_found() {
    let store = unlocked();
    assert!(matches!(store.get("nope"), Err(StoreError::NotFound(_))));
    assert!(matches!(store.update("nope", Some("x"), None), Err(StoreError::NotFound(_))));
    assert!(matches!(store.touch("nope"), Err(StoreError::NotFound(_))));
    assert!(matches!(store.delete("nope"), Err(StoreError::NotFound(_))));
}

#[test]
fn test_touch_counts_usage() {
    let store = unlocked();
    let id = store.add("https://example.com", "alice", "pw").unwrap();
    store.touch(&id).unwrap();
    store.touch(&id).unwrap();
    let login = store.get(&id).unwrap();
    assert_eq!(login.times_used, 2);
    assert!(login.time_last_used > 0);
}

#[test]
fn test_changes_are_republished() {
    let store = unlocked();
    let rx = store.list();
    let id = store.add("https://example.com", "alice", "pw").unwrap();
    assert_eq!(rx.borrow().as_ref().map(|l| l.len()), Some(1));

    store.delete(&id).unwrap();
    assert_eq!(rx.borrow().as_ref().map(|l| l.len()), Some(0));
}

#[test]
fn test_reset_wipes_and_locks() {
    let store = unlocked();
    store.add("https://example.com", "alice", "pw").unwrap();
    store.reset().unwrap();
    assert!(!store.is_unlocked());

    assert!(store.unlock().unwrap(), "fresh store accepts the master password again");
    assert!(store.list_logins().unwrap().is_empty());
}

#[test]
fn test_lock_racing_touch_never_leaves_list_published() {
    for round in 0..5 {
        let store = Arc::new(unlocked());
        let ids: Vec<String> = (0..60)
            .map(|i| store.add(&format!("https://site{}.example.com", i), "u", "pw").unwrap())
            .collect();

        let toucher = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for id in &ids {
                    let _ = store.touch(id);
                }
            })
        };
        std::thread::sleep(Duration::from_millis(2));
        store.lock();
        toucher.join().unwrap();

        assert!(!store.is_unlocked());
        assert!(
            store.list().borrow().is_none(),
            "round {}: list still published after lock",
            round
        );
    }
}

#[test]
fn test_unreadable_row_is_skipped_on_unlock() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let store = DataStore::new(db.clone(), "master-password");
    store.unlock().unwrap();
    let good = store.add("https://example.com", "alice", "pw-a").unwrap();
    let bad = store.add("https://example.org", "bob", "pw-b").unwrap();
    store.lock();

    db.connection()
        .execute("UPDATE logins SET auth_tag = zeroblob(16) WHERE id = ?1", [&bad])
        .unwrap();

    assert!(store.unlock().unwrap());
    let published = store.list().borrow().clone().expect("list published");
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].id, good);
    assert!(store.unlock().unwrap());
}

#[test]
fn test_failed_unlock_leaves_store_locked() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let store = DataStore::new(db.clone(), "master-password");
    store.unlock().unwrap();
    store.lock();

    db.connection().execute("DROP TABLE logins", []).unwrap();
    assert!(matches!(store.unlock(), Err(StoreError::DatabaseError(_))));
    assert!(!store.is_unlocked(), "key must not be installed after a failed unlock");
    assert!(store.list().borrow().is_none());
    assert!(store.unlock().is_err(), "retry re-runs the unlock instead of short-circuiting");
}

// ─── Sealed backups ───

#[test]
fn test_export_import_restores_deleted_login() {
    let store = unlocked();
    let id = store.add("https://example.com", "alice", "pw").unwrap();
    let backup = store.export_sealed().unwrap();
    assert_eq!(backup.len(), 1);
    assert_ne!(backup[0].encrypted_password, b"pw".to_vec());

    store.delete(&id).unwrap();
    assert_eq!(store.import_sealed(&backup).unwrap(), 1);
    assert_eq!(store.get(&id).unwrap().password, "pw");
}

#[test]
fn test_import_rejects_rows_from_another_key() {
    let source = unlocked();
    source.add("https://example.com", "alice", "pw").unwrap();
    let backup = source.export_sealed().unwrap();

    let other = DataStore::new(Arc::new(Database::open_in_memory().unwrap()), "master-password");
    other.unlock().unwrap();
    assert!(matches!(other.import_sealed(&backup), Err(StoreError::CryptoError(_))));
    assert!(other.list_logins().unwrap().is_empty(), "nothing written");
}

#[test]
fn test_export_requires_unlock() {
    assert!(matches!(setup().export_sealed(), Err(StoreError::Locked)));
}

// ─── Actions ───

#[test]
fn test_apply_actions() {
    let store = setup();
    store.apply(&DataStoreAction::Unlock).unwrap();
    assert!(store.is_unlocked());

    let id = store.add("https://example.com", "alice", "pw").unwrap();
    store.apply(&DataStoreAction::Touch(id.clone())).unwrap();
    assert_eq!(store.get(&id).unwrap().times_used, 1);

    store.apply(&DataStoreAction::Delete(id.clone())).unwrap();
    assert!(matches!(store.get(&id), Err(StoreError::NotFound(_))));

    store.apply(&DataStoreAction::Lock).unwrap();
    assert!(!store.is_unlocked());
}

#[tokio::test]
async fn test_listen_applies_dispatched_actions() {
    let store = Arc::new(setup());
    let dispatcher = Dispatcher::new();
    let listener = store.listen(&dispatcher);
    let mut rx = store.list();

    dispatcher.dispatch(DataStoreAction::Unlock);
    tokio::time::timeout(Duration::from_secs(30), rx.wait_for(Option::is_some))
        .await
        .expect("unlock not published in time")
        .unwrap();
    assert!(store.is_unlocked());

    dispatcher.dispatch(DataStoreAction::Lock);
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(Option::is_none))
        .await
        .expect("lock not published in time")
        .unwrap();

    listener.abort();
}
