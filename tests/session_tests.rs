use uuid::Uuid;

use userdesk::session::{ClientSession, SessionStore, SessionUser};

fn temp_session_path() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("userdesk_session_{}.json", Uuid::now_v7()))
}

fn sample_session() -> ClientSession {
    ClientSession {
        token: "header.payload.signature".to_string(),
        user: SessionUser {
            id: Uuid::now_v7(),
            email: "alice@test.com".to_string(),
            is_admin: false,
        },
    }
}

#[test]
fn save_then_load_roundtrips() {
    let path = temp_session_path();
    let store = SessionStore::new(&path);
    let session = sample_session();

    store.save(&session).unwrap();
    let loaded = store.load().unwrap();
    assert_eq!(loaded, Some(session));

    store.clear().unwrap();
}

#[test]
fn load_without_saved_session_is_none() {
    let store = SessionStore::new(temp_session_path());
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn corrupt_session_file_is_treated_as_logged_out() {
    let path = temp_session_path();
    std::fs::write(&path, "{ not json").unwrap();

    let store = SessionStore::new(&path);
    assert_eq!(store.load().unwrap(), None);

    store.clear().unwrap();
}

#[test]
fn clear_removes_session_and_is_idempotent() {
    let path = temp_session_path();
    let store = SessionStore::new(&path);

    store.save(&sample_session()).unwrap();
    store.clear().unwrap();
    assert_eq!(store.load().unwrap(), None);

    // Clearing an already-clear store is not an error
    store.clear().unwrap();
}
