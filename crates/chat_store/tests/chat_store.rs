use std::fs;
use std::path::PathBuf;

use assert_matches::assert_matches;
use chat_provider::ChatMessage;
use chat_store::{
    load_conversation, save_conversation, CredentialRecord, CredentialStore, FileCredentialStore,
    StoreError,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;

fn temp_path(name: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join(name);
    (dir, path)
}

#[test]
fn conversation_round_trips_through_history_file() {
    let (_dir, path) = temp_path("history.json");
    let conversation = vec![
        ChatMessage::user("how do I list files?"),
        ChatMessage::assistant("Use `ls -la`."),
        ChatMessage::user("and hidden ones?\nwith unicode: ✓"),
        ChatMessage::assistant(""),
    ];

    save_conversation(&path, &conversation).expect("save should succeed");
    let loaded = load_conversation(Some(path.as_path())).expect("load should succeed");

    assert_eq!(loaded, conversation);
}

#[test]
fn load_of_missing_history_file_is_empty() {
    let (_dir, path) = temp_path("never-written.json");

    let loaded = load_conversation(Some(path.as_path())).expect("missing file is not an error");
    assert!(loaded.is_empty());
    assert!(!path.exists());
}

#[test]
fn load_without_history_path_is_empty() {
    let loaded = load_conversation(None).expect("unset path is not an error");
    assert!(loaded.is_empty());
}

#[test]
fn load_of_blank_history_file_is_empty() {
    let (_dir, path) = temp_path("blank.json");
    fs::write(&path, "  \n").expect("write blank file");

    assert!(load_conversation(Some(path.as_path())).expect("blank file").is_empty());
}

#[test]
fn history_file_uses_role_content_wire_format() {
    let (_dir, path) = temp_path("history.json");
    save_conversation(
        &path,
        &[ChatMessage::user("a"), ChatMessage::assistant("b")],
    )
    .expect("save should succeed");

    let raw: Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("valid JSON");
    assert_eq!(
        raw,
        json!([
            {"role": "user", "content": "a"},
            {"role": "assistant", "content": "b"},
        ])
    );
}

#[test]
fn save_replaces_previous_history_entirely() {
    let (_dir, path) = temp_path("history.json");
    save_conversation(
        &path,
        &[
            ChatMessage::user("old question"),
            ChatMessage::assistant("old answer"),
            ChatMessage::user("another"),
        ],
    )
    .expect("first save");
    save_conversation(&path, &[ChatMessage::user("new")]).expect("second save");

    assert_eq!(
        load_conversation(Some(path.as_path())).expect("load"),
        vec![ChatMessage::user("new")]
    );
}

#[test]
fn save_creates_missing_parent_directories() {
    let (_dir, path) = temp_path("nested/deeper/history.json");
    save_conversation(&path, &[ChatMessage::user("x")]).expect("save should create parents");
    assert!(path.exists());
}

#[test]
fn save_rejects_system_messages_without_touching_file() {
    let (_dir, path) = temp_path("history.json");
    save_conversation(&path, &[ChatMessage::user("keep me")]).expect("seed history");

    let error = save_conversation(
        &path,
        &[ChatMessage::system("prompt"), ChatMessage::user("x")],
    )
    .expect_err("system message must be rejected");

    assert_matches!(error, StoreError::SystemMessageInHistory { index: 0, .. });
    assert_eq!(
        load_conversation(Some(path.as_path())).expect("load"),
        vec![ChatMessage::user("keep me")]
    );
}

#[test]
fn load_rejects_system_role_entries() {
    let (_dir, path) = temp_path("history.json");
    fs::write(&path, r#"[{"role":"system","content":"prompt"}]"#).expect("write file");

    let error = load_conversation(Some(path.as_path())).expect_err("system role must be rejected");
    assert_matches!(error, StoreError::JsonParse { .. });
}

#[test]
fn load_rejects_malformed_history() {
    let (_dir, path) = temp_path("history.json");
    fs::write(&path, "{not json").expect("write file");

    let error = load_conversation(Some(path.as_path())).expect_err("malformed file must fail");
    assert_matches!(error, StoreError::JsonParse { .. });
    assert!(error.to_string().contains("history.json"));
}

#[test]
fn credential_store_reports_none_before_setup() {
    let (_dir, path) = temp_path("config/.chatsh");
    let store = FileCredentialStore::new(&path);

    assert_eq!(store.load().expect("load"), None);
}

#[test]
fn credential_store_round_trips_record() {
    let (_dir, path) = temp_path("config/.chatsh");
    let store = FileCredentialStore::new(&path);
    let record = CredentialRecord::from_github_token("gho_abc");

    store.save(&record).expect("save");

    assert_eq!(store.load().expect("load"), Some(record));
    let raw: Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("valid JSON");
    assert_eq!(
        raw,
        json!({"github_token": "gho_abc", "copilot_token": "", "expires_at": ""})
    );
}

#[test]
fn credential_store_overwrites_on_reauthentication() {
    let (_dir, path) = temp_path(".chatsh");
    let store = FileCredentialStore::new(&path);

    store
        .save(&CredentialRecord::from_github_token("gho_first"))
        .expect("first save");
    store
        .save(&CredentialRecord::from_github_token("gho_second"))
        .expect("second save");

    let record = store.load().expect("load").expect("record present");
    assert_eq!(record.github_token(), Some("gho_second"));
}

#[test]
fn credential_store_accepts_legacy_record_missing_fields() {
    let (_dir, path) = temp_path(".chatsh");
    fs::write(&path, r#"{"github_token":"gho_legacy"}"#).expect("write file");

    let record = FileCredentialStore::new(&path)
        .load()
        .expect("load")
        .expect("record present");
    assert_eq!(record.github_token(), Some("gho_legacy"));
    assert_eq!(record.copilot_token, "");
}

#[test]
fn credential_record_with_blank_token_reads_as_unauthenticated() {
    let record = CredentialRecord::from_github_token("   ");
    assert_eq!(record.github_token(), None);
}

#[test]
fn credential_store_rejects_malformed_file() {
    let (_dir, path) = temp_path(".chatsh");
    fs::write(&path, "github_token=abc").expect("write file");

    let error = FileCredentialStore::new(&path)
        .load()
        .expect_err("malformed credential file must fail");
    assert_matches!(error, StoreError::JsonParse { .. });
}

#[cfg(unix)]
#[test]
fn credential_file_is_private_to_owner() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, path) = temp_path(".chatsh");
    FileCredentialStore::new(&path)
        .save(&CredentialRecord::from_github_token("gho_abc"))
        .expect("save");

    let mode = fs::metadata(&path).expect("metadata").permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}
