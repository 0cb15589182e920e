use std::fs;
use std::io;
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use chat_provider::{ChatMessage, ProviderError, SessionToken};
use chat_provider_mock::{MockProvider, MOCK_SESSION_TOKEN};
use chat_store::{load_conversation, save_conversation, CredentialRecord, MemoryCredentialStore};
use chatsh::session::DEFAULT_SYSTEM_PROMPT;
use chatsh::{ChatSession, ChatSettings, ChatTurn, SessionError, TokenError};
use pretty_assertions::assert_eq;

fn authenticated_store() -> MemoryCredentialStore {
    MemoryCredentialStore::with_record(CredentialRecord::from_github_token("gho_stored"))
}

fn session<'a>(
    store: &'a MemoryCredentialStore,
    provider: &'a MockProvider,
    system_prompt: &str,
) -> ChatSession<&'a MemoryCredentialStore, &'a MockProvider, &'a MockProvider> {
    ChatSession::new(
        store,
        provider,
        provider,
        ChatSettings::default().with_system_prompt(Some(system_prompt)),
    )
}

fn turn(input: &str) -> ChatTurn {
    ChatTurn {
        input: input.to_string(),
        ..ChatTurn::default()
    }
}

#[test]
fn empty_history_sends_system_then_input() {
    let store = authenticated_store();
    let provider = MockProvider::new().with_candidates(&["hi there"]);

    let reply = session(&store, &provider, "S")
        .run_chat(&turn("hello"))
        .expect("chat should succeed");

    assert_eq!(reply, "hi there");
    let requests = provider.completion_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].messages,
        vec![ChatMessage::system("S"), ChatMessage::user("hello")]
    );
    assert_eq!(requests[0].model, "gpt-4");
    assert_eq!(requests[0].temperature, 0.1);
    assert_eq!(requests[0].top_p, 1.0);
    assert_eq!(requests[0].candidate_count, 1);
    assert_eq!(provider.completion_tokens(), vec![MOCK_SESSION_TOKEN]);
}

#[test]
fn default_settings_use_canned_system_prompt() {
    let store = authenticated_store();
    let provider = MockProvider::new();

    ChatSession::new(&store, &provider, &provider, ChatSettings::default())
        .run_chat(&turn("hello"))
        .expect("chat should succeed");

    let requests = provider.completion_requests();
    assert_eq!(
        requests[0].messages[0],
        ChatMessage::system(DEFAULT_SYSTEM_PROMPT)
    );
}

#[test]
fn successful_turn_appends_input_and_reply_to_history() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("history.json");
    save_conversation(
        &path,
        &[ChatMessage::user("a"), ChatMessage::assistant("b")],
    )
    .expect("seed history");
    let store = authenticated_store();
    let provider = MockProvider::new().with_candidates(&["d", "ignored"]);

    let reply = session(&store, &provider, "S")
        .run_chat(&ChatTurn {
            history_path: Some(path.clone()),
            input: "c".to_string(),
            extra_context: None,
        })
        .expect("chat should succeed");

    assert_eq!(reply, "d");
    assert_eq!(
        provider.completion_requests()[0].messages,
        vec![
            ChatMessage::system("S"),
            ChatMessage::user("a"),
            ChatMessage::assistant("b"),
            ChatMessage::user("c"),
        ]
    );
    assert_eq!(
        load_conversation(Some(path.as_path())).expect("reload history"),
        vec![
            ChatMessage::user("a"),
            ChatMessage::assistant("b"),
            ChatMessage::user("c"),
            ChatMessage::assistant("d"),
        ]
    );
}

#[test]
fn missing_history_file_starts_empty_and_is_created() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("nested").join("new.json");
    let store = authenticated_store();
    let provider = MockProvider::new().with_candidates(&["first reply"]);

    session(&store, &provider, "S")
        .run_chat(&ChatTurn {
            history_path: Some(path.clone()),
            input: "first".to_string(),
            extra_context: None,
        })
        .expect("chat should succeed");

    assert_eq!(
        load_conversation(Some(path.as_path())).expect("reload history"),
        vec![
            ChatMessage::user("first"),
            ChatMessage::assistant("first reply"),
        ]
    );
}

#[test]
fn extra_context_precedes_input_and_is_persisted() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("history.json");
    let store = authenticated_store();
    let provider = MockProvider::new().with_candidates(&["explained"]);

    session(&store, &provider, "S")
        .run_chat(&ChatTurn {
            history_path: Some(path.clone()),
            input: "explain this".to_string(),
            extra_context: Some("fn main() {}".to_string()),
        })
        .expect("chat should succeed");

    let expected_outbound = vec![
        ChatMessage::system("S"),
        ChatMessage::user("fn main() {}"),
        ChatMessage::user("explain this"),
    ];
    assert_eq!(provider.completion_requests()[0].messages, expected_outbound);
    assert_eq!(
        load_conversation(Some(path.as_path())).expect("reload history"),
        vec![
            ChatMessage::user("fn main() {}"),
            ChatMessage::user("explain this"),
            ChatMessage::assistant("explained"),
        ]
    );
}

#[test]
fn zero_candidates_fail_and_leave_history_untouched() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("history.json");
    save_conversation(
        &path,
        &[ChatMessage::user("a"), ChatMessage::assistant("b")],
    )
    .expect("seed history");
    let before = fs::read(&path).expect("read seeded history");
    let store = authenticated_store();
    let provider = MockProvider::new().with_candidates(&[]);

    let error = session(&store, &provider, "S")
        .run_chat(&ChatTurn {
            history_path: Some(path.clone()),
            input: "c".to_string(),
            extra_context: None,
        })
        .expect_err("zero candidates must fail");

    assert_matches!(error, SessionError::NoCandidates);
    assert!(error.to_string().contains("malformed response"));
    assert_eq!(fs::read(&path).expect("read history"), before);
}

#[test]
fn chat_failure_leaves_history_untouched() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("history.json");
    save_conversation(&path, &[ChatMessage::user("a")]).expect("seed history");
    let before = fs::read(&path).expect("read seeded history");
    let store = authenticated_store();
    let provider = MockProvider::new().with_reply(Err(ProviderError::Status {
        status: 500,
        message: "upstream".to_string(),
    }));

    let error = session(&store, &provider, "S")
        .run_chat(&ChatTurn {
            history_path: Some(path.clone()),
            input: "c".to_string(),
            extra_context: None,
        })
        .expect_err("chat failure must surface");

    assert_matches!(error, SessionError::Chat(ProviderError::Status { status: 500, .. }));
    assert_eq!(fs::read(&path).expect("read history"), before);
}

#[test]
fn exchange_runs_once_per_turn_regardless_of_history_length() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("history.json");
    let history: Vec<ChatMessage> = (0..20)
        .flat_map(|turn| {
            [
                ChatMessage::user(format!("q{turn}")),
                ChatMessage::assistant(format!("a{turn}")),
            ]
        })
        .collect();
    save_conversation(&path, &history).expect("seed history");
    let store = authenticated_store();
    let provider = MockProvider::new();
    let session = session(&store, &provider, "S");

    for round in 1..=3 {
        session
            .run_chat(&ChatTurn {
                history_path: Some(path.clone()),
                input: format!("round {round}"),
                extra_context: None,
            })
            .expect("chat should succeed");
        assert_eq!(provider.exchange_count(), round);
    }
    assert_eq!(provider.exchanged_tokens(), vec!["gho_stored"; 3]);
    assert_eq!(
        load_conversation(Some(path.as_path()))
            .expect("reload history")
            .len(),
        history.len() + 6
    );
}

#[test]
fn unauthenticated_store_fails_before_chat() {
    let store = MemoryCredentialStore::new();
    let provider = MockProvider::new();

    let error = session(&store, &provider, "S")
        .run_chat(&turn("hello"))
        .expect_err("missing credentials must fail");

    assert_matches!(error, SessionError::Token(TokenError::NotAuthenticated));
    assert!(error.to_string().contains("chatsh setup"));
    assert_eq!(provider.exchange_count(), 0);
    assert_eq!(provider.completion_count(), 0);
}

#[test]
fn exchange_failure_is_fatal() {
    let store = authenticated_store();
    let provider = MockProvider::new().with_exchange(Err(ProviderError::Status {
        status: 401,
        message: "Bad credentials".to_string(),
    }));

    let error = session(&store, &provider, "S")
        .run_chat(&turn("hello"))
        .expect_err("exchange failure must surface");

    assert_matches!(error, SessionError::Token(TokenError::Exchange(_)));
    assert_eq!(provider.completion_count(), 0);
}

#[test]
fn blank_input_is_rejected_before_any_call() {
    let store = authenticated_store();
    let provider = MockProvider::new();

    let error = session(&store, &provider, "S")
        .run_chat(&turn(" \n"))
        .expect_err("blank input must fail");

    assert_matches!(error, SessionError::EmptyInput);
    assert_eq!(provider.exchange_count(), 0);
}

#[test]
fn session_token_expiry_is_not_persisted() {
    let store = authenticated_store();
    let provider =
        MockProvider::new().with_exchange(Ok(SessionToken::new("tid=short", Some(1_700_000_000))));

    session(&store, &provider, "S")
        .run_chat(&turn("hello"))
        .expect("chat should succeed");

    assert_eq!(store.save_count(), 0);
    assert_eq!(
        store.record(),
        Some(CredentialRecord::from_github_token("gho_stored"))
    );
    assert_eq!(provider.completion_tokens(), vec!["tid=short"]);
}

#[derive(Clone, Default)]
struct SharedLog(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log lock poisoned").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn history_save_is_logged_once_per_turn() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("history.json");
    let store = authenticated_store();
    let provider = MockProvider::new().with_candidates(&["noted"]);
    let log = SharedLog::default();
    let writer = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        session(&store, &provider, "S")
            .run_chat(&ChatTurn {
                history_path: Some(path.clone()),
                ..turn("remember this")
            })
            .expect("chat should succeed");
    });

    let output = String::from_utf8(log.0.lock().expect("log lock poisoned").clone())
        .expect("log output is utf-8");
    let save_lines = output
        .lines()
        .filter(|line| line.contains("saved"))
        .count();
    assert_eq!(save_lines, 1, "log output:\n{output}");
}
