mod utils;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{sleep, timeout, Duration};

use minichat::config::resolver::ResolvedConfig;
use minichat::core::host::{HostContext, Identity, InitData};
use minichat::core::ipc::IPCResponse;
use minichat::core::session::{run, Session};
use minichat::utils::enums::{RunMessage, SendState, SessionEvent, TaskMessage};
use minichat::utils::logger::{DebugLog, TraceSink};
use utils::{http_response, spawn_backend};

fn test_config(backend: &str, user_id: Option<i64>) -> ResolvedConfig {
    ResolvedConfig {
        backend: backend.to_string(),
        user_id,
    }
}

#[test]
fn test_empty_draft_short_circuits() {
    let mut session = Session::new(test_config("http://127.0.0.1:1", Some(7)), None);
    session.set_draft("   ".to_string());

    //prepare_send is synchronous, so None here proves no network call happened
    assert!(session.prepare_send().is_none());
    assert!(matches!(session.send_state, SendState::Error(_)));
    assert_eq!(session.draft, "   ");
}

#[test]
fn test_missing_user_id_short_circuits() {
    let mut session = Session::new(test_config("http://127.0.0.1:1", None), None);
    session.set_draft("hello".to_string());

    assert!(session.prepare_send().is_none());
    match &session.send_state {
        SendState::Error(reason) => assert!(reason.contains("Relaunch")),
        other => panic!("Expected an error state, got {:?}", other),
    }
}

#[test]
fn test_prepare_send_trims_draft() {
    let mut session = Session::new(test_config("http://127.0.0.1:1", Some(7)), None);
    session.set_draft("  hello  ".to_string());

    let req = session.prepare_send().expect("Send should be accepted");
    assert_eq!(req.text, "hello");
    assert_eq!(req.user_id, 7);
    assert_eq!(session.send_state, SendState::Sending);
}

#[test]
fn test_send_finished_clears_draft() {
    let mut session = Session::new(test_config("http://127.0.0.1:1", Some(7)), None);
    session.set_draft("hello".to_string());
    session.prepare_send().expect("Send should be accepted");

    session.apply(TaskMessage::SendFinished);
    assert!(session.draft.is_empty());
    assert_eq!(session.send_state, SendState::Sent);
}

#[test]
fn test_send_failed_keeps_draft() {
    let mut session = Session::new(test_config("http://127.0.0.1:1", Some(7)), None);
    session.set_draft("hello".to_string());
    session.prepare_send().expect("Send should be accepted");

    session.apply(TaskMessage::SendFailed("backend exploded".to_string()));
    assert_eq!(session.draft, "hello");
    assert_eq!(
        session.send_state,
        SendState::Error("backend exploded".to_string())
    );
}

#[test]
fn test_users_loaded_replaces_list_and_clears_error() {
    let mut session = Session::new(test_config("http://127.0.0.1:1", Some(7)), None);

    session.apply(TaskMessage::UsersFailed("no route".to_string()));
    assert_eq!(session.last_load_error.as_deref(), Some("no route"));
    assert!(session.users.is_empty());

    let users = vec![minichat::core::client::User {
        id: 1,
        first_name: Some("Ada".to_string()),
        last_name: None,
        username: None,
    }];
    session.apply(TaskMessage::UsersLoaded(users));
    assert_eq!(session.users.len(), 1);
    assert_eq!(session.last_load_error, None);
}

#[test]
fn test_greeting_uses_host_identity() {
    let host = HostContext {
        init_data_unsafe: InitData {
            user: Some(Identity {
                id: 3,
                first_name: "Ada".to_string(),
                last_name: None,
                username: None,
                language_code: None,
            }),
            start_param: None,
        },
        ..HostContext::default()
    };

    let session = Session::new(test_config("http://127.0.0.1:1", Some(3)), Some(&host));
    assert!(session.greeting().contains("Ada"));

    let session = Session::new(test_config("http://127.0.0.1:1", None), None);
    assert!(session.greeting().contains("friend"));
}

#[test]
fn test_debug_log_drops_oldest() {
    let log = Arc::new(DebugLog::with_capacity(3));
    for i in 0..5 {
        log.append(format!("entry {}", i));
    }

    let entries = log.snapshot();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].message, "entry 2");
    assert_eq!(entries[2].message, "entry 4");
}

#[test]
fn test_session_traces_into_registered_sink() {
    let log = Arc::new(DebugLog::with_capacity(10));
    let mut session = Session::with_sink(
        test_config("http://127.0.0.1:1", Some(7)),
        None,
        log.clone(),
    );

    session.set_draft("hello".to_string());
    session.prepare_send().expect("Send should be accepted");
    session.apply(TaskMessage::SendFinished);

    let messages: Vec<String> = log.snapshot().into_iter().map(|e| e.message).collect();
    assert!(messages.iter().any(|m| m.contains("Sending message")));
    assert!(messages.iter().any(|m| m == "Message sent"));
}

//Full loop: set a draft, send it against a canned backend, then read the
//state snapshot back through the data channel.
#[tokio::test]
async fn test_run_loop_sends_and_reports_sent() {
    let (url, _request_rx) = spawn_backend(http_response("200 OK", r#"{"ok":true}"#)).await;

    let (command_tx, command_rx) = mpsc::channel(100);
    let (task_tx, task_rx) = mpsc::channel(100);
    let (data_tx, mut data_rx) = mpsc::channel(100);

    let session = Session::new(test_config(&url, Some(7)), None);
    tokio::spawn(async move {
        run(session, command_rx, task_tx, task_rx, data_tx)
            .await
            .expect("Failed to run session");
    });

    command_tx
        .send(SessionEvent::Command(RunMessage::SetDraft(
            "hello".to_string(),
        )))
        .await
        .expect("Failed to send command");
    command_tx
        .send(SessionEvent::Command(RunMessage::SendMessage))
        .await
        .expect("Failed to send command");

    //Give the spawned network task time to finish and re-enter the loop
    sleep(Duration::from_millis(500)).await;

    command_tx
        .send(SessionEvent::Command(RunMessage::GetState))
        .await
        .expect("Failed to send command");

    let response = timeout(Duration::from_secs(5), data_rx.recv())
        .await
        .expect("Timed out waiting for state")
        .expect("Data channel closed");

    match response {
        IPCResponse::State(snapshot) => {
            assert_eq!(snapshot.send_state, SendState::Sent);
            assert!(snapshot.draft.is_empty());
        }
        other => panic!("Expected a state snapshot, got {:?}", other),
    }

    command_tx
        .send(SessionEvent::Command(RunMessage::Shutdown))
        .await
        .expect("Failed to send command");
}

//Load failure leaves the list alone and records the reason for display
#[tokio::test]
async fn test_run_loop_records_load_failure() {
    let (command_tx, command_rx) = mpsc::channel(100);
    let (task_tx, task_rx) = mpsc::channel(100);
    let (data_tx, mut data_rx) = mpsc::channel(100);

    //Nothing is listening on this backend
    let session = Session::new(test_config("http://127.0.0.1:9", Some(7)), None);
    tokio::spawn(async move {
        run(session, command_rx, task_tx, task_rx, data_tx)
            .await
            .expect("Failed to run session");
    });

    command_tx
        .send(SessionEvent::Command(RunMessage::LoadUsers))
        .await
        .expect("Failed to send command");

    sleep(Duration::from_millis(500)).await;

    command_tx
        .send(SessionEvent::Command(RunMessage::GetState))
        .await
        .expect("Failed to send command");

    let response = timeout(Duration::from_secs(5), data_rx.recv())
        .await
        .expect("Timed out waiting for state")
        .expect("Data channel closed");

    match response {
        IPCResponse::State(snapshot) => {
            assert_eq!(snapshot.user_count, 0);
            assert!(snapshot.last_load_error.is_some());
            //The failed load must not disturb the submission status
            assert_eq!(snapshot.send_state, SendState::Idle);
        }
        other => panic!("Expected a state snapshot, got {:?}", other),
    }
}
