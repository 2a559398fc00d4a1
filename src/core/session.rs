use crate::config::resolver::ResolvedConfig;
use crate::core::client::{BackendClient, SendMessageReq, User};
use crate::core::host::{greeting, HostContext, Identity};
use crate::core::ipc::{IPCResponse, SendUsersResp, SessionSnapshot};
use crate::utils::enums::{RunMessage, SendState, SessionEvent, TaskMessage};
use crate::utils::logger::{ConsoleSink, TraceSink};
use crate::utils::types::UserId;

use anyhow::Result;
use futures::stream;
use futures::stream::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info};

use std::sync::Arc;

//Owns every piece of mutable session state. All mutation happens on the run
//loop task; network calls only re-enter through TaskMessage events.
pub struct Session {
    client: BackendClient,
    pub current_user: Option<Identity>,
    pub user_id: Option<UserId>,
    pub users: Vec<User>,
    pub draft: String,
    pub send_state: SendState,
    pub last_load_error: Option<String>,
    sink: Arc<dyn TraceSink>,
}

impl Session {
    pub fn new(config: ResolvedConfig, host: Option<&HostContext>) -> Self {
        Self::with_sink(config, host, Arc::new(ConsoleSink))
    }

    pub fn with_sink(
        config: ResolvedConfig,
        host: Option<&HostContext>,
        sink: Arc<dyn TraceSink>,
    ) -> Self {
        let init_data = host.and_then(|h| h.init_data_raw().map(str::to_string));
        let client = BackendClient::new(&config.backend, init_data);
        let current_user = host.and_then(|h| h.identity().cloned());
        Self {
            client,
            current_user,
            user_id: config.user_id,
            users: Vec::new(),
            draft: String::new(),
            send_state: SendState::Idle,
            last_load_error: None,
            sink,
        }
    }

    pub fn client(&self) -> &BackendClient {
        &self.client
    }

    pub fn greeting(&self) -> String {
        greeting(self.current_user.as_ref())
    }

    pub fn set_draft(&mut self, draft: String) {
        self.draft = draft;
    }

    //Validation runs before any network call; failures land in the same
    //status channel the UI already renders
    pub fn prepare_send(&mut self) -> Option<SendMessageReq> {
        let text = self.draft.trim();
        if text.is_empty() {
            self.send_state = SendState::Error("Message text is empty".to_string());
            self.trace("Send rejected: empty draft");
            return None;
        }
        let Some(user_id) = self.user_id else {
            self.send_state = SendState::Error(
                "No user id available. Relaunch the app from the bot's menu button".to_string(),
            );
            self.trace("Send rejected: no resolved user id");
            return None;
        };
        self.send_state = SendState::Sending;
        self.trace(format!("Sending message for user {}", user_id));
        Some(SendMessageReq {
            text: text.to_string(),
            user_id,
        })
    }

    pub fn apply(&mut self, task: TaskMessage) {
        match task {
            TaskMessage::UsersLoaded(users) => {
                self.trace(format!("Loaded {} users", users.len()));
                self.last_load_error = None;
                self.users = users;
            }
            TaskMessage::UsersFailed(reason) => {
                error!("Failed to load users: {}", reason);
                self.trace(format!("User list load failed: {}", reason));
                self.last_load_error = Some(reason);
            }
            TaskMessage::SendFinished => {
                self.trace("Message sent");
                self.draft.clear();
                self.send_state = SendState::Sent;
            }
            TaskMessage::SendFailed(reason) => {
                error!("Failed to send message: {}", reason);
                self.trace(format!("Send failed: {}", reason));
                self.send_state = SendState::Error(reason);
            }
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            greeting: self.greeting(),
            user: self.current_user.clone(),
            user_count: self.users.len(),
            draft: self.draft.clone(),
            send_state: self.send_state.clone(),
            last_load_error: self.last_load_error.clone(),
        }
    }

    fn trace(&self, message: impl Into<String>) {
        self.sink.append(message.into());
    }
}

//Main runtime loop of the session. UI commands and task completions are
//merged into one stream so a single owner mutates state. In flight calls are
//never cancelled; an older refresh finishing late overwrites newer data.
pub async fn run(
    mut session: Session,
    command_rx: mpsc::Receiver<SessionEvent>,
    task_tx: mpsc::Sender<SessionEvent>,
    task_rx: mpsc::Receiver<SessionEvent>,
    data_tx: mpsc::Sender<IPCResponse>,
) -> Result<()> {
    info!("Session is running...");
    let streams = vec![ReceiverStream::new(command_rx), ReceiverStream::new(task_rx)];
    let mut fused_streams = stream::select_all(streams);

    while let Some(event) = fused_streams.next().await {
        match event {
            SessionEvent::Command(RunMessage::LoadUsers)
            | SessionEvent::Command(RunMessage::RefreshUsers) => {
                session.trace("Loading user list");
                let client = session.client().clone();
                let task_tx = task_tx.clone();
                tokio::spawn(async move {
                    let task = match client.list_users().await {
                        Ok(users) => TaskMessage::UsersLoaded(users),
                        Err(e) => TaskMessage::UsersFailed(e.to_string()),
                    };
                    if let Err(e) = task_tx.send(SessionEvent::Task(task)).await {
                        error!("Failed to hand task result back to session: {}", e);
                    }
                });
            }
            SessionEvent::Command(RunMessage::SetDraft(draft)) => {
                session.set_draft(draft);
            }
            SessionEvent::Command(RunMessage::SendMessage) => {
                if let Some(req) = session.prepare_send() {
                    let client = session.client().clone();
                    let task_tx = task_tx.clone();
                    tokio::spawn(async move {
                        let task = match client.send_message(&req).await {
                            Ok(payload) => {
                                info!("Backend accepted message: {}", payload);
                                TaskMessage::SendFinished
                            }
                            Err(e) => TaskMessage::SendFailed(e.to_string()),
                        };
                        if let Err(e) = task_tx.send(SessionEvent::Task(task)).await {
                            error!("Failed to hand task result back to session: {}", e);
                        }
                    });
                }
            }
            SessionEvent::Command(RunMessage::GetUsers) => {
                let response = SendUsersResp {
                    users: session.users.clone(),
                };
                data_tx.send(IPCResponse::SendUsers(response)).await?;
            }
            SessionEvent::Command(RunMessage::GetState) => {
                data_tx.send(IPCResponse::State(session.snapshot())).await?;
            }
            SessionEvent::Command(RunMessage::Shutdown) => {
                info!("Shutting down...");
                break;
            }
            SessionEvent::Task(task) => {
                session.apply(task);
            }
        }
    }

    Ok(())
}
