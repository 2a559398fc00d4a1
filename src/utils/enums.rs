use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::client::User;

//Signals what the session should do next. E.g., SendMessage will signal the
//session to validate the current draft and post it to the backend.
#[derive(Eq, PartialEq, Clone, Debug, Serialize, Deserialize)]
pub enum RunMessage {
    LoadUsers,
    RefreshUsers,
    SetDraft(String),
    SendMessage,
    GetUsers,
    GetState,
    Shutdown,
}

//Completions coming back from spawned network tasks. Failures carry the text
//that ends up in the status channel.
#[derive(PartialEq, Clone, Debug)]
pub enum TaskMessage {
    UsersLoaded(Vec<User>),
    UsersFailed(String),
    SendFinished,
    SendFailed(String),
}

//Item type of the fused session event stream
#[derive(PartialEq, Clone, Debug)]
pub enum SessionEvent {
    Command(RunMessage),
    Task(TaskMessage),
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum SendState {
    Idle,
    Sending,
    Sent,
    Error(String),
}

impl fmt::Display for SendState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SendState::Idle => write!(f, "idle"),
            SendState::Sending => write!(f, "sending"),
            SendState::Sent => write!(f, "sent"),
            SendState::Error(reason) => write!(f, "error: {}", reason),
        }
    }
}
