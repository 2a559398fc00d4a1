use std::fmt;
use std::time::Duration;

//Failures from backend calls. Display output is what the UI shows, so the
//backend supplied message takes the place of transport detail when present.
#[derive(Debug)]
pub enum ClientError {
    Timeout {
        operation: String,
        duration: Duration,
    },
    Transport(String),
    Http {
        status: u16,
        message: String,
    },
    Decode(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Timeout {
                operation,
                duration,
            } => write!(f, "Operation '{}' timed out after {:?}", operation, duration),
            ClientError::Transport(reason) => write!(f, "Request failed: {}", reason),
            ClientError::Http { status, message } => {
                if message.is_empty() {
                    write!(f, "Request failed with status {}", status)
                } else {
                    write!(f, "{}", message)
                }
            }
            ClientError::Decode(reason) => write!(f, "Error decoding response: {}", reason),
        }
    }
}

impl std::error::Error for ClientError {}
