use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info};

use anyhow::Result;

use crate::core::client::User;
use crate::core::host::Identity;
use crate::utils::enums::{RunMessage, SendState, SessionEvent};

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SendUsersResp {
    pub users: Vec<User>,
}

//Everything the embedding UI needs to render one frame of the app
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub greeting: String,
    pub user: Option<Identity>,
    pub user_count: usize,
    pub draft: String,
    pub send_state: SendState,
    pub last_load_error: Option<String>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum IPCResponse {
    SendUsers(SendUsersResp),
    State(SessionSnapshot),
}

//One connection per command: read a framed RunMessage, hand it to the
//session loop, write back the framed response when the command expects one.
pub async fn listen(
    mut rx: mpsc::Receiver<IPCResponse>,
    runtime_tx: mpsc::Sender<SessionEvent>,
    port: String,
) -> Result<()> {
    let listener = TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    info!("Listening on localhost:{}...", port);
    loop {
        let (mut socket, _) = listener.accept().await?;
        let message: RunMessage = {
            let mut reader = BufReader::new(&mut socket);
            match read_frame(&mut reader).await {
                Ok(message) => message,
                Err(e) => {
                    error!("Failed to decode ipc frame: {}", e);
                    continue;
                }
            }
        };

        let wants_reply = matches!(message, RunMessage::GetUsers | RunMessage::GetState);
        runtime_tx.send(SessionEvent::Command(message)).await?;

        if wants_reply {
            if let Some(response) = rx.recv().await {
                let bytes = encode_frame(&response)?;
                socket.write_all(&bytes).await?;
            }
        }
    }
}

//Frames are a u32 big endian length followed by a JSON body
pub fn encode_frame<T: Serialize>(message: &T) -> Result<Vec<u8>> {
    let body = serde_json::to_vec(message)?;
    let mut buf = Vec::with_capacity(body.len() + 4);
    buf.extend_from_slice(&(body.len() as u32).to_be_bytes());
    buf.extend_from_slice(&body);
    Ok(buf)
}

pub async fn read_frame<T, R>(reader: &mut R) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
    R: AsyncReadExt + Unpin,
{
    let mut length_buf = [0u8; 4];
    reader.read_exact(&mut length_buf).await?;
    let length = u32::from_be_bytes(length_buf);
    let mut body_buf = vec![0u8; length as usize];
    reader.read_exact(&mut body_buf).await?;
    Ok(serde_json::from_slice(&body_buf)?)
}
