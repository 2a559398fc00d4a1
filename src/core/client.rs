use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::utils::constants::{INIT_DATA_HEADER, MESSAGE_PATH, REQUEST_TIMEOUT, USERS_PATH};
use crate::utils::errors::ClientError;
use crate::utils::types::UserId;

//Backend owned user record, read only on this side
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct SendMessageReq {
    pub text: String,
    pub user_id: UserId,
}

//Thin HTTP client for the two backend operations. No retries; each request
//carries a fixed timeout.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    init_data: Option<String>,
    timeout: Duration,
    http: reqwest::Client,
}

impl BackendClient {
    pub fn new(base_url: &str, init_data: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            init_data,
            timeout: Duration::from_secs(REQUEST_TIMEOUT),
            http: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ClientError> {
        let url = self.endpoint(USERS_PATH);
        debug!("Fetching users from {}", url);
        let mut request = self.http.get(&url).timeout(self.timeout);
        if let Some(init_data) = &self.init_data {
            request = request.header(INIT_DATA_HEADER, init_data.as_str());
        }
        let response = request
            .send()
            .await
            .map_err(|e| transport_error("list users", e, self.timeout))?;
        decode_json_response(response).await
    }

    //Success payload shape is backend defined, so it stays a raw Value
    pub async fn send_message(&self, req: &SendMessageReq) -> Result<Value, ClientError> {
        let url = self.endpoint(MESSAGE_PATH);
        debug!("Posting message for user {} to {}", req.user_id, url);
        let mut request = self.http.post(&url).timeout(self.timeout).json(req);
        if let Some(init_data) = &self.init_data {
            request = request.header(INIT_DATA_HEADER, init_data.as_str());
        }
        let response = request
            .send()
            .await
            .map_err(|e| transport_error("send message", e, self.timeout))?;
        decode_json_response(response).await
    }
}

fn transport_error(operation: &str, error: reqwest::Error, duration: Duration) -> ClientError {
    if error.is_timeout() {
        ClientError::Timeout {
            operation: operation.to_string(),
            duration,
        }
    } else {
        ClientError::Transport(error.to_string())
    }
}

//Non 2xx bodies may carry a `message` field meant for the user verbatim
fn http_error(status: StatusCode, body: &[u8]) -> ClientError {
    let message = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|payload| {
            payload
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string());
    ClientError::Http {
        status: status.as_u16(),
        message,
    }
}

async fn decode_json_response<T>(response: reqwest::Response) -> Result<T, ClientError>
where
    T: for<'de> serde::Deserialize<'de>,
{
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ClientError::Transport(e.to_string()))?;

    if !status.is_success() {
        return Err(http_error(status, &bytes));
    }

    serde_json::from_slice::<T>(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
}
