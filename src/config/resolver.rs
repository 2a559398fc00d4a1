use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde_json::Value;
use tracing::debug;

use crate::core::host::HostContext;
use crate::utils::constants::{DEFAULT_BACKEND_URL, START_PARAM_KEY, USER_ID_KEY};
use crate::utils::types::UserId;

//Start parameters arrive padded or unpadded depending on the host client
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

//Whatever could be recovered from one start parameter. Derived fresh on every
//resolution, never persisted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub backend: Option<String>,
    pub user_id: Option<UserId>,
}

//Post precedence result. backend is always populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub backend: String,
    pub user_id: Option<UserId>,
}

//Key value pairs from the launch URL, treated as an opaque source
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LaunchQuery {
    pairs: Vec<(String, String)>,
}

impl LaunchQuery {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim_start_matches('?');
        let mut pairs = Vec::new();
        for piece in raw.split('&') {
            if piece.is_empty() {
                continue;
            }
            match piece.split_once('=') {
                Some((key, value)) => pairs.push((key.to_string(), value.to_string())),
                None => pairs.push((piece.to_string(), String::new())),
            }
        }
        Self { pairs }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }
}

//Decodes an opaque start parameter: base64url text holding either a JSON
//payload or a bare URL. Every failure path collapses to an empty config.
pub fn decode_start_param(raw: &str) -> ClientConfig {
    let bytes = match URL_SAFE_LENIENT.decode(raw.trim()) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Start param is not base64url: {}", e);
            return ClientConfig::default();
        }
    };
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            debug!("Start param decoded to non utf8 bytes: {}", e);
            return ClientConfig::default();
        }
    };

    match serde_json::from_str::<Value>(&text) {
        Ok(Value::String(url)) => ClientConfig {
            backend: Some(url),
            user_id: None,
        },
        Ok(Value::Object(fields)) => ClientConfig {
            backend: fields
                .get("backend")
                .or_else(|| fields.get("b"))
                .and_then(Value::as_str)
                .map(str::to_string),
            user_id: fields
                .get("user_id")
                .or_else(|| fields.get("uid"))
                .or_else(|| fields.get("u"))
                .and_then(Value::as_i64),
        },
        Ok(_) => ClientConfig::default(),
        //Not JSON at all, but a bare URL still counts
        Err(_) if text.starts_with("http") => ClientConfig {
            backend: Some(text),
            user_id: None,
        },
        Err(e) => {
            debug!("Start param is neither json nor a url: {}", e);
            ClientConfig::default()
        }
    }
}

//Precedence: the launch query wins over host init data for the start
//parameter channel; the effective user id falls back from the start parameter
//payload to the query key to the host identity.
pub fn resolve(host: Option<&HostContext>, query: &LaunchQuery) -> ResolvedConfig {
    let start_param = query
        .get(START_PARAM_KEY)
        .map(str::to_string)
        .or_else(|| host.and_then(|h| h.start_param().map(str::to_string)));

    let decoded = start_param
        .as_deref()
        .map(decode_start_param)
        .unwrap_or_default();

    let backend = decoded
        .backend
        .map(|url| url.trim_end_matches('/').to_string())
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

    let user_id = decoded
        .user_id
        .or_else(|| query.get(USER_ID_KEY).and_then(|raw| raw.parse().ok()))
        .or_else(|| host.and_then(|h| h.user_id()));

    ResolvedConfig { backend, user_id }
}
