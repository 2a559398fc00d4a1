use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::utils::constants::FALLBACK_GREETING_NAME;
use crate::utils::types::UserId;

//Identity block inside the host's init data
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct InitData {
    #[serde(default)]
    pub user: Option<Identity>,
    #[serde(default)]
    pub start_param: Option<String>,
}

//Stand in for the host environment object, passed explicitly at startup.
//None of this exists when the app is opened outside the host; that is a
//valid state, not an error.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct HostContext {
    #[serde(default)]
    pub init_data_unsafe: InitData,
    //Raw signed init data string, forwarded to the backend for validation
    #[serde(default)]
    pub init_data: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub theme_params: HashMap<String, String>,
}

impl HostContext {
    //ready and expand are fire and forget signals back to the host shell
    pub fn ready(&self) {
        info!(
            "Host ready signal sent (platform: {}, version: {})",
            self.platform, self.version
        );
    }

    pub fn expand(&self) {
        info!("Host expand signal sent");
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.init_data_unsafe.user.as_ref()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.identity().map(|user| user.id)
    }

    pub fn start_param(&self) -> Option<&str> {
        self.init_data_unsafe
            .start_param
            .as_deref()
            .filter(|raw| !raw.is_empty())
    }

    pub fn init_data_raw(&self) -> Option<&str> {
        let raw = self.init_data.trim();
        if raw.is_empty() {
            None
        } else {
            Some(raw)
        }
    }
}

pub fn greeting(identity: Option<&Identity>) -> String {
    let name = identity
        .map(|user| user.first_name.as_str())
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(FALLBACK_GREETING_NAME);
    format!("👋 Hello, {}!", name)
}
