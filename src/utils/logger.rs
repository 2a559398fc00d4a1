use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::utils::constants::DEBUG_LOG_CAPACITY;

pub fn init_tracing() {
    let filter = EnvFilter::new("minichat=info");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .with_line_number(true)
        .with_file(true)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

pub fn init_file_tracing(dir: &str) {
    let appender = tracing_appender::rolling::daily(dir, "minichat.log");
    let filter = EnvFilter::new("minichat=debug");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(appender)
        .with_ansi(false)
        .compact()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

//Human readable trace entry surfaced to the embedding UI
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub at: DateTime<Utc>,
    pub message: String,
}

//Where session trace entries land. The UI registers a DebugLog; without one
//entries go to the console subscriber.
pub trait TraceSink: Send + Sync {
    fn append(&self, message: String);
}

pub struct ConsoleSink;

impl TraceSink for ConsoleSink {
    fn append(&self, message: String) {
        info!("{}", message);
    }
}

//Bounded in-memory log. Oldest entries are dropped past capacity.
#[derive(Debug)]
pub struct DebugLog {
    entries: Mutex<VecDeque<TraceEntry>>,
    capacity: usize,
}

impl DebugLog {
    pub fn new() -> Self {
        Self::with_capacity(DEBUG_LOG_CAPACITY)
    }

    //Capacity below 1 would never retain anything, clamp it
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn snapshot(&self) -> Vec<TraceEntry> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.iter().cloned().collect()
    }
}

impl Default for DebugLog {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceSink for DebugLog {
    fn append(&self, message: String) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(TraceEntry {
            at: Utc::now(),
            message,
        });
    }
}
