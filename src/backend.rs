//! Command and event surface of the ECH Workers backend.
//!
//! The backend owns the client process, the system proxy and the server store.
//! This crate only issues commands and listens for the events it pushes.

use crate::profile::ServerProfile;

/// Every backend call either succeeds or fails with a human-readable message.
pub type BackendResult<T> = Result<T, String>;

#[allow(async_fn_in_trait)]
pub trait Backend {
    async fn list_profiles(&self) -> BackendResult<Vec<ServerProfile>>;
    async fn current_profile_id(&self) -> BackendResult<Option<String>>;
    async fn current_profile(&self) -> BackendResult<Option<ServerProfile>>;
    async fn set_current_profile(&self, id: &str) -> BackendResult<()>;
    async fn add_profile(&self, name: &str) -> BackendResult<ServerProfile>;
    async fn rename_profile(&self, id: &str, new_name: &str) -> BackendResult<()>;
    async fn delete_profile(&self, id: &str) -> BackendResult<()>;
    async fn update_profile(&self, profile: &ServerProfile) -> BackendResult<()>;

    async fn start_process(&self) -> BackendResult<String>;
    async fn stop_process(&self) -> BackendResult<String>;
    async fn is_process_running(&self) -> BackendResult<bool>;

    async fn set_system_proxy(&self, enabled: bool) -> BackendResult<String>;
    async fn proxy_enabled(&self) -> BackendResult<bool>;

    async fn app_version(&self) -> BackendResult<String>;
}

pub const EVENT_LOG_OUTPUT: &str = "log-output";
pub const EVENT_PROCESS_STARTED: &str = "process-started";
pub const EVENT_PROCESS_STOPPED: &str = "process-stopped";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PushEvent {
    LogOutput(String),
    ProcessStarted,
    ProcessStopped,
}

impl PushEvent {
    pub fn from_wire(name: &str, payload: &serde_json::Value) -> Option<Self> {
        match name {
            EVENT_LOG_OUTPUT => Some(Self::LogOutput(match payload {
                serde_json::Value::String(line) => line.clone(),
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            })),
            EVENT_PROCESS_STARTED => Some(Self::ProcessStarted),
            EVENT_PROCESS_STOPPED => Some(Self::ProcessStopped),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::LogOutput(_) => EVENT_LOG_OUTPUT,
            Self::ProcessStarted => EVENT_PROCESS_STARTED,
            Self::ProcessStopped => EVENT_PROCESS_STOPPED,
        }
    }
}
