//! State synchronization between the ECH Workers desktop view and its backend.

pub mod backend;
pub mod ipc;
pub mod log_buffer;
pub mod mirror;
pub mod modal;
pub mod profile;
pub mod settings;
pub mod state;
pub mod synchronizer;

pub use backend::{Backend, BackendResult, PushEvent};
pub use ipc::IpcBackend;
pub use settings::Settings;
pub use synchronizer::{Operation, Outcome, Rejection, Synchronizer};
