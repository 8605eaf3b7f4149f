use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

pub const BACKEND_ADDRESS_VARIABLE: &str = "ECH_WORKERS_UI_BACKEND";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Settings {
    #[serde(default = "default_backend_address")]
    pub backend_address: String,
    #[serde(default = "default_save_ack_ms")]
    pub save_ack_ms: u64,
    #[serde(default = "default_confirmation_timeout_ms")]
    pub confirmation_timeout_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_backend_address() -> String {
    "127.0.0.1:30100".into()
}

fn default_save_ack_ms() -> u64 {
    1000
}

fn default_confirmation_timeout_ms() -> u64 {
    3000
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_connect_timeout_ms() -> u64 {
    2000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_address: default_backend_address(),
            save_ack_ms: default_save_ack_ms(),
            confirmation_timeout_ms: default_confirmation_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl Settings {
    pub fn settings_file_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ech-workers-ui")
            .join("settings.toml")
    }

    pub fn load() -> Self {
        let path = Self::settings_file_path();
        let mut settings = match std::fs::read_to_string(&path) {
            Ok(content) => match Self::parse(&content) {
                Ok(settings) => {
                    log::info!("[settings] loaded from {}", path.display());
                    settings
                }
                Err(error) => {
                    log::warn!("[settings] {}: {error}", path.display());
                    Self::default()
                }
            },
            Err(_) => {
                log::info!(
                    "[settings] no settings file at {}, using defaults",
                    path.display()
                );
                Self::default()
            }
        };

        if let Ok(address) = std::env::var(BACKEND_ADDRESS_VARIABLE)
            && !address.trim().is_empty()
        {
            log::info!("[settings] backend address overridden by {BACKEND_ADDRESS_VARIABLE}");
            settings.backend_address = address.trim().to_string();
        }
        settings
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|error| format!("failed to parse settings: {error}"))
    }

    pub fn save_ack(&self) -> Duration {
        Duration::from_millis(self.save_ack_ms)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_millis(self.confirmation_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(50))
    }

    /// Bounds connecting to the backend and writing one request. Never zero.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms.max(100))
    }
}
