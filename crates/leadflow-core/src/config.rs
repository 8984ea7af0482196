//! Configuration model.
//!
//! Every field has a default so that a missing or partial `config.toml`
//! still yields a runnable configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct LeadflowConfig {
    #[serde(default)]
    pub flow: FlowConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
}

/// Timing knobs of the conversation flow.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct FlowConfig {
    /// Delay before the first bot message of each accepted turn.
    #[serde(default = "default_reply_delay_ms")]
    pub reply_delay_ms: u64,
    /// Silence window after which a typing indicator is cleared.
    #[serde(default = "default_typing_window_ms")]
    pub typing_window_ms: u64,
    /// Upper bound for a single notifier call.
    #[serde(default = "default_notifier_timeout_ms")]
    pub notifier_timeout_ms: u64,
}

impl FlowConfig {
    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    pub fn typing_window(&self) -> Duration {
        Duration::from_millis(self.typing_window_ms)
    }

    pub fn notifier_timeout(&self) -> Duration {
        Duration::from_millis(self.notifier_timeout_ms)
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            reply_delay_ms: default_reply_delay_ms(),
            typing_window_ms: default_typing_window_ms(),
            notifier_timeout_ms: default_notifier_timeout_ms(),
        }
    }
}

fn default_reply_delay_ms() -> u64 {
    600
}

fn default_typing_window_ms() -> u64 {
    3000
}

fn default_notifier_timeout_ms() -> u64 {
    10_000
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct StorageConfig {
    /// Root directory for sessions, transcripts and the notification outbox.
    /// `None` means `~/.leadflow`.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct NotifierConfig {
    #[serde(default)]
    pub staff_recipients: Vec<String>,
    #[serde(default = "default_sender")]
    pub sender: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            staff_recipients: Vec::new(),
            sender: default_sender(),
        }
    }
}

fn default_sender() -> String {
    "leadflow@localhost".to_string()
}
