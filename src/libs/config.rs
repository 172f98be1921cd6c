//! Application configuration.
//!
//! Settings live in `config.json` in the data directory (see
//! [`DataStorage`]). A missing file means defaults everywhere: no backend,
//! a 10 second remote timeout, a 4 second undo window and the full layout.
//!
//! ## Sections
//!
//! - **remote**: backend URL and public key; absent means the app runs local-only
//! - **sync**: timeout applied to every remote call
//! - **ui**: compact layout default and how long `undo` stays available
//!
//! `EISEN_API_URL` and `EISEN_API_KEY` override the remote section when both
//! are set, which is how CI and the `.env` file point at a backend.
//!
//! ```rust,no_run
//! use eisen::libs::config::Config;
//!
//! let mut config = Config::read()?;
//! config.ui.compact_mode = true;
//! config.save()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::data_storage::DataStorage;
use crate::api::rest::RemoteConfig;
use crate::libs::messages::Message;
use crate::msg_print;
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, MultiSelect};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::{self, File};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const API_URL_ENV: &str = "EISEN_API_URL";
pub const API_KEY_ENV: &str = "EISEN_API_KEY";

/// A section offered by the setup wizard.
#[derive(Debug, Clone)]
pub struct ConfigModule {
    pub key: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SyncConfig {
    /// Upper bound for a single remote call, in seconds.
    pub timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig { timeout_secs: 10 }
    }
}

impl SyncConfig {
    pub fn module() -> ConfigModule {
        ConfigModule {
            key: "sync".to_string(),
            name: "Sync".to_string(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UiConfig {
    /// Compact layout for a store that has never saved the preference.
    pub compact_mode: bool,
    /// Seconds during which a deleted task can be restored in the shell.
    pub undo_window_secs: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            compact_mode: false,
            undo_window_secs: 4,
        }
    }
}

impl UiConfig {
    pub fn module() -> ConfigModule {
        ConfigModule {
            key: "ui".to_string(),
            name: "Interface".to_string(),
        }
    }

    pub fn undo_window(&self) -> Duration {
        Duration::from_secs(self.undo_window_secs)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

impl Config {
    /// Loads the config file, or defaults when there is none. Environment
    /// overrides are applied on top.
    pub fn read() -> Result<Config> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        let mut config = if config_file_path.exists() {
            let config_str = fs::read_to_string(config_file_path)?;
            serde_json::from_str(&config_str)?
        } else {
            Config::default()
        };

        if let (Ok(api_url), Ok(api_key)) = (env::var(API_URL_ENV), env::var(API_KEY_ENV)) {
            if !api_url.trim().is_empty() {
                config.remote = Some(RemoteConfig { api_url, api_key });
            }
        }
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        let config_file = File::create(config_file_path)?;
        serde_json::to_writer_pretty(&config_file, &self)?;
        Ok(())
    }

    /// A usable remote section, if any.
    pub fn remote(&self) -> Option<&RemoteConfig> {
        self.remote.as_ref().filter(|remote| !remote.api_url.trim().is_empty())
    }

    /// Interactive setup, starting from the current values.
    pub fn init() -> Result<Self> {
        let mut config = Self::read().unwrap_or_default();

        let modules = vec![RemoteConfig::module(), SyncConfig::module(), UiConfig::module()];
        let selected = MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptSelectModules.to_string())
            .items(&modules.iter().map(|module| &module.name).collect::<Vec<_>>())
            .interact()?;

        for &selection in &selected {
            match modules[selection].key.as_str() {
                "remote" => config.remote = Some(RemoteConfig::init(&config.remote)?),
                "sync" => {
                    msg_print!(Message::ConfigModuleSync);
                    config.sync = SyncConfig {
                        timeout_secs: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptSyncTimeout.to_string())
                            .default(config.sync.timeout_secs)
                            .interact_text()?,
                    };
                }
                "ui" => {
                    msg_print!(Message::ConfigModuleUi);
                    config.ui = UiConfig {
                        compact_mode: Confirm::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptCompactMode.to_string())
                            .default(config.ui.compact_mode)
                            .interact()?,
                        undo_window_secs: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptUndoWindow.to_string())
                            .default(config.ui.undo_window_secs)
                            .interact_text()?,
                    };
                }
                _ => {}
            }
        }

        Ok(config)
    }
}
