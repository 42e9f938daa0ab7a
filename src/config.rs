// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use config::{Environment, File, FileFormat};
use log::warn;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use validator::Validate;

/// File name of the configuration in the user's home directory.
pub const DEFAULT_CONFIG_FILE: &str = ".gmaillabelpurge";

#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct Credentials {
    #[validate(length(min = 1, message = "Please set a username in your config file"))]
    pub username: String,
    #[validate(length(min = 1, message = "Please set a password in your config file"))]
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    pub port: u16,
    pub login_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "imap.gmail.com".to_string(),
            port: 993,
            login_timeout_secs: 30,
        }
    }
}

/// How the age selector finds old messages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SelectionStrategy {
    /// `UID SEARCH SENTBEFORE`, trusting the server's date comparison
    Server,
    /// Fetch every Date header and compute the age locally
    Client,
}

fn default_root_candidates() -> Vec<String> {
    vec!["[Gmail]".to_string(), "[Google Mail]".to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PurgeConfig {
    pub strategy: SelectionStrategy,
    #[serde(default = "default_root_candidates")]
    #[validate(length(min = 1))]
    pub root_candidates: Vec<String>,
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            strategy: SelectionStrategy::Server,
            root_candidates: default_root_candidates(),
        }
    }
}

/// A label and the age (in days) beyond which its messages are purged.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct PurgeRule {
    #[validate(length(min = 1, message = "Rule label must not be empty"))]
    pub label: String,
    pub max_age_days: u32,
}

impl PurgeRule {
    pub fn new(label: impl Into<String>, max_age_days: u32) -> Self {
        Self {
            label: label.into(),
            max_age_days,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Settings {
    #[validate(nested)]
    pub account: Credentials,
    #[validate(nested)]
    pub server: ServerConfig,
    #[validate(nested)]
    pub purge: PurgeConfig,
    #[validate(length(min = 1, message = "Please configure at least one [[rules]] entry"), nested)]
    pub rules: Vec<PurgeRule>,
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Could not determine the home directory; pass --config explicitly")]
    NoHomeDir,
    #[error("Please set up your configuration in {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: config::ConfigError,
    },
    #[error("Invalid configuration in {path}: {source}")]
    Invalid {
        path: String,
        #[source]
        source: validator::ValidationErrors,
    },
}

/// `~/.gmaillabelpurge`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DEFAULT_CONFIG_FILE))
}

impl Settings {
    /// Loads the TOML configuration at `config_path` (or the default path),
    /// layered with `LABELPURGE_*` environment overrides, and validates it.
    pub fn new(config_path: Option<&Path>) -> Result<Self, SettingsError> {
        let path = match config_path {
            Some(path) => path.to_path_buf(),
            None => default_config_path().ok_or(SettingsError::NoHomeDir)?,
        };
        let display_path = path.display().to_string();
        let load_err = |source| SettingsError::Load {
            path: display_path.clone(),
            source,
        };

        let defaults = ServerConfig::default();
        let mut config_builder = config::Config::builder()
            // Server defaults
            .set_default("server.host", defaults.host)
            .map_err(load_err)?
            .set_default("server.port", defaults.port)
            .map_err(load_err)?
            .set_default("server.login_timeout_secs", defaults.login_timeout_secs)
            .map_err(load_err)?
            // Purge defaults
            .set_default("purge.strategy", "server")
            .map_err(load_err)?
            .add_source(File::new(&display_path, FileFormat::Toml).required(true))
            // e.g. `LABELPURGE_ACCOUNT__PASSWORD=...` would override `account.password`
            .add_source(
                Environment::with_prefix("LABELPURGE")
                    .prefix_separator("_")
                    .separator("__")
                    .ignore_empty(true),
            );

        // Direct environment variables for the connection settings
        let env_vars = [
            ("IMAP_HOST", "server.host"),
            ("IMAP_PORT", "server.port"),
            ("IMAP_USER", "account.username"),
            ("IMAP_PASS", "account.password"),
        ];
        for (env_var, key) in &env_vars {
            if let Ok(value) = env::var(env_var) {
                if *env_var == "IMAP_PORT" {
                    if let Ok(port) = value.parse::<u16>() {
                        config_builder = config_builder.set_override(*key, port).map_err(load_err)?;
                    } else {
                        warn!("Invalid port value in {}: {}", env_var, value);
                    }
                } else {
                    config_builder = config_builder.set_override(*key, value).map_err(load_err)?;
                }
            }
        }

        let settings: Settings = config_builder
            .build()
            .and_then(|built| built.try_deserialize())
            .map_err(load_err)?;

        settings.validate().map_err(|source| SettingsError::Invalid {
            path: display_path.clone(),
            source,
        })?;
        Ok(settings)
    }

    pub fn credentials(&self) -> &Credentials {
        &self.account
    }
}
