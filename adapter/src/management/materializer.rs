//! Projects [`ServerSettings`] into the JSON file the dedicated server reads
//! at startup.

use crate::error::AdapterResult;
use crate::storage::sandboxed_join;
use gsm_protocol::management::server::ServerSettings;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const CONFIG_FILE_NAME: &str = "enshrouded_server.json";
pub const DEFAULT_SAVE_DIRECTORY: &str = "./savegame";
pub const DEFAULT_LOG_DIRECTORY: &str = "./logs";

/// Written once, right after the binaries are installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallConfig {
    pub name: String,
    pub password: String,
    pub save_directory: String,
    pub log_directory: String,
    pub ip: String,
    pub game_port: u16,
    pub query_port: u16,
    pub slot_count: u32,
}

/// Written before every start. Replaces the whole file, so the install-only
/// keys disappear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshConfig {
    pub name: String,
    pub ip: String,
    pub game_port: u16,
    pub query_port: u16,
    pub slot_count: u32,
}

impl From<&ServerSettings> for InstallConfig {
    fn from(settings: &ServerSettings) -> Self {
        InstallConfig {
            name: settings.name.clone(),
            password: String::new(),
            save_directory: DEFAULT_SAVE_DIRECTORY.to_owned(),
            log_directory: DEFAULT_LOG_DIRECTORY.to_owned(),
            ip: settings.ip.clone(),
            game_port: settings.game_port,
            query_port: settings.query_port,
            slot_count: settings.max_players,
        }
    }
}

impl From<&ServerSettings> for RefreshConfig {
    fn from(settings: &ServerSettings) -> Self {
        RefreshConfig {
            name: settings.name.clone(),
            ip: settings.ip.clone(),
            game_port: settings.game_port,
            query_port: settings.query_port,
            slot_count: settings.max_players,
        }
    }
}

pub fn config_path(settings: &ServerSettings) -> AdapterResult<PathBuf> {
    Ok(sandboxed_join(&settings.install_root, CONFIG_FILE_NAME)?)
}

pub async fn write_install_config(settings: &ServerSettings) -> AdapterResult<PathBuf> {
    tokio::fs::create_dir_all(&settings.install_root).await?;
    write_config(settings, &InstallConfig::from(settings)).await
}

pub async fn write_refresh_config(settings: &ServerSettings) -> AdapterResult<PathBuf> {
    write_config(settings, &RefreshConfig::from(settings)).await
}

async fn write_config<T: Serialize>(settings: &ServerSettings, config: &T) -> AdapterResult<PathBuf> {
    let path = config_path(settings)?;
    let content = serde_json::to_string_pretty(config).map_err(std::io::Error::from)?;
    tokio::fs::write(&path, content).await?;
    debug!("server(id={}) config written to {}", settings.id, path.display());
    Ok(path)
}
