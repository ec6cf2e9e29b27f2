use crate::storage::{FileIoWithBackup, JsonConfig, PathResolver, ServerPaths};
use gsm_protocol::management::server::{GameServerInfo, ServerId, ServerSettings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "adapter.json";

#[cfg(windows)]
const DEFAULT_STEAMCMD: &str = "steamcmd/steamcmd.exe";
#[cfg(not(windows))]
const DEFAULT_STEAMCMD: &str = "steamcmd/steamcmd.sh";

/// Configuration of the standalone runner, which plays the host's part for
/// a single server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub servers_root: PathBuf,
    pub steamcmd_path: PathBuf,
    #[serde(default = "default_embed_console")]
    pub embed_console: bool,
    pub server: ServerSettings,
}

fn default_embed_console() -> bool {
    true
}

impl FileIoWithBackup for AppConfig {}

impl JsonConfig for AppConfig {}

impl Default for AppConfig {
    fn default() -> Self {
        let servers_root = PathBuf::from(".");
        let id = ServerId::from(1);
        let install_root = ServerPaths::new(&servers_root).install_root(&id);
        AppConfig {
            server: ServerSettings::with_defaults(&GameServerInfo::ENSHROUDED, id, install_root),
            servers_root,
            steamcmd_path: PathBuf::from(DEFAULT_STEAMCMD),
            embed_console: default_embed_console(),
        }
    }
}

impl AppConfig {
    pub fn load_from(path: impl AsRef<Path>) -> anyhow::Result<AppConfig> {
        let mut config = Self::load_or_default(path, Self::default)?;
        if config.server.install_root.as_os_str().is_empty() {
            config.server.install_root =
                ServerPaths::new(&config.servers_root).server_files(&config.server.id, "")?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let config = AppConfig::load_from(&path).unwrap();

        assert!(path.is_file());
        assert!(config.embed_console);
        assert_eq!(config.server.game_port, 15636);
        assert_eq!(
            config.server.install_root,
            Path::new(".").join("servers").join("1").join("serverfiles")
        );
    }

    #[test]
    fn test_empty_install_root_is_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            r#"{
                "servers_root": "/opt/gsm",
                "steamcmd_path": "/opt/steamcmd/steamcmd.sh",
                "server": {
                    "id": "3",
                    "name": "Embervale",
                    "ip": "10.0.0.2",
                    "game_port": 15640,
                    "query_port": 15641,
                    "max_players": 10,
                    "install_root": ""
                }
            }"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();

        assert!(config.embed_console);
        assert_eq!(
            config.server.install_root,
            PathBuf::from("/opt/gsm/servers/3/serverfiles")
        );
    }

    #[test]
    fn test_escaping_server_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            r#"{
                "servers_root": "/opt/gsm",
                "steamcmd_path": "/opt/steamcmd/steamcmd.sh",
                "server": {
                    "id": "../other",
                    "name": "Embervale",
                    "ip": "10.0.0.2",
                    "game_port": 15640,
                    "query_port": 15641,
                    "max_players": 10,
                    "install_root": ""
                }
            }"#,
        )
        .unwrap();

        assert!(AppConfig::load_from(&path).is_err());
    }
}
