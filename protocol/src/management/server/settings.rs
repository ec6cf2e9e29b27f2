use crate::management::server::GameServerInfo;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// 服务器标识, 由宿主分配, 仅用于路径推导
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerId(String);

impl ServerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u32> for ServerId {
    fn from(value: u32) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for ServerId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ServerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Host-owned settings of one server instance.
///
/// Nothing here is validated: bad ports or names only surface once the
/// server process is spawned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    pub id: ServerId,
    pub name: String,
    pub ip: String,
    pub game_port: u16,
    pub query_port: u16,
    pub max_players: u32,
    #[serde(default)]
    pub extra_params: String,
    /// resolved by the host's path resolver before the settings reach the adapter
    pub install_root: PathBuf,
}

impl ServerSettings {
    pub fn with_defaults(
        info: &GameServerInfo,
        id: impl Into<ServerId>,
        install_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            name: info.full_name.to_owned(),
            ip: "0.0.0.0".to_owned(),
            game_port: info.port,
            query_port: info.query_port,
            max_players: info.max_players,
            extra_params: info.additional.to_owned(),
            install_root: install_root.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SETTINGS_TEXT: &str = r#"{
        "id": "42",
        "name": "Test",
        "ip": "127.0.0.1",
        "game_port": 15636,
        "query_port": 15637,
        "max_players": 16,
        "install_root": "servers/42/serverfiles"
    }"#;

    #[test]
    fn settings_deserialize_test() {
        let settings: ServerSettings = serde_json::from_str(SETTINGS_TEXT).unwrap();
        assert_eq!(
            settings,
            ServerSettings {
                id: ServerId::from(42),
                name: "Test".to_string(),
                ip: "127.0.0.1".to_string(),
                game_port: 15636,
                query_port: 15637,
                max_players: 16,
                extra_params: String::new(),
                install_root: PathBuf::from("servers/42/serverfiles"),
            }
        );
    }

    #[test]
    fn with_defaults_uses_game_info() {
        let settings =
            ServerSettings::with_defaults(&GameServerInfo::ENSHROUDED, "7", "/srv/7/serverfiles");
        assert_eq!(settings.id.as_str(), "7");
        assert_eq!(settings.name, GameServerInfo::ENSHROUDED.full_name);
        assert_eq!(settings.game_port, 15636);
        assert_eq!(settings.query_port, 15637);
        assert_eq!(settings.max_players, 16);
        assert!(settings.extra_params.is_empty());
    }
}
