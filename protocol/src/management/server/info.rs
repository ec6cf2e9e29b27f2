use crate::management::server::ServerSettings;
use serde::{Deserialize, Serialize};

/// Status query strategies a host can run against a game server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMethod {
    /// Steam server query (A2S_INFO) over UDP on the query port.
    A2s,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryEndpoint {
    pub address: String,
    pub port: u16,
}

impl QueryMethod {
    pub fn endpoint(&self, settings: &ServerSettings) -> QueryEndpoint {
        match self {
            QueryMethod::A2s => QueryEndpoint {
                address: settings.ip.clone(),
                port: settings.query_port,
            },
        }
    }
}

/// Static description of a supported game, read by the host when listing
/// and provisioning servers.
#[derive(Debug, Clone, Serialize)]
pub struct GameServerInfo {
    pub full_name: &'static str,
    /// 相对于安装目录的启动文件
    pub start_path: &'static str,
    pub allows_embed_console: bool,
    pub port_increments: u16,
    pub query_method: QueryMethod,
    pub port: u16,
    pub query_port: u16,
    pub default_map: &'static str,
    pub max_players: u32,
    pub additional: &'static str,
    pub app_id: &'static str,
}

impl GameServerInfo {
    pub const ENSHROUDED: GameServerInfo = GameServerInfo {
        full_name: "Enshrouded Dedicated Server",
        start_path: "enshrouded_server.exe",
        allows_embed_console: true,
        port_increments: 2,
        query_method: QueryMethod::A2s,
        port: 15636,
        query_port: 15637,
        default_map: "Dedicated",
        max_players: 16,
        additional: "",
        app_id: "2278520",
    };

    /// Game and query port for the `offset`-th server of this game on one host.
    /// `None` once the ports no longer fit in `u16`.
    pub fn ports_for(&self, offset: u16) -> Option<(u16, u16)> {
        let game_port = offset
            .checked_mul(self.port_increments)
            .and_then(|step| self.port.checked_add(step))?;
        let query_port = game_port.checked_add(self.query_port.checked_sub(self.port)?)?;
        Some((game_port, query_port))
    }
}
