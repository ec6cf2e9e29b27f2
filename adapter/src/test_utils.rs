use crate::management::comm::ConsoleSink;
use crate::management::launch::START_PATH;
use gsm_protocol::management::server::{ServerId, ServerSettings};
use std::path::Path;
use std::sync::Mutex;

#[derive(Default)]
pub struct LineCollector(Mutex<Vec<String>>);

impl ConsoleSink for LineCollector {
    fn add_output(&self, line: &str) {
        self.0.lock().unwrap().push(line.to_string());
    }
}

impl LineCollector {
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Places an executable shell script where the server binary is expected.
#[cfg(unix)]
pub fn fake_server(root: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    let path = root.join(START_PATH);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

pub fn settings(root: &Path) -> ServerSettings {
    ServerSettings {
        id: ServerId::from(42),
        name: "Test".to_string(),
        ip: "127.0.0.1".to_string(),
        game_port: 15636,
        query_port: 15637,
        max_players: 16,
        extra_params: String::new(),
        install_root: root.to_path_buf(),
    }
}
