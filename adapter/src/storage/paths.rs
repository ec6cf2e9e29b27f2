use gsm_protocol::management::server::ServerId;
use std::io;
use std::path::{Path, PathBuf};

pub const SERVERS_DIR: &str = "servers";
pub const SERVER_FILES_DIR: &str = "serverfiles";

/// Maps a server identity and a relative file name to an absolute location
/// inside that server's own file tree.
pub trait PathResolver: Send + Sync {
    fn server_files(&self, id: &ServerId, relative: &str) -> io::Result<PathBuf>;
}

/// `<root>/servers/<id>/serverfiles/<relative>`
#[derive(Debug, Clone)]
pub struct ServerPaths {
    root: PathBuf,
}

impl ServerPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn install_root(&self, id: &ServerId) -> PathBuf {
        self.root
            .join(SERVERS_DIR)
            .join(id.as_str())
            .join(SERVER_FILES_DIR)
    }
}

impl PathResolver for ServerPaths {
    fn server_files(&self, id: &ServerId, relative: &str) -> io::Result<PathBuf> {
        // id 必须是单个目录名
        let servers = self.root.join(SERVERS_DIR);
        if sandboxed_join(&servers, id.as_str())? == servers
            || id.as_str().contains(['\\', '/'])
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid server id: {id}"),
            ));
        }
        sandboxed_join(&self.install_root(id), relative)
    }
}

/// Joins `relative` onto `root`, refusing names that climb out of `root`.
pub fn sandboxed_join(root: &Path, relative: &str) -> io::Result<PathBuf> {
    match normalize_relative(relative) {
        Some(parts) => Ok(parts.iter().fold(root.to_path_buf(), |path, part| path.join(part))),
        None => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("path escapes server directory: {relative}"),
        )),
    }
}

// 从算法层面处理 . 和 .., 不访问文件系统
fn normalize_relative(path: &str) -> Option<Vec<&str>> {
    if path.starts_with(['\\', '/']) || path.contains(':') {
        return None;
    }

    let mut stack = vec![];
    for part in path.split(['\\', '/']).filter(|s| !s.is_empty()) {
        match part {
            "." => {}
            ".." => {
                stack.pop()?;
            }
            _ => stack.push(part),
        }
    }
    Some(stack)
}
