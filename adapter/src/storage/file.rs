use anyhow::Context;
use log::debug;
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;

pub trait FileIoWithBackup {
    /// Keeps the previous content as `<name>.bak` before overwriting `path`.
    fn write_with_backup<P: AsRef<Path>>(path: P, content: &str) -> std::io::Result<()> {
        let path = path.as_ref();
        if path.is_file() {
            std::fs::copy(path, path.with_extension("bak"))?;
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
    }
}

/// Pretty-printed JSON configuration stored on disk.
pub trait JsonConfig: FileIoWithBackup + Serialize + DeserializeOwned + Sized {
    fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("malformed {}", path.display()))
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        Self::write_with_backup(path, &content)?;
        Ok(())
    }

    fn load_or_default<P: AsRef<Path>, F: FnOnce() -> Self>(
        path: P,
        default: F,
    ) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.is_file() {
            Self::load(path)
        } else {
            debug!("{} not found, writing defaults", path.display());
            let config = default();
            config.save(path)?;
            Ok(config)
        }
    }
}
