use gsm_protocol::management::server::LifecycleState;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("{file_name} not found ({})", .path.display())]
    MissingExecutable { file_name: String, path: PathBuf },

    /// message from the installer, verbatim
    #[error("{0}")]
    Installer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid lifecycle transition: {from} -> {to}")]
    InvalidTransition {
        from: LifecycleState,
        to: LifecycleState,
    },
}

pub type AdapterResult<T> = Result<T, AdapterError>;
