pub mod file;
pub mod paths;

pub use file::{FileIoWithBackup, JsonConfig};
pub use paths::{sandboxed_join, PathResolver, ServerPaths};
