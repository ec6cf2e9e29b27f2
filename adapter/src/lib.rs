pub mod config;
pub mod error;
pub mod management;
pub mod storage;

#[cfg(test)]
mod test_utils;

pub use error::{AdapterError, AdapterResult};
