mod control;
mod process;

pub use control::*;
pub use process::*;
