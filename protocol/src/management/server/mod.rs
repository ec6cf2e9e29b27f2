mod info;
mod settings;
mod status;

pub use info::*;
pub use settings::*;
pub use status::*;
