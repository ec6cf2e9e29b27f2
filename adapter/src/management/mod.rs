pub mod comm;
pub mod installer;
pub mod launch;
pub mod lifecycle;
pub mod materializer;
pub mod server;

pub use installer::{InstallerOutcome, PackageInstaller, SteamCmd};
pub use server::{EnshroudedServer, GameServer, STOP_GRACE_PERIOD};
