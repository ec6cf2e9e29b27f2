use anyhow::{anyhow, bail};
use enshrouded_adapter::config::{AppConfig, CONFIG_FILE};
use enshrouded_adapter::management::comm::{ConsoleCapture, ConsoleSink, ProcessHandle};
use enshrouded_adapter::management::{EnshroudedServer, GameServer, SteamCmd};
use log::{error, info, warn};
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Install,
    Update,
    Validate,
    Start,
    Check,
    Builds,
}

impl FromStr for Verb {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "install" => Verb::Install,
            "update" => Verb::Update,
            "validate" => Verb::Validate,
            "start" => Verb::Start,
            "check" => Verb::Check,
            "builds" => Verb::Builds,
            other => bail!(
                "unknown command '{}', expected install|update|validate|start|check|builds",
                other
            ),
        })
    }
}

struct LogSink(&'static str);

impl ConsoleSink for LogSink {
    fn add_output(&self, line: &str) {
        info!("[{}] {}", self.0, line);
    }
}

fn init_logger() {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();
}

fn report(server: &EnshroudedServer) {
    if let Some(notice) = server.notice() {
        warn!("{}", notice);
    }
    if let Some(err) = server.error() {
        error!("{}", err);
    }
}

async fn wait_installer(
    server: &EnshroudedServer,
    process: Option<ProcessHandle>,
) -> anyhow::Result<()> {
    let mut process = process.ok_or_else(|| anyhow!("installer did not start"))?;
    let status = process.wait().await?;
    info!("installer exited with {}", status);
    report(server);
    Ok(())
}

async fn run(verb: Verb, mut server: EnshroudedServer) -> anyhow::Result<()> {
    match verb {
        Verb::Install => {
            let process = server.install().await;
            report(&server);
            let process = process.ok_or_else(|| anyhow!("installer did not start"))?;
            if server.complete_install(process).await? {
                info!("installed into {}", server.settings().install_root.display());
            } else {
                report(&server);
                bail!("install incomplete");
            }
        }
        Verb::Update | Verb::Validate => {
            let process = server.update(verb == Verb::Validate, None).await;
            report(&server);
            wait_installer(&server, process).await?;
        }
        Verb::Start => {
            let mut process = match server.start().await? {
                Some(process) => process,
                None => {
                    report(&server);
                    bail!("server not started");
                }
            };
            let endpoint = server.query_endpoint();
            info!(
                "running, query endpoint {}:{}; press Ctrl+C to stop",
                endpoint.address, endpoint.port
            );

            let interrupted = tokio::select! {
                status = process.wait() => {
                    info!("server exited with {}", status?);
                    false
                }
                _ = tokio::signal::ctrl_c() => true,
            };
            if interrupted {
                server.stop(&process).await;
                report(&server);
                if process.try_wait()?.is_none() {
                    warn!("server still running after grace period, killing it");
                    process.kill().await?;
                }
            }
            process.console_closed().await;
        }
        Verb::Check => {
            if server.is_install_valid() {
                info!("install is valid");
            } else {
                bail!("install is missing or incomplete");
            }
        }
        Verb::Builds => {
            let local = server.local_build().await;
            report(&server);
            let remote = server.remote_build().await;
            report(&server);
            info!(
                "local build: {}, remote build: {}",
                local.as_deref().unwrap_or("?"),
                remote.as_deref().unwrap_or("?")
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let verb = std::env::args()
        .nth(1)
        .ok_or_else(|| {
            anyhow!("usage: enshrouded_adapter <install|update|validate|start|check|builds>")
        })?
        .parse::<Verb>()?;
    let config = AppConfig::load_from(CONFIG_FILE)?;

    let installer = Arc::new(SteamCmd::new(&config.steamcmd_path));
    let mut server = EnshroudedServer::new(config.server.clone(), installer);
    if config.embed_console {
        server = server.with_console(ConsoleCapture {
            stdout: Arc::new(LogSink("stdout")),
            stderr: Arc::new(LogSink("stderr")),
        });
    }

    run(verb, server).await?;
    info!("Bye.");
    Ok(())
}
