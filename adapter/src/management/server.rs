use crate::error::{AdapterError, AdapterResult};
use crate::management::comm::{
    spawn, ConsoleCapture, MainWindowControl, ProcessHandle, SignalControl,
};
use crate::management::installer::PackageInstaller;
use crate::management::launch::{LaunchCommand, START_PATH};
use crate::management::lifecycle::Lifecycle;
use crate::management::materializer::{write_install_config, write_refresh_config};
use async_trait::async_trait;
use gsm_protocol::management::server::{
    GameServerInfo, LifecycleState, QueryEndpoint, ServerSettings,
};
use log::{error, info, warn};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// How long a stop waits after the break signal. Never cut short.
pub const STOP_GRACE_PERIOD: Duration = Duration::from_secs(20);

static ENSHROUDED_INFO: GameServerInfo = GameServerInfo::ENSHROUDED;

/// One game's knowledge of how to install, configure, run and stop its
/// dedicated server.
///
/// Failures are recorded in [`GameServer::error`]; operations that can fail
/// that way return `None`. Callers check both. IO failures are also returned
/// as `Err`.
#[async_trait]
pub trait GameServer: Send + Sync {
    fn info(&self) -> &'static GameServerInfo;

    fn settings(&self) -> &ServerSettings;

    fn settings_mut(&mut self) -> &mut ServerSettings;

    fn error(&self) -> Option<&str>;

    fn notice(&self) -> Option<&str>;

    fn state(&self) -> LifecycleState;

    fn subscribe(&self) -> broadcast::Receiver<LifecycleState>;

    fn query_endpoint(&self) -> QueryEndpoint {
        self.info().query_method.endpoint(self.settings())
    }

    async fn start(&mut self) -> AdapterResult<Option<ProcessHandle>>;

    async fn stop(&mut self, process: &ProcessHandle);

    async fn install(&mut self) -> Option<ProcessHandle>;

    /// Waits for the installer started by [`GameServer::install`] and writes
    /// the first configuration once the binaries are in place.
    async fn complete_install(&mut self, installer: ProcessHandle) -> AdapterResult<bool>;

    async fn create_server_config(&mut self) -> AdapterResult<()>;

    async fn update(&mut self, validate: bool, custom: Option<&str>) -> Option<ProcessHandle>;

    fn is_install_valid(&self) -> bool;

    fn is_import_valid(&mut self, path: &Path) -> bool;

    async fn local_build(&mut self) -> Option<String>;

    async fn remote_build(&mut self) -> Option<String>;
}

pub struct EnshroudedServer {
    settings: ServerSettings,
    installer: Arc<dyn PackageInstaller>,
    control: Arc<dyn MainWindowControl>,
    console: Option<ConsoleCapture>,
    lifecycle: Lifecycle,
    error: Option<String>,
    notice: Option<String>,
}

impl EnshroudedServer {
    pub fn new(settings: ServerSettings, installer: Arc<dyn PackageInstaller>) -> Self {
        EnshroudedServer {
            settings,
            installer,
            control: Arc::new(SignalControl::new()),
            console: None,
            lifecycle: Lifecycle::new(),
            error: None,
            notice: None,
        }
    }

    /// Embeds the server console: output is piped into `capture` instead of
    /// a window of its own.
    pub fn with_console(mut self, capture: ConsoleCapture) -> Self {
        self.console = Some(capture);
        self
    }

    pub fn with_control(mut self, control: Arc<dyn MainWindowControl>) -> Self {
        self.control = control;
        self
    }

    pub fn embeds_console(&self) -> bool {
        ENSHROUDED_INFO.allows_embed_console && self.console.is_some()
    }

    fn reset_messages(&mut self) {
        self.error = None;
        self.notice = None;
    }

    fn record(&mut self, err: AdapterError) -> AdapterError {
        self.error = Some(err.to_string());
        err
    }

    async fn executable_exists(path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    async fn launch(&mut self) -> AdapterResult<Option<ProcessHandle>> {
        let command = LaunchCommand::build(&self.settings)?;
        if !Self::executable_exists(&command.program).await {
            let err = AdapterError::MissingExecutable {
                file_name: START_PATH.to_owned(),
                path: command.program.clone(),
            };
            warn!("server(id={}) cannot start: {}", self.settings.id, err);
            self.error = Some(err.to_string());
            self.lifecycle.transition(LifecycleState::Failed)?;
            return Ok(None);
        }

        write_refresh_config(&self.settings).await?;

        let capture = if self.embeds_console() {
            self.console.clone()
        } else {
            None
        };
        let process = spawn(&command, capture)?;
        self.lifecycle.transition(LifecycleState::Running)?;
        info!(
            "server(id={}) started (pid={:?})",
            self.settings.id,
            process.id()
        );
        Ok(Some(process))
    }
}

#[async_trait]
impl GameServer for EnshroudedServer {
    fn info(&self) -> &'static GameServerInfo {
        &ENSHROUDED_INFO
    }

    fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut ServerSettings {
        &mut self.settings
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    fn subscribe(&self) -> broadcast::Receiver<LifecycleState> {
        self.lifecycle.subscribe()
    }

    async fn start(&mut self) -> AdapterResult<Option<ProcessHandle>> {
        self.reset_messages();
        let previous = self.lifecycle.state();
        if let Err(err) = self.lifecycle.transition(LifecycleState::Starting) {
            return Err(self.record(err));
        }

        match self.launch().await {
            Ok(process) => Ok(process),
            Err(err) => {
                error!("server(id={}) failed to start: {}", self.settings.id, err);
                self.lifecycle.revert(previous);
                Err(self.record(err))
            }
        }
    }

    async fn stop(&mut self, process: &ProcessHandle) {
        self.reset_messages();
        self.lifecycle.force(LifecycleState::Stopping);

        match process.id() {
            Some(pid) => {
                let control = self.control.clone();
                let sent = tokio::task::spawn_blocking(move || {
                    control.set_main_window(pid);
                    control.send_break()
                })
                .await
                .map_err(std::io::Error::other)
                .and_then(|result| result);
                if let Err(err) = sent {
                    warn!("server(id={}) break not delivered: {}", self.settings.id, err);
                    self.error = Some(err.to_string());
                }
            }
            None => warn!("server(id={}) process has no pid, nothing to signal", self.settings.id),
        }

        tokio::time::sleep(STOP_GRACE_PERIOD).await;
        self.lifecycle.force(LifecycleState::Stopped);
        info!("server(id={}) stopped", self.settings.id);
    }

    async fn install(&mut self) -> Option<ProcessHandle> {
        self.reset_messages();
        let outcome = self
            .installer
            .install(&self.settings.install_root, "", ENSHROUDED_INFO.app_id)
            .await;
        self.error = outcome.error;
        outcome.process
    }

    async fn complete_install(&mut self, mut installer: ProcessHandle) -> AdapterResult<bool> {
        let status = installer.wait().await.map_err(|err| self.record(err.into()))?;
        if !self.is_install_valid() {
            warn!(
                "server(id={}) installer exited with {} but {} is missing",
                self.settings.id, status, START_PATH
            );
            self.error = Some(format!("{START_PATH} is missing after install ({status})"));
            return Ok(false);
        }
        self.create_server_config().await?;
        Ok(true)
    }

    async fn create_server_config(&mut self) -> AdapterResult<()> {
        match write_install_config(&self.settings).await {
            Ok(path) => {
                info!("server(id={}) config created at {}", self.settings.id, path.display());
                Ok(())
            }
            Err(err) => Err(self.record(err)),
        }
    }

    async fn update(&mut self, validate: bool, custom: Option<&str>) -> Option<ProcessHandle> {
        self.reset_messages();
        let outcome = self
            .installer
            .update(
                &self.settings.install_root,
                ENSHROUDED_INFO.app_id,
                validate,
                custom,
            )
            .await;
        self.error = outcome.error;

        if let (Some(message), true) = (self.error.clone(), outcome.process.is_some()) {
            warn!(
                "server(id={}) update reported \"{}\", refreshing config",
                self.settings.id, message
            );
            match write_refresh_config(&self.settings).await {
                Ok(_) => {
                    self.notice = Some("Server files updated with errors; config refreshed.".into())
                }
                Err(err) => {
                    error!("server(id={}) config refresh failed: {}", self.settings.id, err);
                    self.error = Some(format!("{message}; config refresh failed: {err}"));
                }
            }
        }
        outcome.process
    }

    fn is_install_valid(&self) -> bool {
        self.settings.install_root.join(START_PATH).is_file()
    }

    fn is_import_valid(&mut self, path: &Path) -> bool {
        self.reset_messages();
        let exe_path = path.join(START_PATH);
        let valid = exe_path.is_file();
        if !valid {
            self.error = Some(format!("Invalid path! Cannot find {START_PATH}"));
        }
        valid
    }

    async fn local_build(&mut self) -> Option<String> {
        self.reset_messages();
        let build = self
            .installer
            .local_build(&self.settings.install_root, ENSHROUDED_INFO.app_id)
            .await;
        match build {
            Ok(build) => Some(build),
            Err(err) => {
                self.error = Some(err.to_string());
                None
            }
        }
    }

    async fn remote_build(&mut self) -> Option<String> {
        self.reset_messages();
        match self.installer.remote_build(ENSHROUDED_INFO.app_id).await {
            Ok(build) => Some(build),
            Err(err) => {
                self.error = Some(err.to_string());
                None
            }
        }
    }
}
