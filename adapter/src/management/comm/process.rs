use crate::management::comm::ConsoleSink;
use crate::management::launch::LaunchCommand;
use log::{debug, warn};
use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

#[cfg(windows)]
const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;
#[cfg(windows)]
const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Where the captured console of an embedded server goes.
#[derive(Clone)]
pub struct ConsoleCapture {
    pub stdout: Arc<dyn ConsoleSink>,
    pub stderr: Arc<dyn ConsoleSink>,
}

// 进程句柄, 启动后归宿主所有
pub struct ProcessHandle {
    pid: Option<u32>,
    child: Child,
    readers: Vec<JoinHandle<()>>,
}

impl ProcessHandle {
    pub fn from_child(child: Child) -> Self {
        ProcessHandle {
            pid: child.id(),
            child,
            readers: vec![],
        }
    }

    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    pub async fn wait(&mut self) -> io::Result<ExitStatus> {
        self.child.wait().await
    }

    pub fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        self.child.try_wait()
    }

    /// Forced termination, for hosts that need a fallback after a graceful stop.
    pub async fn kill(&mut self) -> io::Result<()> {
        self.child.kill().await
    }

    /// Waits until both captured streams reached end of file.
    pub async fn console_closed(&mut self) {
        for reader in self.readers.drain(..) {
            if let Err(err) = reader.await {
                warn!("console reader of pid {:?} failed: {}", self.pid, err);
            }
        }
    }

    pub fn into_child(self) -> Child {
        self.child
    }
}

/// Spawns the server described by `command`. With a capture, stdout and
/// stderr are piped and forwarded line by line, each by its own task.
pub fn spawn(command: &LaunchCommand, capture: Option<ConsoleCapture>) -> io::Result<ProcessHandle> {
    let mut cmd = Command::new(&command.program);
    cmd.current_dir(&command.working_dir).kill_on_drop(true);

    #[cfg(windows)]
    {
        cmd.raw_arg(command.command_line());
        let window = if capture.is_some() {
            CREATE_NO_WINDOW
        } else {
            CREATE_NEW_CONSOLE
        };
        cmd.creation_flags(window | CREATE_NEW_PROCESS_GROUP);
    }
    #[cfg(not(windows))]
    cmd.args(command.unix_args()?);

    if capture.is_some() {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    }

    let mut child = cmd.spawn()?;
    let pid = child.id();
    debug!("spawned {} (pid={:?})", command.program.display(), pid);

    let mut readers = vec![];
    if let Some(capture) = capture {
        if let Some(stdout) = child.stdout.take() {
            readers.push(tokio::spawn(forward_lines(stdout, capture.stdout)));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(tokio::spawn(forward_lines(stderr, capture.stderr)));
        }
    }

    Ok(ProcessHandle {
        pid,
        child,
        readers,
    })
}

async fn forward_lines<R>(stream: R, sink: Arc<dyn ConsoleSink>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => sink.add_output(&line),
            Ok(None) => break,
            Err(err) => {
                warn!("console stream closed with error: {}", err);
                break;
            }
        }
    }
}
