use log::debug;
use std::io;
use std::sync::Mutex;

/// Receives console lines of a spawned server. One sink per stream.
pub trait ConsoleSink: Send + Sync {
    fn add_output(&self, line: &str);
}

/// Delivers the graceful-shutdown break to a server's console.
pub trait MainWindowControl: Send + Sync {
    fn set_main_window(&self, pid: u32);
    fn send_break(&self) -> io::Result<()>;
}

/// Default [`MainWindowControl`]: `SIGINT` on Unix, `CTRL_BREAK_EVENT` to the
/// server's process group on Windows, sent from inside the server's console.
#[derive(Default)]
pub struct SignalControl {
    target: Mutex<Option<u32>>,
}

impl SignalControl {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MainWindowControl for SignalControl {
    fn set_main_window(&self, pid: u32) {
        if let Ok(mut target) = self.target.lock() {
            *target = Some(pid);
        }
    }

    fn send_break(&self) -> io::Result<()> {
        let pid = self
            .target
            .lock()
            .map_err(|_| io::Error::other("console target lock poisoned"))?
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no main window selected"))?;
        debug!("sending break to pid {}", pid);
        send_break(pid)
    }
}

#[cfg(unix)]
fn send_break(pid: u32) -> io::Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    kill(Pid::from_raw(pid as i32), Signal::SIGINT).map_err(io::Error::from)
}

#[cfg(windows)]
fn send_break(pid: u32) -> io::Result<()> {
    use winapi::shared::minwindef::FALSE;
    use winapi::um::wincon::{
        AttachConsole, FreeConsole, GenerateConsoleCtrlEvent, ATTACH_PARENT_PROCESS,
        CTRL_BREAK_EVENT,
    };

    // 控制台附着是进程级状态, 同一时间只能借用一个
    static CONSOLE: Mutex<()> = Mutex::new(());
    let _guard = CONSOLE
        .lock()
        .map_err(|_| io::Error::other("console lock poisoned"))?;

    // ctrl events only reach processes on the caller's console, and the server
    // always runs on its own
    unsafe {
        FreeConsole();
        if AttachConsole(pid) == FALSE {
            let err = io::Error::last_os_error();
            AttachConsole(ATTACH_PARENT_PROCESS);
            return Err(err);
        }

        // the server is spawned as its own process group, whose id is its pid
        let result = if GenerateConsoleCtrlEvent(CTRL_BREAK_EVENT, pid) == FALSE {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        };

        FreeConsole();
        AttachConsole(ATTACH_PARENT_PROCESS);
        result
    }
}
