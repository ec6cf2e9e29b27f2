use crate::error::AdapterResult;
use crate::storage::sandboxed_join;
use gsm_protocol::management::server::ServerSettings;
use std::io;
use std::path::PathBuf;

pub const START_PATH: &str = "enshrouded_server.exe";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: PathBuf,
    pub working_dir: PathBuf,
    pub args: Vec<String>,
    /// `args[0]` holds the operator's extra parameters
    passthrough: bool,
}

impl LaunchCommand {
    /// Builds the command line for `settings`. Operator parameters come first
    /// as a single untouched element.
    pub fn build(settings: &ServerSettings) -> AdapterResult<Self> {
        let program = sandboxed_join(&settings.install_root, START_PATH)?;

        let mut args = vec![];
        let extra = settings.extra_params.trim();
        let passthrough = !extra.is_empty();
        if passthrough {
            args.push(extra.to_owned());
        }
        args.push(format!("-ip=\"{}\"", settings.ip));
        args.push(format!("-gamePort={}", settings.game_port));
        args.push(format!("-queryPort={}", settings.query_port));
        args.push(format!("-slotCount={}", settings.max_players));
        // the server's own parser expects the name wrapped in three quotes
        args.push(format!("-name=\"\"\"{}\"\"\"", settings.name));

        Ok(LaunchCommand {
            program,
            working_dir: settings.install_root.clone(),
            args,
            passthrough,
        })
    }

    /// The arguments as one raw string, passed to the process unquoted on Windows.
    pub fn command_line(&self) -> String {
        self.args.join(" ")
    }

    /// Arguments as they are handed to `exec` on Unix, where the operator
    /// block is split with shell quoting rules.
    pub fn unix_args(&self) -> io::Result<Vec<String>> {
        let mut args = self.args.iter();
        let mut result = vec![];
        if self.passthrough {
            if let Some(extra) = args.next() {
                let words = shell_words::split(extra).map_err(|err| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("bad extra parameters `{extra}`: {err}"),
                    )
                })?;
                result.extend(words);
            }
        }
        result.extend(args.cloned());
        Ok(result)
    }
}
