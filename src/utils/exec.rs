//! Running the JavaScript toolchain.
//!
//! Two shapes of child process are needed:
//!
//! - one-shot driver commands (`resolve-config`, `build`, `build-ssr`),
//!   captured with [`Cmd::run`], optionally under a PTY so the bundler keeps
//!   its colored output
//! - app sessions, spawned with [`Cmd::spawn`] and driven line by line
//!
//! ```ignore
//! let reply = Cmd::from_slice(&node)
//!     .arg(&driver)
//!     .arg("resolve-config")
//!     .arg(payload)
//!     .cwd(root)
//!     .run()?;
//!
//! Cmd::from_slice(&node)
//!     .arg(&driver)
//!     .arg("build")
//!     .arg(payload)
//!     .pty(true)
//!     .filter(&VITE_FILTER)
//!     .run()?;
//! ```

use crate::log;
use anyhow::{Context, Result, anyhow, bail};
use portable_pty::{CommandBuilder, NativePtySystem, PtySize, PtySystem};
use regex::Regex;
use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::sync::OnceLock;
use std::thread;

/// A child process invocation.
#[derive(Debug, Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    pty: bool,
    filter: Option<&'static NoiseFilter>,
}

impl Cmd {
    /// From a command line such as `["node"]` or `["npx", "tsx"]`.
    pub fn from_slice<S: AsRef<OsStr>>(argv: &[S]) -> Self {
        let mut argv = argv.iter().map(|arg| arg.as_ref().to_owned());
        Self {
            program: argv.next().unwrap_or_default(),
            args: argv.collect(),
            ..Self::default()
        }
    }

    /// Append an argument; empty ones are dropped.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Attach the child to a pseudo-terminal.
    pub fn pty(mut self, enable: bool) -> Self {
        self.pty = enable;
        self
    }

    /// Lines of diagnostic output to keep out of the log.
    pub fn filter(mut self, filter: &'static NoiseFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    fn name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }
        command
    }

    /// Run to completion.
    ///
    /// Fails on a non-zero exit. Diagnostic output is logged through the
    /// filter: stderr, or the whole transcript under a PTY.
    pub fn run(self) -> Result<Output> {
        let filter = self.filter.unwrap_or(&NoiseFilter::NONE);
        let name = self.name();
        let in_pty = self.pty;

        let output = if in_pty {
            self.run_in_pty()?
        } else {
            self.command()
                .output()
                .with_context(|| format!("Failed to execute `{name}`"))?
        };

        if !output.status.success() {
            bail!(failure_message(&name, &output, filter));
        }

        // captured stdout is the command's reply
        let diagnostics = if in_pty { &output.stdout } else { &output.stderr };
        filter.log(&name, &String::from_utf8_lossy(diagnostics));
        Ok(output)
    }

    /// Start with piped stdin/stdout; stderr goes straight to the terminal.
    pub fn spawn(self) -> Result<Child> {
        let name = self.name();
        self.command()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("Failed to spawn `{name}`"))
    }

    /// Run under a PTY; the transcript comes back as stdout.
    fn run_in_pty(self) -> Result<Output> {
        let name = self.name();

        let mut command = CommandBuilder::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.cwd {
            command.cwd(dir);
        }

        let pair = NativePtySystem::default().openpty(PtySize {
            rows: 40,
            cols: 120,
            pixel_width: 0,
            pixel_height: 0,
        })?;
        let mut child = pair
            .slave
            .spawn_command(command)
            .with_context(|| format!("Failed to spawn `{name}`"))?;
        drop(pair.slave);

        // the reader only sees EOF once the child and the master are gone
        let mut reader = pair.master.try_clone_reader()?;
        let transcript = thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = reader.read_to_end(&mut buf);
            buf
        });

        let status = child.wait()?;
        drop(pair.master);
        let transcript = transcript
            .join()
            .map_err(|_| anyhow!("`{name}` output reader panicked"))?;

        Ok(Output {
            status: exit_status(status.exit_code()),
            stdout: transcript,
            stderr: Vec::new(),
        })
    }
}

#[cfg(unix)]
#[allow(clippy::cast_possible_wrap)]
fn exit_status(code: u32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw((code as i32) << 8)
}

#[cfg(windows)]
fn exit_status(code: u32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    ExitStatus::from_raw(code)
}

// ============================================================================
// Output filtering
// ============================================================================

/// Prefixes of output lines that are progress noise.
#[derive(Debug)]
pub struct NoiseFilter {
    skip: &'static [&'static str],
}

impl NoiseFilter {
    /// Keeps every non-empty line.
    pub const NONE: Self = Self::new(&[]);

    pub const fn new(skip: &'static [&'static str]) -> Self {
        Self { skip }
    }

    fn is_noise(&self, line: &str) -> bool {
        line.is_empty() || self.skip.iter().any(|prefix| line.starts_with(prefix))
    }

    /// Clean lines of `output` that are not noise.
    fn keep(&self, output: &str) -> Vec<String> {
        output
            .lines()
            .map(|line| strip_ansi(line).trim().to_string())
            .filter(|line| !self.is_noise(line))
            .collect()
    }

    /// Log what survives the filter under `name`, as one block.
    pub fn log(&self, name: &str, output: &str) {
        let kept = self.keep(output);
        if !kept.is_empty() {
            log!(name; "{}", kept.join("\n"));
        }
    }
}

fn strip_ansi(s: &str) -> Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("valid regex"))
        .replace_all(s, "")
}

/// Error text for a failed command: status, then whatever it printed.
fn failure_message(name: &str, output: &Output, filter: &NoiseFilter) -> String {
    let mut message = format!("`{name}` exited with {}", output.status);

    let printed: Vec<String> = [&output.stderr, &output.stdout]
        .into_iter()
        .map(|bytes| String::from_utf8_lossy(bytes))
        // a JSON reply carries no diagnostics
        .filter(|text| !text.trim_start().starts_with('{'))
        .flat_map(|text| filter.keep(&text))
        .collect();

    if !printed.is_empty() {
        message.push('\n');
        message.push_str(&printed.join("\n"));
    }
    message
}
