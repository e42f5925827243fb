//! External process execution
//!
//! Every shell-out in the pipeline (git, the container engine) goes through
//! [`ProcessRunner`], so the stages can be driven by a scripted runner in tests.

use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;

use tracing::debug;

use crate::error::{ProcessError, Result};

/// A command to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program name or path
    pub program: String,
    /// Arguments passed to the program
    pub args: Vec<String>,
    /// Working directory (inherits the current one if None)
    pub working_dir: Option<PathBuf>,
}

impl CommandSpec {
    /// Create a new command with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    /// Append a single argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, None if the process was killed by a signal
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    /// Output of a command that exited 0
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    /// Output of a command that exited with `code`
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: Some(code),
        }
    }

    /// Replace stderr
    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }

    /// Whether the command exited 0
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout followed by stderr
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }

    /// Short reason string for error messages
    pub fn failure_reason(&self) -> String {
        let stderr = self.stderr.trim();
        match self.exit_code {
            Some(code) if stderr.is_empty() => format!("exit code {}", code),
            Some(code) => format!("exit code {}: {}", code, stderr),
            None if stderr.is_empty() => "terminated by signal".to_string(),
            None => format!("terminated by signal: {}", stderr),
        }
    }
}

/// One line printed by a running command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLine<'a> {
    Stdout(&'a str),
    Stderr(&'a str),
}

impl<'a> OutputLine<'a> {
    /// Line text without the trailing newline
    pub fn text(&self) -> &'a str {
        match self {
            Self::Stdout(line) | Self::Stderr(line) => line,
        }
    }
}

/// Capability to run an external command and wait for it
///
/// A non-zero exit is returned as `Ok`; only a failure to launch is an `Err`.
pub trait ProcessRunner: Send + Sync {
    /// Run the command to completion and capture its output
    fn run(&self, command: &CommandSpec) -> Result<ProcessOutput>;

    /// Run the command, handing each output line to `on_line` as it is printed.
    ///
    /// The default implementation replays the captured output once the command
    /// has exited, stdout first.
    fn run_streaming(
        &self,
        command: &CommandSpec,
        on_line: &mut dyn FnMut(OutputLine<'_>),
    ) -> Result<ProcessOutput> {
        let output = self.run(command)?;
        for line in output.stdout.lines() {
            on_line(OutputLine::Stdout(line));
        }
        for line in output.stderr.lines() {
            on_line(OutputLine::Stderr(line));
        }
        Ok(output)
    }
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(&self, command: &CommandSpec) -> Result<ProcessOutput> {
        (**self).run(command)
    }

    fn run_streaming(
        &self,
        command: &CommandSpec,
        on_line: &mut dyn FnMut(OutputLine<'_>),
    ) -> Result<ProcessOutput> {
        (**self).run_streaming(command, on_line)
    }
}

/// Runner backed by `std::process::Command`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    /// Create a new system runner
    pub fn new() -> Self {
        Self
    }

    fn command(&self, command: &CommandSpec) -> Result<Command> {
        let program = which::which(&command.program)
            .map_err(|_| ProcessError::NotFound(command.program.clone()))?;

        debug!(command = %command, cwd = ?command.working_dir, "running command");

        let mut cmd = Command::new(program);
        cmd.args(&command.args);
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        Ok(cmd)
    }
}

fn spawn_failed(command: &CommandSpec, e: std::io::Error) -> ProcessError {
    ProcessError::SpawnFailed {
        command: command.to_string(),
        reason: e.to_string(),
    }
}

/// Send each line of `source` down `tx`, tagged with the stream it came from
fn forward_lines<R>(
    source: R,
    is_stderr: bool,
    tx: mpsc::Sender<(bool, String)>,
) -> thread::JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(source);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf)
                        .trim_end_matches(&['\r', '\n'][..])
                        .to_string();
                    if tx.send((is_stderr, line)).is_err() {
                        break;
                    }
                }
            }
        }
    })
}

impl ProcessRunner for SystemRunner {
    fn run(&self, command: &CommandSpec) -> Result<ProcessOutput> {
        let output = self
            .command(command)?
            .output()
            .map_err(|e| spawn_failed(command, e))?;

        let result = ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
        };
        debug!(command = %command, exit_code = ?result.exit_code, "command finished");
        Ok(result)
    }

    fn run_streaming(
        &self,
        command: &CommandSpec,
        on_line: &mut dyn FnMut(OutputLine<'_>),
    ) -> Result<ProcessOutput> {
        let mut child = self
            .command(command)?
            .spawn()
            .map_err(|e| spawn_failed(command, e))?;

        let (tx, rx) = mpsc::channel();
        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.push(forward_lines(stdout, false, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(forward_lines(stderr, true, tx.clone()));
        }
        drop(tx);

        let mut result = ProcessOutput::default();
        for (is_stderr, line) in rx {
            if is_stderr {
                on_line(OutputLine::Stderr(&line));
                result.stderr.push_str(&line);
                result.stderr.push('\n');
            } else {
                on_line(OutputLine::Stdout(&line));
                result.stdout.push_str(&line);
                result.stdout.push('\n');
            }
        }
        for reader in readers {
            let _ = reader.join();
        }

        let status = child.wait().map_err(|e| spawn_failed(command, e))?;
        result.exit_code = status.code();
        debug!(command = %command, exit_code = ?result.exit_code, "command finished");
        Ok(result)
    }
}
