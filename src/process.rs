//! Process-spawning primitives: handle-returning spawn and
//! captured-output execution.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;

use crate::callsite::CallSite;
use crate::error::{Blocked, Error};
use crate::intercept::{decide, Decision};
use crate::policy::Signature;
use crate::shell::NOOP_COMMAND;

/// Caller-supplied options for [`ProcessSpawn::spawn`].
///
/// Preserved verbatim by the neutralized substitute so the returned handle
/// exposes the same streams the caller asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnOptions {
    /// Run the command line through `sh -c` instead of exec'ing it
    /// directly.
    pub shell: bool,
    /// Pipe the child's stdout so it can be read from the handle.
    pub capture_stdout: bool,
    /// Pipe the child's stderr so it can be read from the handle.
    pub capture_stderr: bool,
}

/// Provider of process-spawning capabilities.
pub trait ProcessSpawn: Send + Sync {
    /// Spawns a process and returns a handle to it.
    fn spawn(
        &self,
        site: &CallSite,
        command: &str,
        options: &SpawnOptions,
    ) -> Result<SpawnedProcess, Error>;

    /// Runs a command through the shell and returns its captured stdout.
    fn check_output(&self, site: &CallSite, command: &str) -> Result<Vec<u8>, Error>;
}

/// Handle to a spawned process.
///
/// Exposes the child's output streams (when captured) and its exit status.
/// Dropping the handle reaps the child.
#[derive(Debug)]
pub struct SpawnedProcess {
    child: Option<Child>,
}

impl SpawnedProcess {
    pub(crate) fn new(child: Child) -> Self {
        Self { child: Some(child) }
    }

    /// Reads the child's entire stdout. Empty when stdout was not captured.
    pub fn read_stdout(&mut self) -> Result<Vec<u8>, Error> {
        let mut output = Vec::new();
        if let Some(child) = self.child.as_mut() {
            if let Some(stdout) = child.stdout.as_mut() {
                stdout.read_to_end(&mut output).map_err(Error::Io)?;
            }
        }
        Ok(output)
    }

    /// Reads the child's entire stderr. Empty when stderr was not captured.
    pub fn read_stderr(&mut self) -> Result<Vec<u8>, Error> {
        let mut output = Vec::new();
        if let Some(child) = self.child.as_mut() {
            if let Some(stderr) = child.stderr.as_mut() {
                stderr.read_to_end(&mut output).map_err(Error::Io)?;
            }
        }
        Ok(output)
    }

    /// Waits for the child to finish and returns its exit status code.
    pub fn wait(mut self) -> Result<i32, Error> {
        match self.child.take() {
            Some(mut child) => {
                let status = child.wait().map_err(Error::Io)?;
                Ok(status.code().unwrap_or(-1))
            }
            None => Ok(0),
        }
    }
}

impl Drop for SpawnedProcess {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.wait();
        }
    }
}

/// The real process backend.
#[derive(Debug, Default)]
pub struct HostProcess;

impl HostProcess {
    fn build_command(command: &str, options: &SpawnOptions) -> Result<Command, Error> {
        let mut cmd = if options.shell {
            let mut sh = Command::new("sh");
            sh.arg("-c").arg(command);
            sh
        } else {
            let mut parts = command.split_whitespace();
            let program = parts.next().ok_or_else(|| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "empty command line",
                ))
            })?;
            let mut direct = Command::new(program);
            direct.args(parts);
            direct
        };
        if options.capture_stdout {
            cmd.stdout(Stdio::piped());
        }
        if options.capture_stderr {
            cmd.stderr(Stdio::piped());
        }
        Ok(cmd)
    }
}

impl ProcessSpawn for HostProcess {
    fn spawn(
        &self,
        _site: &CallSite,
        command: &str,
        options: &SpawnOptions,
    ) -> Result<SpawnedProcess, Error> {
        let child = Self::build_command(command, options)?.spawn().map_err(Error::Io)?;
        Ok(SpawnedProcess::new(child))
    }

    fn check_output(&self, _site: &CallSite, command: &str) -> Result<Vec<u8>, Error> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .map_err(Error::Io)?;
        if !output.status.success() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!(
                    "command exited with status {}",
                    output.status.code().unwrap_or(-1)
                ),
            )));
        }
        Ok(output.stdout)
    }
}

/// Decision-aware wrapper installed over the original process provider.
pub(crate) struct GuardedProcess {
    original: Arc<dyn ProcessSpawn>,
}

impl GuardedProcess {
    pub(crate) fn new(original: Arc<dyn ProcessSpawn>) -> Self {
        Self { original }
    }
}

impl ProcessSpawn for GuardedProcess {
    fn spawn(
        &self,
        site: &CallSite,
        command: &str,
        options: &SpawnOptions,
    ) -> Result<SpawnedProcess, Error> {
        match decide(Signature::ProcessSpawn, site) {
            Decision::Defer => self.original.spawn(site, command, options),
            Decision::Block => Err(Blocked::new(Signature::ProcessSpawn, site).into()),
            Decision::Neutralize => {
                // Force the no-op through the shell, keeping the caller's
                // capture options so the handle exposes the same streams.
                let mut noop = *options;
                noop.shell = true;
                self.original.spawn(site, NOOP_COMMAND, &noop)
            }
        }
    }

    fn check_output(&self, site: &CallSite, command: &str) -> Result<Vec<u8>, Error> {
        match decide(Signature::ProcessCheckOutput, site) {
            Decision::Defer => self.original.check_output(site, command),
            Decision::Block => Err(Blocked::new(Signature::ProcessCheckOutput, site).into()),
            // Empty bytes match the real primitive's return type.
            Decision::Neutralize => Ok(Vec::new()),
        }
    }
}
