//! Shell execution primitives: `system`-style status calls and
//! `popen`-style pipes.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;

use crate::callsite::CallSite;
use crate::error::{Blocked, Error};
use crate::intercept::{decide, Decision};
use crate::policy::Signature;

/// A no-op shell command. Feeding it to the original primitive yields a
/// real, fully usable handle without any side effect.
pub(crate) const NOOP_COMMAND: &str = ":";

/// Provider of shell-execution capabilities.
///
/// Every method takes the caller-context token first; the host
/// implementation ignores it, the guarded wrapper installed by
/// [`activate`](crate::activate) uses it to classify the call.
pub trait ShellExec: Send + Sync {
    /// Runs a command through the shell and returns its exit status code.
    fn system(&self, site: &CallSite, command: &str) -> Result<i32, Error>;

    /// Runs a command through the shell with stdout piped, returning a
    /// readable handle.
    fn popen(&self, site: &CallSite, command: &str) -> Result<PipeHandle, Error>;
}

/// Readable handle to a piped shell command.
///
/// The handle stays usable whether the command was the caller's real one
/// or the neutralized no-op: reading yields whatever the command printed
/// (nothing, for the no-op), and dropping the handle reaps the child.
///
/// # Examples
///
/// ```no_run
/// # fn demo() -> Result<(), callguard::Error> {
/// let mut pipe = callguard::popen!("echo hello")?;
/// let output = pipe.read_to_string()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PipeHandle {
    child: Option<Child>,
}

impl PipeHandle {
    pub(crate) fn new(child: Child) -> Self {
        Self { child: Some(child) }
    }

    /// Reads the command's entire stdout.
    pub fn read_to_string(&mut self) -> Result<String, Error> {
        let mut output = String::new();
        if let Some(child) = self.child.as_mut() {
            if let Some(stdout) = child.stdout.as_mut() {
                stdout.read_to_string(&mut output).map_err(Error::Io)?;
            }
        }
        Ok(output)
    }

    /// Waits for the command to finish and returns its exit status code.
    pub fn close(mut self) -> Result<i32, Error> {
        match self.child.take() {
            Some(mut child) => {
                let status = child.wait().map_err(Error::Io)?;
                Ok(status.code().unwrap_or(-1))
            }
            None => Ok(0),
        }
    }
}

impl Drop for PipeHandle {
    fn drop(&mut self) {
        // Reap the child so a dropped handle leaves no zombie behind.
        if let Some(mut child) = self.child.take() {
            let _ = child.wait();
        }
    }
}

/// The real shell backend: runs commands via `sh -c`.
#[derive(Debug, Default)]
pub struct HostShell;

impl ShellExec for HostShell {
    fn system(&self, _site: &CallSite, command: &str) -> Result<i32, Error> {
        // Mirrors the classic system() contract: failures to launch the
        // shell surface as status -1, not as an error.
        match Command::new("sh").arg("-c").arg(command).status() {
            Ok(status) => Ok(status.code().unwrap_or(-1)),
            Err(_) => Ok(-1),
        }
    }

    fn popen(&self, _site: &CallSite, command: &str) -> Result<PipeHandle, Error> {
        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdout(Stdio::piped())
            .spawn()
            .map_err(Error::Io)?;
        Ok(PipeHandle::new(child))
    }
}

/// Decision-aware wrapper installed over the original shell provider.
pub(crate) struct GuardedShell {
    original: Arc<dyn ShellExec>,
}

impl GuardedShell {
    pub(crate) fn new(original: Arc<dyn ShellExec>) -> Self {
        Self { original }
    }
}

impl ShellExec for GuardedShell {
    fn system(&self, site: &CallSite, command: &str) -> Result<i32, Error> {
        match decide(Signature::ShellSystem, site) {
            Decision::Defer => self.original.system(site, command),
            Decision::Block => Err(Blocked::new(Signature::ShellSystem, site).into()),
            // 0 is the success status; no command runs.
            Decision::Neutralize => Ok(0),
        }
    }

    fn popen(&self, site: &CallSite, command: &str) -> Result<PipeHandle, Error> {
        match decide(Signature::ShellPopen, site) {
            Decision::Defer => self.original.popen(site, command),
            Decision::Block => Err(Blocked::new(Signature::ShellPopen, site).into()),
            // Feed the no-op command to the original so caller code that
            // reads or closes the handle keeps working.
            Decision::Neutralize => self.original.popen(site, NOOP_COMMAND),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_system_reports_exit_status() {
        let shell = HostShell;
        assert_eq!(shell.system(&CallSite::unknown(), "true").unwrap(), 0);
        assert_eq!(shell.system(&CallSite::unknown(), "exit 3").unwrap(), 3);
    }

    #[test]
    fn host_popen_captures_stdout() {
        let shell = HostShell;
        let mut pipe = shell
            .popen(&CallSite::unknown(), "echo host_popen_works")
            .unwrap();
        assert_eq!(pipe.read_to_string().unwrap().trim(), "host_popen_works");
    }

    #[test]
    fn noop_command_produces_empty_output_and_success() {
        let shell = HostShell;
        let mut pipe = shell.popen(&CallSite::unknown(), NOOP_COMMAND).unwrap();
        assert_eq!(pipe.read_to_string().unwrap(), "");

        let pipe = shell.popen(&CallSite::unknown(), NOOP_COMMAND).unwrap();
        assert_eq!(pipe.close().unwrap(), 0);
    }

    #[test]
    fn guarded_system_defers_for_unattributed_sites() {
        let guarded = GuardedShell::new(Arc::new(HostShell));
        // Unknown origin: the real command runs.
        let status = guarded.system(&CallSite::unknown(), "exit 7").unwrap();
        assert_eq!(status, 7);
    }
}
