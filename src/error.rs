use std::fmt;
use std::io;

use crate::callsite::CallSite;
use crate::policy::Signature;

/// Permission-denied failure raised when a blocking strategy fires.
///
/// Carries only call-site facts (primitive, file, line, function) and
/// never the arguments of the refused call, so no payload leaks through
/// error messages. Inside request handling this is expected to surface as
/// an HTTP 403.
///
/// # Examples
///
/// ```
/// use callguard::{Blocked, CallSite, Signature};
///
/// let site = CallSite::attributed("src/views.rs", 10, "run", "system!(cmd)");
/// let blocked = Blocked::new(Signature::ShellSystem, &site);
/// assert_eq!(blocked.signature(), Signature::ShellSystem);
/// assert!(format!("{}", blocked).contains("shell.system"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blocked {
    signature: Signature,
    file: Option<&'static str>,
    line: u32,
    function: &'static str,
}

impl Blocked {
    /// Creates a blocked-call failure for the given primitive and site.
    pub fn new(signature: Signature, site: &CallSite) -> Self {
        Self {
            signature,
            file: site.file(),
            line: site.line(),
            function: site.function(),
        }
    }

    /// Returns the primitive that was refused.
    pub fn signature(&self) -> Signature {
        self.signature
    }

    /// Returns the file of the refused call site, if attributed.
    pub fn file(&self) -> Option<&'static str> {
        self.file
    }

    /// Returns the line of the refused call site.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Returns the enclosing function of the refused call site.
    pub fn function(&self) -> &'static str {
        self.function
    }
}

impl fmt::Display for Blocked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.file {
            Some(file) => write!(
                f,
                "permission denied: '{}' invoked from {}:{} ({})",
                self.signature, file, self.line, self.function
            ),
            None => write!(f, "permission denied: '{}'", self.signature),
        }
    }
}

impl std::error::Error for Blocked {}

/// Errors surfaced by guarded primitive calls.
#[derive(Debug)]
pub enum Error {
    /// The configured strategy refused the call.
    Blocked(Blocked),
    /// The underlying host operation failed.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Blocked(b) => write!(f, "{}", b),
            Error::Io(e) => write!(f, "host operation failed: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Blocked(b) => Some(b),
            Error::Io(e) => Some(e),
        }
    }
}

impl From<Blocked> for Error {
    fn from(b: Blocked) -> Self {
        Error::Blocked(b)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl Error {
    /// Returns true if this error is a policy block (HTTP 403 territory).
    pub fn is_blocked(&self) -> bool {
        matches!(self, Error::Blocked(_))
    }
}
