use std::fmt;
use std::str::FromStr;

/// Identity of a protected primitive.
///
/// This is the closed set of operations the crate knows how to intercept;
/// it is not extensible at runtime. The string form (`as_str`) is the key
/// used in external configuration and diagnostics.
///
/// # Examples
///
/// ```
/// use callguard::Signature;
///
/// assert_eq!(Signature::ShellSystem.as_str(), "shell.system");
/// assert_eq!("db.raw".parse::<Signature>(), Ok(Signature::DbRaw));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signature {
    /// Shell command execution returning an exit status.
    ShellSystem,
    /// Pipe-based shell execution returning a readable handle.
    ShellPopen,
    /// Subprocess spawn returning a process handle.
    ProcessSpawn,
    /// Subprocess spawn returning captured output.
    ProcessCheckOutput,
    /// ORM-style raw SQL query execution.
    DbRaw,
    /// Database cursor acquisition.
    DbCursor,
    /// Dynamic expression evaluation.
    CodeEval,
    /// Dynamic statement execution.
    CodeExec,
    /// Marking a string as safe HTML.
    MarkSafe,
    /// The template "safe" filter (unsafe-HTML passthrough).
    SafeFilter,
}

impl Signature {
    /// All protected primitives, in policy-table order.
    pub const ALL: [Signature; 10] = [
        Signature::ShellSystem,
        Signature::ShellPopen,
        Signature::ProcessSpawn,
        Signature::ProcessCheckOutput,
        Signature::DbRaw,
        Signature::DbCursor,
        Signature::CodeEval,
        Signature::CodeExec,
        Signature::MarkSafe,
        Signature::SafeFilter,
    ];

    /// Returns the stable configuration key for this primitive.
    pub fn as_str(&self) -> &'static str {
        match self {
            Signature::ShellSystem => "shell.system",
            Signature::ShellPopen => "shell.popen",
            Signature::ProcessSpawn => "process.spawn",
            Signature::ProcessCheckOutput => "process.check_output",
            Signature::DbRaw => "db.raw",
            Signature::DbCursor => "db.cursor",
            Signature::CodeEval => "code.eval",
            Signature::CodeExec => "code.exec",
            Signature::MarkSafe => "markup.mark_safe",
            Signature::SafeFilter => "template.safe",
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognized signature key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSignature {
    key: String,
}

impl UnknownSignature {
    /// Returns the key that failed to parse.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for UnknownSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown primitive signature: {:?}", self.key)
    }
}

impl std::error::Error for UnknownSignature {}

impl FromStr for Signature {
    type Err = UnknownSignature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Signature::ALL
            .iter()
            .find(|sig| sig.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownSignature { key: s.to_string() })
    }
}

/// Enforcement strategy for one protected primitive.
///
/// Looked up per signature on every intercepted call. A primitive with no
/// configured entry gets the default: report the call and neutralize it
/// without blocking.
///
/// # Examples
///
/// ```
/// use callguard::Strategy;
///
/// let default = Strategy::default();
/// assert!(default.report);
/// assert!(!default.block);
///
/// let blocking = Strategy::blocking();
/// assert!(blocking.block);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strategy {
    /// Emit a warning-level diagnostic for each in-scope call.
    pub report: bool,
    /// Refuse the call with a permission-denied failure instead of
    /// neutralizing it.
    pub block: bool,
}

impl Strategy {
    /// Report and neutralize. This is the default for unconfigured
    /// primitives.
    pub fn report_only() -> Self {
        Self {
            report: true,
            block: false,
        }
    }

    /// Report and refuse the call with [`Blocked`](crate::Blocked).
    pub fn blocking() -> Self {
        Self {
            report: true,
            block: true,
        }
    }

    /// Neutralize without emitting a diagnostic.
    pub fn quiet() -> Self {
        Self {
            report: false,
            block: false,
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Self::report_only()
    }
}
