//! Caller-context capture: the [`CallSite`] token and the macros that
//! build one at the invocation point.

use std::fmt;

/// Source location of the code invoking a guarded primitive.
///
/// A `CallSite` is the caller-context token that flows into every guarded
/// call. It is captured at the invocation point by the primitive macros
/// (`system!`, `raw_sql!`, ...) using `file!()`, `line!()`, the enclosing
/// function name, and the stringified call expression as source text.
///
/// A site without source text means the origin could not be determined and
/// is classified as non-application code: the guarded wrappers defer to the
/// original primitive rather than fail the caller.
///
/// # Examples
///
/// ```
/// use callguard::CallSite;
///
/// let site = CallSite::attributed("src/app/views.rs", 42, "run_report", "system!(cmd)");
/// assert_eq!(site.file(), Some("src/app/views.rs"));
/// assert_eq!(site.line(), 42);
///
/// let unknown = CallSite::unknown();
/// assert!(unknown.source().is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    file: Option<&'static str>,
    line: u32,
    function: &'static str,
    source: Option<&'static str>,
}

impl CallSite {
    /// Creates a fully attributed call site.
    ///
    /// Normally produced by the primitive macros rather than by hand;
    /// constructing one manually is useful for dry-run policy evaluation
    /// (see [`evaluate`](crate::evaluate)).
    pub fn attributed(
        file: &'static str,
        line: u32,
        function: &'static str,
        source: &'static str,
    ) -> Self {
        Self {
            file: Some(file),
            line,
            function,
            source: Some(source),
        }
    }

    /// Creates a call site whose origin could not be determined.
    ///
    /// Guarded wrappers treat such calls as coming from library or
    /// framework internals and pass them through unmodified.
    pub fn unknown() -> Self {
        Self {
            file: None,
            line: 0,
            function: "<unknown>",
            source: None,
        }
    }

    /// Returns the file containing the call, if attribution succeeded.
    pub fn file(&self) -> Option<&'static str> {
        self.file
    }

    /// Returns the line number of the call (0 when unknown).
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Returns the name of the enclosing function.
    pub fn function(&self) -> &'static str {
        self.function
    }

    /// Returns the source text of the call expression, if attribution
    /// succeeded.
    pub fn source(&self) -> Option<&'static str> {
        self.source
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.file {
            Some(file) => write!(f, "{}:{} ({})", file, self.line, self.function),
            None => write!(f, "<unknown call site>"),
        }
    }
}

// Support for the enclosing-function-name capture used by `call_site!`.
#[doc(hidden)]
pub fn __type_name_of<T>(_: T) -> &'static str {
    std::any::type_name::<T>()
}

/// Returns the fully qualified name of the enclosing function.
///
/// Uses the `type_name`-of-a-nested-fn trick; inside closures the name
/// includes a `{{closure}}` segment, which is still useful for diagnostics.
#[macro_export]
#[doc(hidden)]
macro_rules! __enclosing_fn {
    () => {{
        fn __here() {}
        let name = $crate::callsite::__type_name_of(__here);
        name.strip_suffix("::__here").unwrap_or(name)
    }};
}

/// Captures a [`CallSite`](crate::CallSite) for the current invocation point.
///
/// Takes the source text to record, already stringified by the calling
/// macro. Application code normally uses the primitive macros instead of
/// invoking this directly.
#[macro_export]
macro_rules! call_site {
    ($source:expr) => {
        $crate::CallSite::attributed(file!(), line!(), $crate::__enclosing_fn!(), $source)
    };
}
