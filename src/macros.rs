//! Call-site-attributing macros for every guarded primitive.
//!
//! Each macro captures where it was invoked (file, line, enclosing
//! function, and the literal invocation text) into a [`CallSite`], then
//! dispatches through the provider registry. Calling a provider directly
//! with [`CallSite::unknown`] is always possible, but such calls carry no
//! attribution and therefore always defer.
//!
//! [`CallSite`]: crate::CallSite
//! [`CallSite::unknown`]: crate::CallSite::unknown

/// Builds an attributed [`CallSite`](crate::CallSite) for a primitive
/// invocation. Shared plumbing for the public macros.
#[doc(hidden)]
#[macro_export]
macro_rules! __call_site {
    ($name:literal, $($args:expr),+) => {
        $crate::call_site!(concat!($name, "!(", stringify!($($args),+), ")"))
    };
    ($name:literal) => {
        $crate::call_site!(concat!($name, "!()"))
    };
}

/// Runs a shell command and waits for it, like the C `system` call.
///
/// Returns the command's exit status. Under a nullifying policy the
/// command never runs and the status is `0`.
#[macro_export]
macro_rules! system {
    ($command:expr) => {
        $crate::registry::shell().system(&$crate::__call_site!("system", $command), $command)
    };
}

/// Runs a shell command with its stdout captured through a pipe.
///
/// Returns a [`PipeHandle`](crate::PipeHandle). Under a nullifying policy
/// the handle reads as an immediately closed, empty pipe.
#[macro_export]
macro_rules! popen {
    ($command:expr) => {
        $crate::registry::shell().popen(&$crate::__call_site!("popen", $command), $command)
    };
}

/// Spawns a child process.
///
/// With one argument, uses default [`SpawnOptions`](crate::SpawnOptions);
/// a second argument supplies explicit options. Under a nullifying policy
/// the spawned process is a no-op child with the requested capture
/// options intact.
#[macro_export]
macro_rules! spawn {
    ($command:expr) => {
        $crate::registry::process().spawn(
            &$crate::__call_site!("spawn", $command),
            $command,
            &$crate::SpawnOptions::default(),
        )
    };
    ($command:expr, $options:expr) => {
        $crate::registry::process().spawn(
            &$crate::__call_site!("spawn", $command, $options),
            $command,
            &$options,
        )
    };
}

/// Runs a command and returns its captured stdout, failing on nonzero
/// exit. Under a nullifying policy the output is empty.
#[macro_export]
macro_rules! check_output {
    ($command:expr) => {
        $crate::registry::process()
            .check_output(&$crate::__call_site!("check_output", $command), $command)
    };
}

/// Executes a raw SQL string against the registered backend.
///
/// Returns `Ok(Some(rows))` from a live backend; under a nullifying
/// policy returns `Ok(None)` without touching the backend.
#[macro_export]
macro_rules! raw_sql {
    ($sql:expr) => {
        $crate::registry::sql().raw_query(&$crate::__call_site!("raw_sql", $sql), $sql)
    };
}

/// Opens a [`Cursor`](crate::Cursor) on the registered backend.
///
/// Under a nullifying policy the cursor is detached: statements execute
/// against nothing and every fetch is empty.
#[macro_export]
macro_rules! sql_cursor {
    () => {
        $crate::registry::sql().cursor(&$crate::__call_site!("sql_cursor"))
    };
}

/// Evaluates an expression in the registered dynamic-code runtime.
///
/// Under a nullifying policy the runtime is never invoked and the result
/// is `Ok(None)`.
#[macro_export]
macro_rules! eval {
    ($expression:expr) => {
        $crate::registry::code().eval(&$crate::__call_site!("eval", $expression), $expression)
    };
}

/// Executes statements in the registered dynamic-code runtime.
///
/// Under a nullifying policy the runtime is never invoked.
#[macro_export]
macro_rules! exec {
    ($statements:expr) => {
        $crate::registry::code().exec(&$crate::__call_site!("exec", $statements), $statements)
    };
}

/// Marks a string as trusted markup, exempting it from output escaping.
///
/// Under a nullifying policy the returned [`Markup`](crate::Markup) is
/// untrusted and renders escaped.
#[macro_export]
macro_rules! mark_safe {
    ($text:expr) => {
        $crate::registry::markup().mark_safe(&$crate::__call_site!("mark_safe", $text), $text)
    };
}

/// Template-filter flavor of [`mark_safe!`]: marks interpolated template
/// content as trusted.
#[macro_export]
macro_rules! safe {
    ($text:expr) => {
        $crate::registry::markup().safe_filter(&$crate::__call_site!("safe", $text), $text)
    };
}

#[cfg(test)]
mod tests {
    // Macro behavior under each policy is covered by the integration
    // tests, which own the global settings. Here we only check the
    // attribution the macros capture.

    #[test]
    fn call_site_carries_invocation_text() {
        let site = crate::__call_site!("system", "ls -l");
        assert_eq!(site.source(), Some(r#"system!("ls -l")"#));
        assert!(site.file().unwrap().ends_with("macros.rs"));
        assert!(site.function().contains("call_site_carries_invocation_text"));
    }

    #[test]
    fn zero_argument_form_still_attributes() {
        let site = crate::__call_site!("sql_cursor");
        assert_eq!(site.source(), Some("sql_cursor!()"));
        assert!(site.line() > 0);
    }
}
