//! Dynamic code primitives: expression evaluation and statement execution.
//!
//! Rust has no built-in `eval`; the host application registers whatever
//! interpreter it embeds as the original provider
//! ([`set_code_runtime`](crate::registry::set_code_runtime)). The default
//! [`NoRuntime`] evaluates nothing, so an application that never registers
//! a runtime loses nothing when these primitives are neutralized.

use std::sync::Arc;

use crate::callsite::CallSite;
use crate::error::{Blocked, Error};
use crate::intercept::{decide, Decision};
use crate::policy::Signature;

/// Provider of dynamic evaluation capabilities.
pub trait DynamicCode: Send + Sync {
    /// Evaluates an expression, returning its rendered value if the
    /// runtime produced one.
    fn eval(&self, site: &CallSite, expression: &str) -> Result<Option<String>, Error>;

    /// Executes statements for their side effects.
    fn exec(&self, site: &CallSite, statements: &str) -> Result<(), Error>;
}

/// Default runtime: evaluates nothing, executes nothing.
#[derive(Debug, Default)]
pub struct NoRuntime;

impl DynamicCode for NoRuntime {
    fn eval(&self, _site: &CallSite, _expression: &str) -> Result<Option<String>, Error> {
        Ok(None)
    }

    fn exec(&self, _site: &CallSite, _statements: &str) -> Result<(), Error> {
        Ok(())
    }
}

/// Adapter turning a pair of closures into a [`DynamicCode`] provider.
///
/// # Examples
///
/// ```
/// use callguard::{CallSite, ClosureRuntime, DynamicCode};
///
/// let runtime = ClosureRuntime::new(
///     |expr: &str| Some(format!("evaluated: {expr}")),
///     |_stmts: &str| {},
/// );
/// let value = runtime.eval(&CallSite::unknown(), "1 + 1").unwrap();
/// assert_eq!(value.as_deref(), Some("evaluated: 1 + 1"));
/// ```
pub struct ClosureRuntime<E, X> {
    eval_fn: E,
    exec_fn: X,
}

impl<E, X> ClosureRuntime<E, X>
where
    E: Fn(&str) -> Option<String> + Send + Sync,
    X: Fn(&str) + Send + Sync,
{
    /// Wraps an eval closure and an exec closure as a runtime.
    pub fn new(eval_fn: E, exec_fn: X) -> Self {
        Self { eval_fn, exec_fn }
    }
}

impl<E, X> DynamicCode for ClosureRuntime<E, X>
where
    E: Fn(&str) -> Option<String> + Send + Sync,
    X: Fn(&str) + Send + Sync,
{
    fn eval(&self, _site: &CallSite, expression: &str) -> Result<Option<String>, Error> {
        Ok((self.eval_fn)(expression))
    }

    fn exec(&self, _site: &CallSite, statements: &str) -> Result<(), Error> {
        (self.exec_fn)(statements);
        Ok(())
    }
}

/// Decision-aware wrapper installed over the original code runtime.
pub(crate) struct GuardedCode {
    original: Arc<dyn DynamicCode>,
}

impl GuardedCode {
    pub(crate) fn new(original: Arc<dyn DynamicCode>) -> Self {
        Self { original }
    }
}

impl DynamicCode for GuardedCode {
    fn eval(&self, site: &CallSite, expression: &str) -> Result<Option<String>, Error> {
        match decide(Signature::CodeEval, site) {
            Decision::Defer => self.original.eval(site, expression),
            Decision::Block => Err(Blocked::new(Signature::CodeEval, site).into()),
            Decision::Neutralize => Ok(None),
        }
    }

    fn exec(&self, site: &CallSite, statements: &str) -> Result<(), Error> {
        match decide(Signature::CodeExec, site) {
            Decision::Defer => self.original.exec(site, statements),
            Decision::Block => Err(Blocked::new(Signature::CodeExec, site).into()),
            Decision::Neutralize => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn no_runtime_evaluates_nothing() {
        let runtime = NoRuntime;
        assert!(runtime.eval(&CallSite::unknown(), "1 + 1").unwrap().is_none());
        runtime.exec(&CallSite::unknown(), "x = 1").unwrap();
    }

    #[test]
    fn closure_runtime_delegates() {
        static EXEC_COUNT: AtomicUsize = AtomicUsize::new(0);
        let runtime = ClosureRuntime::new(
            |expr: &str| Some(expr.to_uppercase()),
            |_stmts: &str| {
                EXEC_COUNT.fetch_add(1, Ordering::SeqCst);
            },
        );

        let value = runtime.eval(&CallSite::unknown(), "abc").unwrap();
        assert_eq!(value.as_deref(), Some("ABC"));

        runtime.exec(&CallSite::unknown(), "noop").unwrap();
        assert_eq!(EXEC_COUNT.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn guarded_code_defers_without_attribution() {
        let runtime = GuardedCode::new(Arc::new(ClosureRuntime::new(
            |_: &str| Some("ran".to_string()),
            |_: &str| {},
        )));
        // Unknown origin: the original runtime is reached.
        let value = runtime.eval(&CallSite::unknown(), "probe").unwrap();
        assert_eq!(value.as_deref(), Some("ran"));
    }
}
