//! The shared decision engine behind every guarded wrapper.
//!
//! Each intercepted call runs the same short-circuiting sequence:
//! bootstrap guard, call-site attribution, scope classification, then the
//! configured strategy. The sequence is factored here so the per-primitive
//! wrappers only differ in their neutralized substitutes.

use crate::callsite::CallSite;
use crate::guard;
use crate::policy::{Signature, Strategy};
use crate::settings::{self, Settings};

/// Outcome of the interception decision for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Execute the original primitive with unmodified arguments.
    Defer,
    /// Suppress the side effect and return the primitive's substitute value.
    Neutralize,
    /// Refuse the call with a permission-denied failure.
    Block,
}

/// A [`Decision`] paired with whether a diagnostic should be emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    /// What the guarded wrapper should do.
    pub decision: Decision,
    /// Whether the strategy asks for a warning diagnostic. Always false
    /// for deferred calls, which are not policy decisions.
    pub report: bool,
}

/// Evaluates the interception state machine without side effects.
///
/// This is the pure core of the engine: no global state is read and no
/// diagnostic is emitted, which makes it suitable for dry-running a policy
/// against hypothetical call sites (and for property tests).
///
/// The bootstrap guard is deliberately not consulted here: it is
/// thread-state, not policy, and is checked by [`decide`] before anything
/// else.
///
/// # Examples
///
/// ```
/// use callguard::{evaluate, CallSite, Decision, Settings, Signature, Strategy};
///
/// let settings = Settings::new("src")
///     .strategy(Signature::ShellSystem, Strategy::blocking());
///
/// let site = CallSite::attributed("src/views.rs", 8, "run", "system!(cmd)");
/// let verdict = evaluate(&settings, Signature::ShellSystem, &site);
/// assert_eq!(verdict.decision, Decision::Block);
/// assert!(verdict.report);
///
/// // Library-internal callers are never intercepted.
/// let dep = CallSite::attributed("/deps/ext/src/lib.rs", 8, "helper", "system!(cmd)");
/// assert_eq!(evaluate(&settings, Signature::ShellSystem, &dep).decision, Decision::Defer);
/// ```
pub fn evaluate(settings: &Settings, signature: Signature, site: &CallSite) -> Verdict {
    // No source text means attribution failed; favor availability and let
    // the original run rather than policing a call we cannot place.
    if site.source().is_none() {
        return Verdict {
            decision: Decision::Defer,
            report: false,
        };
    }

    let in_scope = match site.file() {
        Some(file) => settings.in_scope(file),
        None => false,
    };
    if !in_scope {
        return Verdict {
            decision: Decision::Defer,
            report: false,
        };
    }

    let Strategy { report, block } = settings.strategy_for(signature);
    let decision = if block {
        Decision::Block
    } else {
        Decision::Neutralize
    };
    Verdict { decision, report }
}

/// Runs the full decision for one intercepted call, emitting the warning
/// diagnostic when the strategy asks for one.
pub(crate) fn decide(signature: Signature, site: &CallSite) -> Decision {
    // Quick check first: during bootstrap the machinery may not be fully
    // initialized, and the startup path should not pay for classification.
    if guard::active() {
        return Decision::Defer;
    }

    let settings = settings::snapshot();
    let verdict = evaluate(&settings, signature, site);
    if verdict.report {
        tracing::warn!(
            target: "callguard",
            signature = signature.as_str(),
            file = site.file().unwrap_or("<unknown>"),
            line = site.line(),
            function = site.function(),
            source = site.source().unwrap_or(""),
            "dangerous primitive invoked from application code",
        );
    }
    verdict.decision
}
