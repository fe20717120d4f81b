//! Process-wide configuration for the interception engine.
//!
//! Settings are owned by the application and installed with [`configure`].
//! Every intercepted call reads one consistent snapshot via [`snapshot`];
//! replacing the settings at runtime (live reload) is observed by the next
//! call, never mid-decision.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::policy::{Signature, Strategy};

/// Configuration for call-site classification and per-primitive strategies.
///
/// Built with owned builder methods, in the same style as the rest of the
/// crate's construction APIs.
///
/// # Examples
///
/// ```
/// use callguard::{Settings, Signature, Strategy};
///
/// let settings = Settings::new("src")
///     .strategy(Signature::ShellSystem, Strategy::blocking())
///     .strategy(Signature::CodeEval, Strategy::quiet());
///
/// assert!(settings.strategy_for(Signature::ShellSystem).block);
/// // Unconfigured primitives fall back to report-only.
/// assert!(settings.strategy_for(Signature::DbRaw).report);
/// ```
#[derive(Debug, Clone)]
pub struct Settings {
    app_root: String,
    strategies: HashMap<Signature, Strategy>,
}

impl Settings {
    /// Creates settings with the given application root and no per-primitive
    /// strategy entries (everything defaults to report-only).
    ///
    /// `app_root` is the path prefix that marks a call site as first-party
    /// application code; with the primitive macros this is matched against
    /// `file!()` paths, so a typical value is `"src"`.
    pub fn new(app_root: impl Into<String>) -> Self {
        Self {
            app_root: app_root.into(),
            strategies: HashMap::new(),
        }
    }

    /// Sets the strategy for one primitive, replacing any previous entry.
    pub fn strategy(mut self, signature: Signature, strategy: Strategy) -> Self {
        self.strategies.insert(signature, strategy);
        self
    }

    /// Sets the same strategy for every protected primitive.
    pub fn strategy_for_all(mut self, strategy: Strategy) -> Self {
        for signature in Signature::ALL {
            self.strategies.insert(signature, strategy);
        }
        self
    }

    /// Returns the configured application root prefix.
    pub fn app_root(&self) -> &str {
        &self.app_root
    }

    /// Looks up the strategy for a primitive, falling back to the default
    /// (report-only, non-blocking) when no entry exists.
    pub fn strategy_for(&self, signature: Signature) -> Strategy {
        self.strategies
            .get(&signature)
            .copied()
            .unwrap_or_default()
    }

    /// Returns true iff `file` belongs to the protected application tree.
    ///
    /// Files outside the root are library or framework internals and are
    /// never intercepted.
    // TODO: normalize paths before comparing so a symlinked app root still matches
    pub fn in_scope(&self, file: &str) -> bool {
        match file.strip_prefix(&self.app_root) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

impl Default for Settings {
    /// Defaults to `app_root = "src"` with no strategy entries.
    fn default() -> Self {
        Self::new("src")
    }
}

static CURRENT: OnceLock<RwLock<Arc<Settings>>> = OnceLock::new();

fn store() -> &'static RwLock<Arc<Settings>> {
    CURRENT.get_or_init(|| RwLock::new(Arc::new(Settings::default())))
}

/// Installs new process-wide settings, replacing the previous snapshot.
///
/// Safe to call while requests are in flight: in-progress decisions keep
/// the snapshot they already read.
pub fn configure(settings: Settings) {
    let mut slot = store()
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    *slot = Arc::new(settings);
}

/// Returns the current settings snapshot.
pub fn snapshot() -> Arc<Settings> {
    store()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}
