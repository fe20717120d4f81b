//! Provider registry and installer.
//!
//! All guarded primitives resolve through this single indirection point: a
//! process-wide table holding one provider per primitive family. The
//! application never touches language-level globals; [`activate`] swaps
//! each table slot for a decision-aware wrapper that holds the original
//! provider, and [`deactivate`] restores the captured originals.
//!
//! Activation is intended to run exactly once at process start, from the
//! hosting framework's startup hook. Ordering guarantees for repeated
//! activation are not part of the contract; what *is* guaranteed is that
//! the originals snapshot is taken once, before the first swap, so
//! wrappers always delegate to real providers and never to other wrappers.

use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::code::{DynamicCode, GuardedCode, NoRuntime};
use crate::db::{GuardedSql, NullBackend, SqlBackend};
use crate::guard::BootstrapScope;
use crate::markup::{GuardedMarkup, HostMarkup, MarkupTrust};
use crate::process::{GuardedProcess, HostProcess, ProcessSpawn};
use crate::shell::{GuardedShell, HostShell, ShellExec};

/// The provider table: one slot per primitive family.
#[derive(Clone)]
pub(crate) struct Providers {
    shell: Arc<dyn ShellExec>,
    process: Arc<dyn ProcessSpawn>,
    sql: Arc<dyn SqlBackend>,
    code: Arc<dyn DynamicCode>,
    markup: Arc<dyn MarkupTrust>,
}

impl Providers {
    /// The real provider set used before any activation.
    fn host() -> Self {
        Self {
            shell: Arc::new(HostShell),
            process: Arc::new(HostProcess),
            sql: Arc::new(NullBackend),
            code: Arc::new(NoRuntime),
            markup: Arc::new(HostMarkup),
        }
    }
}

static LIVE: OnceLock<RwLock<Providers>> = OnceLock::new();
static ORIGINALS: OnceLock<Providers> = OnceLock::new();

fn live() -> &'static RwLock<Providers> {
    LIVE.get_or_init(|| RwLock::new(Providers::host()))
}

fn read_live() -> Providers {
    live()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Returns the current shell provider.
pub fn shell() -> Arc<dyn ShellExec> {
    read_live().shell
}

/// Returns the current process provider.
pub fn process() -> Arc<dyn ProcessSpawn> {
    read_live().process
}

/// Returns the current SQL provider.
pub fn sql() -> Arc<dyn SqlBackend> {
    read_live().sql
}

/// Returns the current dynamic-code provider.
pub fn code() -> Arc<dyn DynamicCode> {
    read_live().code
}

/// Returns the current markup provider.
pub fn markup() -> Arc<dyn MarkupTrust> {
    read_live().markup
}

/// Registers the application's SQL backend as the original provider.
///
/// Must be called before [`activate`]; once the originals snapshot exists
/// the slot belongs to the installed wrapper and late registration is
/// ignored with a warning, so an unguarded provider is never live.
pub fn set_sql_backend(backend: Arc<dyn SqlBackend>) {
    if ORIGINALS.get().is_some() {
        tracing::warn!(
            target: "callguard",
            "sql backend registered after activation, ignoring"
        );
        return;
    }
    live()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .sql = backend;
}

/// Registers the application's dynamic-code runtime as the original
/// provider.
///
/// Must be called before [`activate`]; once the originals snapshot exists
/// the slot belongs to the installed wrapper and late registration is
/// ignored with a warning, so an unguarded provider is never live.
pub fn set_code_runtime(runtime: Arc<dyn DynamicCode>) {
    if ORIGINALS.get().is_some() {
        tracing::warn!(
            target: "callguard",
            "code runtime registered after activation, ignoring"
        );
        return;
    }
    live()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .code = runtime;
}

/// Activates interception: captures the original providers (first call
/// only), then swaps every slot for its decision-aware wrapper.
pub fn activate() {
    let mut table = live().write().unwrap_or_else(PoisonError::into_inner);
    let originals = ORIGINALS.get_or_init(|| table.clone());
    table.shell = Arc::new(GuardedShell::new(originals.shell.clone()));
    table.process = Arc::new(GuardedProcess::new(originals.process.clone()));
    table.sql = Arc::new(GuardedSql::new(originals.sql.clone()));
    table.code = Arc::new(GuardedCode::new(originals.code.clone()));
    table.markup = Arc::new(GuardedMarkup::new(originals.markup.clone()));
}

/// Restores every original provider captured by [`activate`].
///
/// Silent no-op if interception was never activated. Intended for clean
/// shutdown and test isolation, not for toggling enforcement at runtime.
pub fn deactivate() {
    if let Some(originals) = ORIGINALS.get() {
        let mut table = live().write().unwrap_or_else(PoisonError::into_inner);
        *table = originals.clone();
    }
}

/// Runs the framework's middleware-loading routine inside a bootstrap
/// scope, so every guarded primitive defers to its original for the
/// duration, on all exit paths including panics.
pub fn bootstrap<R>(load: impl FnOnce() -> R) -> R {
    let _scope = BootstrapScope::enter();
    load()
}
