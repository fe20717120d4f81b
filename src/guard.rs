//! Initialization-phase guard.
//!
//! While the hosting framework is loading middleware the interception
//! machinery may not be fully wired up, and stack walking during the hot
//! startup path is wasted work. The guard is a thread-local flag that makes
//! every guarded wrapper defer to the original primitive unconditionally.
//!
//! The flag is thread-local rather than process-global so a middleware
//! reload on one thread can never suppress interception for concurrent
//! request threads.

use std::cell::Cell;

thread_local! {
    static BOOTSTRAPPING: Cell<bool> = const { Cell::new(false) };
}

/// Returns true while the current thread is inside a bootstrap scope.
pub fn active() -> bool {
    BOOTSTRAPPING.with(Cell::get)
}

/// RAII scope that marks the current thread as bootstrapping.
///
/// The flag is restored on drop, so it is cleared on every exit path,
/// including a panic during middleware loading.
///
/// # Examples
///
/// ```
/// use callguard::guard;
///
/// assert!(!guard::active());
/// {
///     let _scope = guard::BootstrapScope::enter();
///     assert!(guard::active());
/// }
/// assert!(!guard::active());
/// ```
#[derive(Debug)]
pub struct BootstrapScope {
    previous: bool,
}

impl BootstrapScope {
    /// Enters a bootstrap scope on the current thread.
    pub fn enter() -> Self {
        let previous = BOOTSTRAPPING.with(|flag| flag.replace(true));
        Self { previous }
    }
}

impl Drop for BootstrapScope {
    fn drop(&mut self) {
        BOOTSTRAPPING.with(|flag| flag.set(self.previous));
    }
}
