//! Runtime interception of dangerous primitives with per-call-site
//! decisions.
//!
//! This crate routes a fixed set of dangerous operations (shell execution,
//! process spawning, raw SQL, dynamic code evaluation, markup trust
//! grants) through guarded providers that decide, per invocation, whether
//! to run the real primitive, substitute a harmless stand-in, or refuse
//! outright:
//! - **Call-site attribution**: the primitive macros (`system!`,
//!   `raw_sql!`, ...) capture file, line, and enclosing function, so
//!   decisions distinguish application code from library internals
//! - **Strategies**: each primitive carries a `report` flag (emit a
//!   structured warning) and a `block` flag (refuse with an error);
//!   neither flag set means the call is silently neutralized
//! - **Explicit installation**: [`activate`] swaps provider-table slots
//!   for guarded wrappers and [`deactivate`] restores the captured
//!   originals; nothing is patched behind the application's back
//!
//! # Core Types
//!
//! - [`CallSite`]: where a primitive was invoked, captured by the macros
//! - [`Settings`]: the application root plus per-primitive [`Strategy`]
//! - [`Signature`]: identifies each guarded primitive in policy and logs
//! - [`Blocked`]: the refusal error carrying the offending call site
//!
//! # Examples
//!
//! Policy decisions can be evaluated without installing anything, which
//! is how a deployment dry-runs its configuration:
//!
//! ```
//! use callguard::{evaluate, CallSite, Decision, Settings, Signature, Strategy};
//!
//! let settings = Settings::new("src/app")
//!     .strategy(Signature::ShellSystem, Strategy::blocking());
//!
//! let site = CallSite::attributed("src/app/views.rs", 42, "run_report", "system!(cmd)");
//! let verdict = evaluate(&settings, Signature::ShellSystem, &site);
//! assert_eq!(verdict.decision, Decision::Block);
//!
//! // The same call from outside the application root passes through.
//! let vendored = CallSite::attributed("vendor/lib.rs", 7, "helper", "system!(cmd)");
//! assert_eq!(
//!     evaluate(&settings, Signature::ShellSystem, &vendored).decision,
//!     Decision::Defer,
//! );
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod callsite;
mod code;
mod db;
mod error;
pub mod guard;
mod intercept;
mod macros;
mod markup;
mod policy;
mod process;
pub mod registry;
mod settings;
mod shell;
pub mod web;

pub use callsite::CallSite;
pub use code::{ClosureRuntime, DynamicCode, NoRuntime};
pub use db::{Cursor, MemoryBackend, NullBackend, Row, SqlBackend};
pub use error::{Blocked, Error};
pub use intercept::{evaluate, Decision, Verdict};
pub use markup::{escape, HostMarkup, Markup, MarkupTrust};
pub use policy::{Signature, Strategy, UnknownSignature};
pub use process::{HostProcess, ProcessSpawn, SpawnOptions, SpawnedProcess};
pub use registry::{activate, bootstrap, deactivate, set_code_runtime, set_sql_backend};
pub use settings::{configure, snapshot, Settings};
pub use shell::{HostShell, PipeHandle, ShellExec};
