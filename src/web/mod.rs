//! Web framework integration surface.
//!
//! This module provides the boundary between HTTP frameworks and the
//! guarded primitives. It contains no framework-specific code; it models
//! the request cycle with plain types so any framework integration (or a
//! test) can drive it:
//! - [`Endpoint`]: one route per guarded primitive, resolvable from a
//!   request path
//! - [`Response`]: status plus body, with [`Blocked`](crate::Blocked)
//!   mapped to HTTP 403
//! - [`App`]: the startup sequence an application runs once, in order
//!   (register original providers, activate interception, load
//!   middleware inside the bootstrap scope)
//!
//! # Integration Model
//!
//! Framework-specific code should:
//! 1. Run [`App::start`] from its startup hook, before serving traffic
//! 2. Resolve each incoming path with [`Endpoint::from_path`]
//! 3. Call [`handle`] with the request payload
//! 4. Write the returned [`Response`] status and body to the wire
//!
//! The handlers themselves invoke the primitive macros, so they are the
//! application code the interception engine classifies and polices.

mod handlers;

pub use handlers::{handle, App, DemoRuntime, Endpoint, Response};
