//! Router Module Index
//!
//! Routes are split by access level so that authentication is applied once, as a
//! layer on the whole authenticated router, instead of handler by handler.

/// Routes accessible to anyone.
pub mod public;

/// Routes behind the `AuthUser` middleware. Every handler here is scoped to the
/// resolved actor.
pub mod authenticated;
