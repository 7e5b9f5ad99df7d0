//! Middleware: transformations from one [`Handler`] into another.
//!
//! A middleware never runs on its own. [`Middleware::wrap`] is called once,
//! at setup time, and returns a new handler that owns `inner`. That handler
//! is what runs per request: it may inspect or rewrite the request, call
//! `inner` (usually exactly once), short-circuit with its own response, and
//! inspect or rewrite whatever comes back.

mod auth;
mod logger;
mod rate_limit;
mod recover;

pub use self::auth::{Authenticate, Identity, IdentityExt, RequireRole, StaticTokens, Verifier};
pub use self::logger::Logger;
pub use self::rate_limit::RateLimit;
pub use self::recover::Recover;

use crate::handler::Handler;

use std::sync::Arc;

pub trait Middleware: Send + Sync {
    /// Builds the handler that runs this middleware around `inner`.
    ///
    /// Every call must produce an independent handler: state created here
    /// belongs to the returned handler alone.
    fn wrap(&self, inner: Box<dyn Handler>) -> Box<dyn Handler>;

    fn boxed(self) -> Box<dyn Middleware>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }

    fn shared(self) -> Arc<dyn Middleware>
    where
        Self: Sized + 'static,
    {
        Arc::new(self)
    }
}

impl Middleware for Box<dyn Middleware> {
    fn wrap(&self, inner: Box<dyn Handler>) -> Box<dyn Handler> {
        Middleware::wrap(&**self, inner)
    }
}

impl Middleware for Arc<dyn Middleware> {
    fn wrap(&self, inner: Box<dyn Handler>) -> Box<dyn Handler> {
        Middleware::wrap(&**self, inner)
    }
}
