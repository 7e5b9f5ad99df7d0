//! Onion composition of middleware around a terminal handler.
//!
//! For middleware `[m0, m1, .., mN-1]` and terminal `T` the composed handler
//! is `m0(m1(..mN-1(T)))`: the first middleware listed is the outermost,
//! sees the request first and the response last.

use crate::error::ChainError;
use crate::handler::Handler;
use crate::middleware::Middleware;

use tracing::debug;

/// Folds `middlewares` around `terminal`, last entry innermost.
///
/// An empty slice returns `terminal` as is. A missing terminal is a setup
/// defect and fails here, before any request can reach the chain.
pub fn compose<M>(
    terminal: Option<Box<dyn Handler>>,
    middlewares: &[M],
) -> Result<Box<dyn Handler>, ChainError>
where
    M: Middleware,
{
    match terminal {
        Some(h) => Ok(fold(h, middlewares)),
        None => Err(ChainError::invalid(format!(
            "chain of {} middleware has no terminal handler",
            middlewares.len()
        ))),
    }
}

fn fold<M>(terminal: Box<dyn Handler>, middlewares: &[M]) -> Box<dyn Handler>
where
    M: Middleware,
{
    let composed = middlewares
        .iter()
        .rev()
        .fold(terminal, |inner, m| m.wrap(inner));
    debug!(layers = middlewares.len(), "composed handler chain");
    composed
}

/// An ordered list of middleware, outermost first.
///
/// A `Chain` can be applied to any number of terminals; each application
/// builds a fresh set of wrappers.
#[derive(Default)]
pub struct Chain {
    layers: Vec<Box<dyn Middleware>>,
}

impl Chain {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Appends `middleware` inside every middleware added so far.
    pub fn with<M>(mut self, middleware: M) -> Self
    where
        M: Middleware + 'static,
    {
        self.layers.push(Box::new(middleware));
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn then<H>(&self, terminal: H) -> Box<dyn Handler>
    where
        H: Handler + 'static,
    {
        fold(Box::new(terminal), &self.layers)
    }

    pub fn compose(
        &self,
        terminal: Option<Box<dyn Handler>>,
    ) -> Result<Box<dyn Handler>, ChainError> {
        compose(terminal, &self.layers)
    }
}
