//! Named handlers and middleware, and the route table built from
//! [`RouteConfig`] entries that refer to them by name.

use crate::chain::compose;
use crate::config::{AppConfig, RouteConfig};
use crate::error::ChainError;
use crate::handler::Handler;
use crate::middleware::{
    Authenticate, Logger, Middleware, RateLimit, Recover, RequireRole, StaticTokens,
};
use crate::router::Router;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

type HandlerFactory = Box<dyn Fn() -> Box<dyn Handler> + Send + Sync>;

#[derive(Default)]
pub struct Registry {
    handlers: HashMap<String, HandlerFactory>,
    middleware: HashMap<String, Arc<dyn Middleware>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the bundled middleware under the names
    /// `logger`, `recover`, `rate_limit`, `auth` and `admin`.
    pub fn with_builtins(config: &AppConfig) -> Self {
        Self::new()
            .middleware("logger", Logger::new())
            .middleware("recover", Recover::new())
            .middleware("rate_limit", RateLimit::from_config(&config.rate_limit))
            .middleware("auth", Authenticate::new(StaticTokens::from_config(&config.auth)))
            .middleware("admin", RequireRole::new("admin"))
    }

    /// Registers a handler. `factory` runs once per route that names it, so
    /// every route owns its own terminal.
    pub fn handler<F, H>(mut self, name: &str, factory: F) -> Self
    where
        F: Fn() -> H + Send + Sync + 'static,
        H: Handler + 'static,
    {
        let factory: HandlerFactory = Box::new(move || factory().boxed());
        self.handlers.insert(name.to_owned(), factory);
        self
    }

    pub fn middleware<M>(mut self, name: &str, middleware: M) -> Self
    where
        M: Middleware + 'static,
    {
        self.middleware.insert(name.to_owned(), middleware.shared());
        self
    }

    /// Composes one configured route. Unknown names are configuration
    /// errors, reported before anything is served.
    pub fn build_route(&self, route: &RouteConfig) -> Result<Box<dyn Handler>, ChainError> {
        let layers = route
            .middleware
            .iter()
            .map(|name| {
                self.middleware.get(name).cloned().ok_or_else(|| {
                    ChainError::invalid(format!(
                        "route `{}` uses unknown middleware `{}`",
                        route.path, name
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let terminal = self.handlers.get(&route.handler).map(|make| make());

        compose(terminal, &layers).map_err(|err| {
            ChainError::invalid(format!(
                "route `{}` names unregistered handler `{}`: {}",
                route.path, route.handler, err
            ))
        })
    }

    pub fn build_router(&self, routes: &[RouteConfig]) -> Result<Router, ChainError> {
        let mut router = Router::new();
        for route in routes {
            let h = self.build_route(route)?;
            router.register(&route.path, h)?;
            debug!(
                path = %route.path,
                handler = %route.handler,
                middleware = ?route.middleware,
                "route bound"
            );
        }
        Ok(router)
    }
}
