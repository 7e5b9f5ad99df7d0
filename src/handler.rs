use crate::internal_prelude::*;
use crate::server::Server;

/// A unit of request processing: turns a [`Request`] into a [`Response`] or
/// a failure.
///
/// Handlers are shared between in-flight requests, so `handle` takes
/// `&self`. Any mutable state lives behind the handler's own
/// synchronisation.
pub trait Handler: Send + Sync {
    fn handle<'t, 'a>(&'t self, req: Request) -> BoxFuture<'a, Result<Response>>
    where
        't: 'a,
        Self: 'a;

    fn boxed(self) -> Box<dyn Handler>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }

    fn into_server(self) -> Server
    where
        Self: Sized + 'static,
    {
        Server::new(Box::new(self))
    }
}

impl Handler for Box<dyn Handler> {
    fn handle<'t, 'a>(&'t self, req: Request) -> BoxFuture<'a, Result<Response>>
    where
        't: 'a,
        Self: 'a,
    {
        Handler::handle(&**self, req)
    }
}
