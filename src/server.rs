use crate::http::StatusCode;
use crate::internal_prelude::*;

use std::convert::Infallible;
use std::net::{TcpListener, ToSocketAddrs};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future;
use tracing::{error, info};

struct ServerInner {
    handler: Box<dyn Handler>,
}

/// A failure nothing in the chain translated ends here as an empty `500`.
async fn hyper_call(server: &ServerInner, req: HyperRequest) -> HyperResponse {
    let req = Request::from_hyper(req);
    match server.handler.handle(req).await {
        Ok(res) => res.into_hyper(),
        Err(err) => {
            error!(error = ?err, "unhandled failure");
            Response::from(StatusCode::INTERNAL_SERVER_ERROR).into_hyper()
        }
    }
}

/// Serves one root handler, usually a [`Router`](crate::router::Router)
/// whose routes are composed chains.
pub struct Server {
    inner: Arc<ServerInner>,
}

impl Server {
    pub fn new(handler: Box<dyn Handler>) -> Self {
        Self {
            inner: Arc::new(ServerInner { handler }),
        }
    }

    pub async fn run(self, addr: impl ToSocketAddrs) -> Result<()> {
        self.run_until(addr, future::pending()).await
    }

    /// Serves until `signal` resolves, then lets in-flight requests finish.
    pub async fn run_until<F>(self, addr: impl ToSocketAddrs, signal: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(&addr)?;
        info!(addr = %listener.local_addr()?, "listening");
        let builder = HyperServer::from_tcp(listener)?;
        let hyper_server = builder.serve(self).with_graceful_shutdown(signal);
        hyper_server.await?;
        info!("server stopped");
        Ok(())
    }
}

impl hyper::service::Service<HyperRequest> for Server {
    type Response = HyperResponse;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: HyperRequest) -> Self::Future {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move { Ok(hyper_call(&*inner, req).await) })
    }
}

impl hyper::service::Service<&'_ hyper::server::conn::AddrStream> for Server {
    type Response = Self;
    type Error = Infallible;
    type Future = future::Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _req: &'_ hyper::server::conn::AddrStream) -> Self::Future {
        future::ready(Ok(Self {
            inner: Arc::clone(&self.inner),
        }))
    }
}
