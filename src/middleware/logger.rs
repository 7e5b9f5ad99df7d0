use crate::internal_prelude::*;

use std::time::Instant;

use tracing::{info, info_span, warn, Instrument};

/// Access log: one span per request, one event when the inner chain is done.
///
/// Failures are logged and then returned unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct Logger;

impl Logger {
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for Logger {
    fn wrap(&self, inner: Box<dyn Handler>) -> Box<dyn Handler> {
        Box::new(Logged { inner })
    }
}

struct Logged {
    inner: Box<dyn Handler>,
}

impl Handler for Logged {
    fn handle<'t, 'a>(&'t self, req: Request) -> BoxFuture<'a, Result<Response>>
    where
        't: 'a,
        Self: 'a,
    {
        let span = info_span!("request", method = %req.method(), path = %req.uri().path());
        let fut = async move {
            let start = Instant::now();
            let ret = self.inner.handle(req).await;
            let elapsed = start.elapsed();
            match &ret {
                Ok(res) => info!(status = res.status().as_u16(), ?elapsed, "finished"),
                Err(err) => warn!(error = %err, ?elapsed, "failed"),
            }
            ret
        };
        Box::pin(fut.instrument(span))
    }
}
