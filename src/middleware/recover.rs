use crate::error::{CatchExt, StatusError};
use crate::http::StatusCode;
use crate::internal_prelude::*;

use serde_json::json;
use tracing::error;

/// Translates failures from the inner chain into JSON error responses.
///
/// A [`StatusError`] keeps its status and message. Any other failure is
/// logged and answered with `500`; its message is only exposed when
/// `expose_internal` is set.
#[derive(Debug, Default, Clone, Copy)]
pub struct Recover {
    expose_internal: bool,
}

impl Recover {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expose_internal(mut self, expose: bool) -> Self {
        self.expose_internal = expose;
        self
    }
}

impl Middleware for Recover {
    fn wrap(&self, inner: Box<dyn Handler>) -> Box<dyn Handler> {
        Box::new(Recovered {
            expose_internal: self.expose_internal,
            inner,
        })
    }
}

struct Recovered {
    expose_internal: bool,
    inner: Box<dyn Handler>,
}

impl Recovered {
    fn recover(&self, ret: Result<Response>) -> Response {
        match ret.catch::<StatusError>() {
            Ok(Ok(res)) => res,
            Ok(Err(status)) => status.into(),
            Err(err) => {
                error!(error = ?err, "handler failed");
                let message = if self.expose_internal {
                    err.to_string()
                } else {
                    StatusError::INTERNAL_SERVER_ERROR.message().to_owned()
                };
                Response::json_value(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &json!({ "error": message }),
                )
            }
        }
    }
}

impl Handler for Recovered {
    fn handle<'t, 'a>(&'t self, req: Request) -> BoxFuture<'a, Result<Response>>
    where
        't: 'a,
        Self: 'a,
    {
        Box::pin(async move { Ok(self.recover(self.inner.handle(req).await)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Chain;
    use crate::functional::handler;

    use futures::executor::block_on;

    async fn forbidden(_: Request) -> Result<Response> {
        Err(StatusError::FORBIDDEN.into())
    }

    async fn broken(_: Request) -> Result<Response> {
        Err(anyhow::anyhow!("database on fire"))
    }

    async fn body_of(res: Response) -> String {
        let bytes = hyper::body::to_bytes(res.into_body()).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn request() -> Request {
        Request::from(HyperRequest::new(Body::empty()))
    }

    #[test]
    fn status_errors_keep_their_status() {
        let h = Chain::new().with(Recover::new()).then(handler(forbidden));
        let res = block_on(h.handle(request())).unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(block_on(body_of(res)), r#"{"error":"Forbidden"}"#);
    }

    #[test]
    fn other_failures_become_500() {
        let h = Chain::new().with(Recover::new()).then(handler(broken));
        let res = block_on(h.handle(request())).unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(block_on(body_of(res)), r#"{"error":"Internal Server Error"}"#);

        let h = Chain::new()
            .with(Recover::new().expose_internal(true))
            .then(handler(broken));
        let res = block_on(h.handle(request())).unwrap();
        assert_eq!(block_on(body_of(res)), r#"{"error":"database on fire"}"#);
    }

    #[test]
    fn without_recover_failures_propagate() {
        let h = Chain::new().then(handler(broken));
        let err = block_on(h.handle(request())).unwrap_err();
        assert_eq!(err.to_string(), "database on fire");
    }
}
