//! Adapters from plain `async fn`s to [`Handler`] and [`Middleware`].
//!
//! ```ignore
//! async fn hello(_: Request) -> &'static str { "hello" }
//!
//! async fn trace(req: Request, next: &dyn Handler) -> Result<Response> {
//!     let res = next.handle(req).await;
//!     println!("done");
//!     res
//! }
//!
//! let h = Chain::new().with(middleware(trace)).then(handler(hello));
//! ```

use crate::handler::Handler;
use crate::internal_prelude::*;
use crate::response::Responder;

use std::sync::Arc;

mod sealed {
    use std::future::Future;

    pub trait AsyncFn<'a, A>: Send + Sync + 'a {
        type Future: Future<Output = Self::Output> + Send + 'a;
        type Output: 'a;

        fn call<'t: 'a>(&'t self, args: A) -> Self::Future;
    }

    macro_rules! impl_async_fn {
    (($($ty:tt,)+),($($id:tt,)+)) => {
            impl<'a, $($ty,)+ F, U, O> AsyncFn<'a, ($($ty,)+)> for F
            where
                $($ty:'a,)+
                F: Fn($($ty,)+) -> U + Send + Sync + 'a,
                U: Future<Output = O> + Send + 'a,
                O: 'a,
            {
                type Future = U;

                type Output = O;

                fn call<'t: 'a>(&'t self, ($($id,)+): ($($ty,)+)) -> Self::Future {
                    (self)($($id,)+)
                }
            }
        };
    }

    impl_async_fn!((A0,), (a0,));
    impl_async_fn!((A0, A1,), (a0, a1,));
}

use self::sealed::AsyncFn;

pub fn handler<F>(f: F) -> HandlerFn<F> {
    HandlerFn { f }
}

pub struct HandlerFn<F> {
    f: F,
}

impl<F, R> Handler for HandlerFn<F>
where
    F: for<'a> AsyncFn<'a, (Request,), Output = R>,
    R: Responder,
{
    fn handle<'t, 'a>(&'t self, req: Request) -> BoxFuture<'a, Result<Response>>
    where
        't: 'a,
        Self: 'a,
    {
        Box::pin(async move { AsyncFn::call(&self.f, (req,)).await.respond().await })
    }
}

/// Turns `async fn(Request, &dyn Handler) -> Result<Response>` into a
/// middleware. The second argument is the handler being wrapped.
pub fn middleware<F>(f: F) -> MiddlewareFn<F> {
    MiddlewareFn { f: Arc::new(f) }
}

pub struct MiddlewareFn<F> {
    f: Arc<F>,
}

impl<F> Middleware for MiddlewareFn<F>
where
    F: for<'a> AsyncFn<'a, (Request, &'a dyn Handler), Output = Result<Response>> + 'static,
{
    fn wrap(&self, inner: Box<dyn Handler>) -> Box<dyn Handler> {
        Box::new(Wrapped {
            f: Arc::clone(&self.f),
            inner,
        })
    }
}

pub struct Wrapped<F> {
    f: Arc<F>,
    inner: Box<dyn Handler>,
}

impl<F> Handler for Wrapped<F>
where
    F: for<'a> AsyncFn<'a, (Request, &'a dyn Handler), Output = Result<Response>>,
{
    fn handle<'t, 'a>(&'t self, req: Request) -> BoxFuture<'a, Result<Response>>
    where
        't: 'a,
        Self: 'a,
    {
        Box::pin(AsyncFn::call(&*self.f, (req, &*self.inner)))
    }
}
