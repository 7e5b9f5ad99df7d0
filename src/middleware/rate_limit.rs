use crate::config::RateLimitConfig;
use crate::error::StatusError;
use crate::http::{header, HeaderValue};
use crate::internal_prelude::*;

use std::time::Instant;

use parking_lot::Mutex;
use tracing::debug;

/// Token bucket limiter. Every wrapped handler gets its own bucket holding
/// up to `capacity` tokens, refilled at `refill_per_sec`. A request without
/// a token is answered with `429` and never reaches the inner handler.
#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    capacity: u32,
    refill_per_sec: u32,
}

impl RateLimit {
    pub fn new(capacity: u32, refill_per_sec: u32) -> Self {
        Self {
            capacity,
            refill_per_sec,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.capacity, config.refill_per_sec)
    }
}

impl Middleware for RateLimit {
    fn wrap(&self, inner: Box<dyn Handler>) -> Box<dyn Handler> {
        let bucket = Bucket::full(self.capacity, self.refill_per_sec, Instant::now());
        Box::new(Limited {
            bucket: Mutex::new(bucket),
            inner,
        })
    }
}

struct Limited {
    bucket: Mutex<Bucket>,
    inner: Box<dyn Handler>,
}

impl Handler for Limited {
    fn handle<'t, 'a>(&'t self, req: Request) -> BoxFuture<'a, Result<Response>>
    where
        't: 'a,
        Self: 'a,
    {
        Box::pin(async move {
            let admitted = self.bucket.lock().try_take(Instant::now());
            if !admitted {
                debug!(path = %req.uri().path(), "rate limited");
                let mut res: Response = StatusError::TOO_MANY_REQUESTS.into();
                let _ = res
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
                return Ok(res);
            }
            self.inner.handle(req).await
        })
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    capacity: f64,
    per_sec: f64,
    last: Instant,
}

impl Bucket {
    fn full(capacity: u32, per_sec: u32, now: Instant) -> Self {
        Self {
            tokens: f64::from(capacity),
            capacity: f64::from(capacity),
            per_sec: f64::from(per_sec),
            last: now,
        }
    }

    fn try_take(&mut self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.per_sec).min(self.capacity);
        self.last = now;
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Chain;
    use crate::functional::handler;
    use crate::http::StatusCode;

    use std::time::Duration;

    use futures::executor::block_on;

    async fn ok(_: Request) -> &'static str {
        "ok"
    }

    fn request() -> Request {
        Request::from(HyperRequest::new(Body::empty()))
    }

    #[test]
    fn bucket_refills_over_time() {
        let start = Instant::now();
        let mut bucket = Bucket::full(2, 1, start);
        assert!(bucket.try_take(start));
        assert!(bucket.try_take(start));
        assert!(!bucket.try_take(start));

        let later = start + Duration::from_millis(1500);
        assert!(bucket.try_take(later));
        assert!(!bucket.try_take(later));

        let much_later = later + Duration::from_secs(60);
        assert!(bucket.try_take(much_later));
        assert!(bucket.try_take(much_later));
        assert!(!bucket.try_take(much_later));
    }

    #[test]
    fn exhausted_bucket_short_circuits() {
        let h = Chain::new().with(RateLimit::new(2, 1)).then(handler(ok));
        let statuses: Vec<_> = (0..3)
            .map(|_| block_on(h.handle(request())).unwrap().status())
            .collect();
        assert_eq!(
            statuses,
            [StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
        );
    }

    #[test]
    fn each_wrap_owns_its_bucket() {
        let chain = Chain::new().with(RateLimit::new(1, 1));
        let first = chain.then(handler(ok));
        let second = chain.then(handler(ok));

        assert_eq!(block_on(first.handle(request())).unwrap().status(), StatusCode::OK);
        assert_eq!(
            block_on(first.handle(request())).unwrap().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(block_on(second.handle(request())).unwrap().status(), StatusCode::OK);
    }

    #[test]
    fn dropped_request_keeps_its_token() {
        let h = Chain::new().with(RateLimit::new(1, 1)).then(handler(ok));
        drop(h.handle(request()));
        assert_eq!(block_on(h.handle(request())).unwrap().status(), StatusCode::OK);
        assert_eq!(
            block_on(h.handle(request())).unwrap().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }
}
