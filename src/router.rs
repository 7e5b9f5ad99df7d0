//! An owned route table.
//!
//! Patterns are `/`-separated. A segment is either literal, a capture
//! `:name`, or, as the last segment only, the wildcard `**` which matches any
//! remaining (possibly empty) tail. Routes are tried in registration order;
//! the first match wins, so binding the same pattern twice for a method is
//! rejected.

use crate::error::{ChainError, NotFound};
use crate::http::Method;
use crate::internal_prelude::*;

use std::ops::Range;
use std::str::FromStr;

use smallvec::SmallVec;
use tracing::debug;

#[derive(Default)]
pub struct Router {
    table: RouteTable,
    effects: Vec<Box<dyn Handler>>,
    fallback: Option<Box<dyn Handler>>,
}

/// What a matched route captured from the request path.
#[derive(Debug)]
pub struct CaptureOwned {
    path: Box<str>,
    params: Vec<(Box<str>, Range<usize>)>,
    tail: Option<Range<usize>>,
}

impl CaptureOwned {
    fn get_param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, range)| &self.path[range.clone()])
    }

    fn get_tail(&self) -> Option<&str> {
        self.tail.clone().map(|range| &self.path[range])
    }
}

pub trait RouterExt {
    fn capture(&self) -> Option<&CaptureOwned>;

    fn param(&self, name: &str) -> Option<&str> {
        self.capture()?.get_param(name)
    }

    fn parse_param<T: FromStr>(&self, name: &str) -> Option<Result<T, T::Err>> {
        self.param(name).map(FromStr::from_str)
    }

    /// The part of the path matched by a trailing `**`.
    fn tail(&self) -> Option<&str> {
        self.capture()?.get_tail()
    }
}

impl RouterExt for Request {
    fn capture(&self) -> Option<&CaptureOwned> {
        self.extensions().get::<CaptureOwned>()
    }
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler for requests no route matches. Without one they get `404`.
    pub fn set_fallback(&mut self, h: Box<dyn Handler>) {
        self.fallback = Some(h);
    }

    /// Binds `pattern` to `h` for every method.
    pub fn register(&mut self, pattern: &str, h: Box<dyn Handler>) -> Result<(), ChainError> {
        self.add_route(&METHODS, pattern, h)
    }

    pub fn at<'r>(&'r mut self, pattern: &'r str) -> RouteSetter<'r> {
        RouteSetter {
            router: self,
            pattern,
        }
    }

    pub fn add_route(
        &mut self,
        methods: &[Method],
        pattern: &str,
        h: Box<dyn Handler>,
    ) -> Result<(), ChainError> {
        let idx = self.effects.len();
        self.table.add_route(methods, pattern, idx)?;
        self.effects.push(h);
        debug!(pattern, ?methods, "route registered");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn find(&self, method: &Method, path: &str) -> Option<(&dyn Handler, CaptureOwned)> {
        let (idx, capture) = self.table.find(method, path)?;
        Some((&*self.effects[idx], capture))
    }
}

impl Handler for Router {
    fn handle<'t, 'a>(&'t self, mut req: Request) -> BoxFuture<'a, Result<Response>>
    where
        't: 'a,
        Self: 'a,
    {
        Box::pin(async move {
            let found = self.find(req.method(), req.uri().path());
            match found {
                Some((h, capture)) => {
                    let _ = req.extensions_mut().insert(capture);
                    h.handle(req).await
                }
                None => match self.fallback.as_ref() {
                    Some(h) => h.handle(req).await,
                    None => {
                        debug!(method = %req.method(), path = %req.uri().path(), "no route");
                        Ok(NotFound.into())
                    }
                },
            }
        })
    }
}

pub struct RouteSetter<'r> {
    router: &'r mut Router,
    pattern: &'r str,
}

macro_rules! define_method {
    {$name:ident, $method:expr} => {
        pub fn $name(&mut self, h: Box<dyn Handler>) -> Result<&mut Self, ChainError> {
            self.router.add_route(&[$method], self.pattern, h)?;
            Ok(self)
        }
    };
}

impl RouteSetter<'_> {
    define_method! {get, Method::GET}
    define_method! {post, Method::POST}
    define_method! {put, Method::PUT}
    define_method! {delete, Method::DELETE}
    define_method! {head, Method::HEAD}
    define_method! {options, Method::OPTIONS}
    define_method! {connect, Method::CONNECT}
    define_method! {patch, Method::PATCH}
    define_method! {trace, Method::TRACE}
}

#[derive(Default)]
struct RouteTable {
    routes: Vec<Route>,
}

struct Route {
    segments: Box<[Segment]>,
    catch_tail: bool,
    data_index: usize,
    method_mask: u16,
}

enum Segment {
    Static(Box<str>),
    Capture(Box<str>),
}

const METHODS: [Method; 9] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
    Method::CONNECT,
    Method::PATCH,
    Method::TRACE,
];

/// Extension methods never match.
fn method_bit(method: &Method) -> Option<u16> {
    METHODS
        .iter()
        .position(|m| m == method)
        .map(|i| 1_u16 << i)
}

impl Route {
    /// Whether a route with this shape would never be reached behind `self`.
    /// Captures match regardless of their names.
    fn shadows(&self, segments: &[Segment], catch_tail: bool, method_mask: u16) -> bool {
        self.method_mask & method_mask != 0
            && self.catch_tail == catch_tail
            && self.segments.len() == segments.len()
            && self.segments.iter().zip(segments).all(|pair| match pair {
                (Segment::Static(a), Segment::Static(b)) => a == b,
                (Segment::Capture(_), Segment::Capture(_)) => true,
                _ => false,
            })
    }

    fn try_match(&self, path: &str, parts: &[&str]) -> Option<CaptureOwned> {
        let fixed = self.segments.len();
        if fixed + self.catch_tail as usize > parts.len() {
            return None;
        }
        if fixed < parts.len() && !self.catch_tail {
            return None;
        }

        let mut params = Vec::new();
        for (segment, &part) in self.segments.iter().zip(parts.iter()) {
            match segment {
                Segment::Static(s) => {
                    if **s != *part {
                        return None;
                    }
                }
                Segment::Capture(name) => params.push((name.clone(), calc_range(path, part))),
            }
        }

        let tail = if self.catch_tail {
            Some(calc_range(path, parts[fixed]).start..path.len())
        } else {
            None
        };

        Some(CaptureOwned {
            path: path.into(),
            params,
            tail,
        })
    }
}

fn calc_range(base: &str, part: &str) -> Range<usize> {
    let start = (part.as_ptr() as usize) - (base.as_ptr() as usize);
    let end = start + part.len();
    start..end
}

fn parse_pattern(pattern: &str) -> Result<(Box<[Segment]>, bool), ChainError> {
    if !pattern.starts_with('/') {
        return Err(ChainError::invalid(format!(
            "route pattern {:?} must start with '/'",
            pattern
        )));
    }

    let mut parts: Vec<&str> = pattern.split('/').skip(1).collect();
    let catch_tail = parts.last() == Some(&"**");
    if catch_tail {
        parts.pop();
    }

    let mut segments = Vec::with_capacity(parts.len());
    for part in parts {
        let segment = match part.strip_prefix(':') {
            _ if part == "**" => {
                return Err(ChainError::invalid(format!(
                    "route pattern {:?} has a wildcard before its last segment",
                    pattern
                )))
            }
            Some("") => {
                return Err(ChainError::invalid(format!(
                    "route pattern {:?} has an unnamed capture",
                    pattern
                )))
            }
            Some(name) => {
                let taken = segments
                    .iter()
                    .any(|s| matches!(s, Segment::Capture(n) if &**n == name));
                if taken {
                    return Err(ChainError::invalid(format!(
                        "route pattern {:?} captures {:?} twice",
                        pattern, name
                    )));
                }
                Segment::Capture(name.into())
            }
            None => Segment::Static(part.into()),
        };
        segments.push(segment);
    }

    Ok((segments.into_boxed_slice(), catch_tail))
}

impl RouteTable {
    fn find(&self, method: &Method, path: &str) -> Option<(usize, CaptureOwned)> {
        if !path.starts_with('/') {
            return None;
        }
        let mask = method_bit(method)?;
        let parts: SmallVec<[&str; 4]> = path.split('/').skip(1).collect();

        self.routes
            .iter()
            .filter(|route| route.method_mask & mask != 0)
            .find_map(|route| Some((route.data_index, route.try_match(path, &parts)?)))
    }

    fn add_route(
        &mut self,
        methods: &[Method],
        pattern: &str,
        data_index: usize,
    ) -> Result<(), ChainError> {
        let (segments, catch_tail) = parse_pattern(pattern)?;

        let mut method_mask = 0_u16;
        for m in methods {
            method_mask |= method_bit(m).ok_or_else(|| {
                ChainError::invalid(format!("unsupported method {} for {:?}", m, pattern))
            })?;
        }

        let shadowed = self
            .routes
            .iter()
            .any(|route| route.shadows(&segments, catch_tail, method_mask));
        if shadowed {
            return Err(ChainError::invalid(format!(
                "route pattern {:?} is already bound for one of {:?}",
                pattern, methods
            )));
        }

        self.routes.push(Route {
            segments,
            catch_tail,
            data_index,
            method_mask,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functional::handler;
    use crate::http::StatusCode;

    use futures::executor::block_on;

    #[test]
    fn route_table() {
        let mut table = RouteTable::default();

        const GET: Method = Method::GET;
        const POST: Method = Method::POST;

        table.add_route(&[POST], "/posts", 1).unwrap();
        table.add_route(&[GET, POST], "/posts/:pid", 2).unwrap();
        table.add_route(&[GET], "/static/**", 3).unwrap();

        let idx = |m: &Method, p: &str| table.find(m, p).map(|(i, _)| i);

        assert_eq!(idx(&GET, "/posts/asd"), Some(2));
        assert_eq!(idx(&POST, "/posts/asd"), Some(2));

        assert_eq!(idx(&GET, "/posts/"), Some(2));
        assert_eq!(idx(&POST, "/posts/"), Some(2));

        assert_eq!(idx(&GET, "/posts"), None);
        assert_eq!(idx(&POST, "/posts"), Some(1));

        assert_eq!(idx(&GET, "/static"), None);
        assert_eq!(idx(&GET, "/static/"), Some(3));
        assert_eq!(idx(&GET, "/static/asd"), Some(3));

        let (_, capture) = table.find(&GET, "/posts/42").unwrap();
        assert_eq!(capture.get_param("pid"), Some("42"));
        assert_eq!(capture.get_param("nope"), None);

        let (_, capture) = table.find(&GET, "/static/css/site.css").unwrap();
        assert_eq!(capture.get_tail(), Some("css/site.css"));
    }

    #[test]
    fn malformed_patterns_are_rejected() {
        let mut table = RouteTable::default();
        for pattern in ["posts", "/a/**/b", "/a/:", "/:id/:id"] {
            let err = table.add_route(&[Method::GET], pattern, 0).unwrap_err();
            assert!(matches!(err, ChainError::InvalidConfiguration(_)), "{}", pattern);
        }
        let ext = Method::from_bytes(b"PURGE").unwrap();
        assert!(table.add_route(&[ext], "/", 0).is_err());
        assert!(table.routes.is_empty());
    }

    #[test]
    fn duplicate_patterns_are_rejected() {
        let mut table = RouteTable::default();
        table.add_route(&[Method::GET], "/a/:id", 0).unwrap();
        table.add_route(&[Method::POST], "/a/:id", 1).unwrap();
        table.add_route(&[Method::GET], "/a/:id/**", 2).unwrap();
        table.add_route(&[Method::GET], "/a/b", 3).unwrap();

        for (methods, pattern) in [
            (&[Method::GET][..], "/a/:id"),
            (&[Method::PUT, Method::POST][..], "/a/:name"),
            (&[Method::GET][..], "/a/:x/**"),
        ] {
            let err = table.add_route(methods, pattern, 9).unwrap_err();
            assert!(matches!(err, ChainError::InvalidConfiguration(_)), "{}", pattern);
        }
        assert_eq!(table.routes.len(), 4);

        let mut router = Router::new();
        router.at("/tea").get(handler(teapot).boxed()).unwrap();
        assert!(router.register("/tea", handler(hello).boxed()).is_err());
        assert_eq!(router.len(), 1);
    }

    async fn hello(req: Request) -> String {
        format!("hello {}", req.param("name").unwrap_or("?"))
    }

    async fn teapot(_: Request) -> StatusCode {
        StatusCode::IM_A_TEAPOT
    }

    fn request(method: Method, path: &str) -> Request {
        let req = hyper::Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();
        Request::from(req)
    }

    async fn body_of(res: Response) -> String {
        let bytes = hyper::body::to_bytes(res.into_body()).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn dispatches_with_params() {
        let mut router = Router::new();
        router.at("/hello/:name").get(handler(hello).boxed()).unwrap();
        router.register("/tea", handler(teapot).boxed()).unwrap();
        assert_eq!(router.len(), 2);

        let res = block_on(router.handle(request(Method::GET, "/hello/world"))).unwrap();
        assert_eq!(block_on(body_of(res)), "hello world");

        let res = block_on(router.handle(request(Method::POST, "/hello/world"))).unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = block_on(router.handle(request(Method::DELETE, "/tea"))).unwrap();
        assert_eq!(res.status(), StatusCode::IM_A_TEAPOT);
    }

    #[test]
    fn fallback_replaces_404() {
        let mut router = Router::new();
        router.set_fallback(handler(teapot).boxed());
        let res = block_on(router.handle(request(Method::GET, "/missing"))).unwrap();
        assert_eq!(res.status(), StatusCode::IM_A_TEAPOT);
    }
}
