pub use hyper::http::header::{self, HeaderMap, HeaderName, HeaderValue};
pub use hyper::http::{Extensions, Method, StatusCode, Uri, Version};
pub use hyper::Body;
pub use mime::Mime;
