pub use anyhow::{Error, Result};

use crate::http::StatusCode;
use crate::response::{Responder, Response};

use std::borrow::Cow;

use futures::future::{self, Ready};
use serde_json::json;

pub trait CatchExt {
    type Value;
    type Error;
    fn catch<E>(self) -> Result<Result<Self::Value, E>, Self::Error>
    where
        E: std::error::Error + Send + Sync + 'static;
}

impl<T> CatchExt for Result<T> {
    type Value = T;
    type Error = Error;

    fn catch<E>(self) -> Result<Result<Self::Value, E>, Self::Error>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        match self {
            Ok(value) => Ok(Ok(value)),
            Err(err) => match err.downcast::<E>() {
                Ok(e) => Ok(Err(e)),
                Err(err) => Err(err),
            },
        }
    }
}

/// Setup-time failure. A chain or route table that produces one of these
/// must never be served.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl ChainError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Not Found")]
pub struct NotFound;

impl From<NotFound> for Response {
    fn from(_: NotFound) -> Self {
        StatusError::NOT_FOUND.into()
    }
}

impl Responder for NotFound {
    type Future = Ready<Result<Response>>;

    fn respond(self) -> Self::Future {
        future::ready(Ok(self.into()))
    }
}

/// A handler failure that already knows which status it should surface as.
///
/// Plain failures become `500` when translated by
/// [`Recover`](crate::middleware::Recover); a `StatusError` keeps its own
/// status and message.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct StatusError {
    status: StatusCode,
    message: Cow<'static, str>,
}

impl StatusError {
    pub const BAD_REQUEST: Self = Self::from_static(StatusCode::BAD_REQUEST, "Bad Request");
    pub const UNAUTHORIZED: Self =
        Self::from_static(StatusCode::UNAUTHORIZED, "Authentication required");
    pub const FORBIDDEN: Self = Self::from_static(StatusCode::FORBIDDEN, "Forbidden");
    pub const NOT_FOUND: Self = Self::from_static(StatusCode::NOT_FOUND, "Not Found");
    pub const TOO_MANY_REQUESTS: Self =
        Self::from_static(StatusCode::TOO_MANY_REQUESTS, "Too Many Requests");
    pub const INTERNAL_SERVER_ERROR: Self =
        Self::from_static(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");

    const fn from_static(status: StatusCode, message: &'static str) -> Self {
        Self {
            status,
            message: Cow::Borrowed(message),
        }
    }

    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Cow::Owned(message.into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<StatusError> for Response {
    fn from(err: StatusError) -> Self {
        Response::json_value(err.status, &json!({ "error": err.message }))
    }
}

impl Responder for StatusError {
    type Future = Ready<Result<Response>>;

    fn respond(self) -> Self::Future {
        future::ready(Ok(self.into()))
    }
}
