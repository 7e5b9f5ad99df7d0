use crate::config::AuthConfig;
use crate::error::StatusError;
use crate::http::{header, StatusCode};
use crate::internal_prelude::*;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

/// Who sent the request, as established by [`Authenticate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user: String,
    pub role: String,
}

impl Identity {
    pub fn new(user: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            role: role.into(),
        }
    }
}

pub trait IdentityExt {
    fn identity(&self) -> Option<&Identity>;
}

impl IdentityExt for Request {
    fn identity(&self) -> Option<&Identity> {
        self.extensions().get::<Identity>()
    }
}

pub trait Verifier: Send + Sync + 'static {
    fn verify(&self, req: &Request) -> Option<Identity>;
}

/// Accepts `Authorization: Bearer <token>` for a fixed set of tokens.
#[derive(Debug, Default, Clone)]
pub struct StaticTokens {
    tokens: HashMap<String, Identity>,
}

impl StaticTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        config.tokens.iter().fold(Self::new(), |acc, t| {
            acc.insert(&t.token, Identity::new(&t.user, &t.role))
        })
    }

    pub fn insert(mut self, token: impl Into<String>, identity: Identity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }
}

impl Verifier for StaticTokens {
    fn verify(&self, req: &Request) -> Option<Identity> {
        let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
        let token = value.strip_prefix("Bearer ")?.trim();
        self.tokens.get(token).cloned()
    }
}

/// Rejects requests the verifier does not recognise with `401`; otherwise
/// stores the [`Identity`] in the request extensions and calls the inner
/// handler.
pub struct Authenticate<V> {
    verifier: Arc<V>,
}

impl<V: Verifier> Authenticate<V> {
    pub fn new(verifier: V) -> Self {
        Self {
            verifier: Arc::new(verifier),
        }
    }
}

impl<V: Verifier> Middleware for Authenticate<V> {
    fn wrap(&self, inner: Box<dyn Handler>) -> Box<dyn Handler> {
        Box::new(Authenticated {
            verifier: Arc::clone(&self.verifier),
            inner,
        })
    }
}

struct Authenticated<V> {
    verifier: Arc<V>,
    inner: Box<dyn Handler>,
}

impl<V: Verifier> Handler for Authenticated<V> {
    fn handle<'t, 'a>(&'t self, mut req: Request) -> BoxFuture<'a, Result<Response>>
    where
        't: 'a,
        Self: 'a,
    {
        Box::pin(async move {
            let verified = self.verifier.verify(&req);
            match verified {
                Some(identity) => {
                    debug!(user = %identity.user, "authenticated");
                    let _ = req.extensions_mut().insert(identity);
                    self.inner.handle(req).await
                }
                None => {
                    debug!(path = %req.uri().path(), "authentication required");
                    Ok(StatusError::UNAUTHORIZED.into())
                }
            }
        })
    }
}

/// Lets through only identities carrying `role`; everything else gets `403`.
///
/// Must sit inside [`Authenticate`] in the chain.
#[derive(Debug, Clone)]
pub struct RequireRole {
    role: Arc<str>,
}

impl RequireRole {
    pub fn new(role: &str) -> Self {
        Self { role: role.into() }
    }
}

impl Middleware for RequireRole {
    fn wrap(&self, inner: Box<dyn Handler>) -> Box<dyn Handler> {
        Box::new(RoleGuard {
            role: Arc::clone(&self.role),
            inner,
        })
    }
}

struct RoleGuard {
    role: Arc<str>,
    inner: Box<dyn Handler>,
}

impl Handler for RoleGuard {
    fn handle<'t, 'a>(&'t self, req: Request) -> BoxFuture<'a, Result<Response>>
    where
        't: 'a,
        Self: 'a,
    {
        Box::pin(async move {
            let allowed = matches!(req.identity(), Some(id) if *id.role == *self.role);
            if !allowed {
                let message = format!("{} privileges required", self.role);
                return Ok(StatusError::new(StatusCode::FORBIDDEN, message).into());
            }
            self.inner.handle(req).await
        })
    }
}
