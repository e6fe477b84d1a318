//! Authenticated backend calls.
//!
//! Every row read or write goes through an [`AuthenticatedCall`], which hands
//! the operation an access token. Token acquisition itself (sign-in, consent,
//! the identity provider) sits behind [`TokenSource`].

use std::cell::RefCell;
use std::fmt;

use thiserror::Error;
use tracing::{info, warn};

/// Failures reported by the backend or the token source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No signed-in user, or the token was rejected.
    #[error("not signed in")]
    Unauthorized,
    /// Signed in, but access to the document was not granted.
    #[error("access not granted")]
    Forbidden,
    /// Any other backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

impl SessionError {
    fn is_auth(&self) -> bool {
        matches!(self, SessionError::Unauthorized | SessionError::Forbidden)
    }
}

/// Opaque bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

/// Supplies access tokens.
pub trait TokenSource {
    /// Returns a token; `refresh` asks for a fresh one instead of a cached one.
    fn token(&self, refresh: bool) -> Result<AccessToken, SessionError>;
}

/// Wraps backend operations with authentication.
pub trait AuthenticatedCall {
    /// Runs `op` with a valid token.
    fn call<T, F>(&self, op: F) -> Result<T, SessionError>
    where
        F: FnMut(&AccessToken) -> Result<T, SessionError>;
}

/// Session for stores that need no credentials, such as local files.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl AuthenticatedCall for NoAuth {
    fn call<T, F>(&self, mut op: F) -> Result<T, SessionError>
    where
        F: FnMut(&AccessToken) -> Result<T, SessionError>,
    {
        op(&AccessToken::new(""))
    }
}

/// Token-caching session.
///
/// The token is fetched on first use. When an operation is rejected as
/// unauthorized or forbidden, the token is refreshed and the operation runs
/// once more; a rejection after the refresh clears the cached token and is
/// returned to the caller.
pub struct TokenSession<S> {
    source: S,
    token: RefCell<Option<AccessToken>>,
}

impl<S: TokenSource> TokenSession<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            token: RefCell::new(None),
        }
    }

    /// Returns `true` while a token is cached.
    pub fn has_token(&self) -> bool {
        self.token.borrow().is_some()
    }

    fn current(&self, refresh: bool) -> Result<AccessToken, SessionError> {
        if !refresh {
            if let Some(token) = self.token.borrow().as_ref() {
                return Ok(token.clone());
            }
        }
        let token = self.source.token(refresh)?;
        *self.token.borrow_mut() = Some(token.clone());
        Ok(token)
    }
}

impl<S: TokenSource> AuthenticatedCall for TokenSession<S> {
    fn call<T, F>(&self, mut op: F) -> Result<T, SessionError>
    where
        F: FnMut(&AccessToken) -> Result<T, SessionError>,
    {
        let token = self.current(false)?;
        match op(&token) {
            Err(err) if err.is_auth() => {
                info!(%err, "requesting token refresh");
                self.token.borrow_mut().take();
                let token = self.current(true)?;
                let result = op(&token);
                if let Err(err) = &result {
                    if err.is_auth() {
                        warn!(%err, "refreshed token rejected");
                        self.token.borrow_mut().take();
                    }
                }
                result
            }
            other => other,
        }
    }
}
