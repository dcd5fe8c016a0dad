//! Session token → identity resolution.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{Identity, SessionClaims, TokenValidationError, validate_claims};

/// Opaque bearer token handed to the presentation layer after login.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("invalid session: {0}")]
    Session(#[from] TokenValidationError),

    #[error("identity store unavailable")]
    Unavailable,
}

/// Supplies the authenticated identity for every engine call.
pub trait IdentityProvider: Send + Sync {
    fn resolve(&self, token: &SessionToken) -> Result<Identity, AuthError>;
}

impl<P> IdentityProvider for std::sync::Arc<P>
where
    P: IdentityProvider + ?Sized,
{
    fn resolve(&self, token: &SessionToken) -> Result<Identity, AuthError> {
        (**self).resolve(token)
    }
}

#[derive(Debug, Clone)]
struct Session {
    claims: SessionClaims,
    identity: Identity,
}

/// In-memory session table for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryIdentityProvider {
    sessions: RwLock<HashMap<SessionToken, Session>>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session for `identity` lasting `ttl`.
    pub fn login(&self, identity: Identity, ttl: Duration) -> Result<SessionToken, AuthError> {
        let now = Utc::now();
        let token = SessionToken::new(Uuid::now_v7().simple().to_string());
        let session = Session {
            claims: SessionClaims {
                sub: identity.id,
                issued_at: now,
                expires_at: now + ttl,
            },
            identity,
        };

        let user = session.identity.id;
        let mut sessions = self.sessions.write().map_err(|_| AuthError::Unavailable)?;
        sessions.insert(token.clone(), session);
        tracing::debug!(user = %user, "session opened");

        Ok(token)
    }

    pub fn logout(&self, token: &SessionToken) -> Result<(), AuthError> {
        let mut sessions = self.sessions.write().map_err(|_| AuthError::Unavailable)?;
        if let Some(session) = sessions.remove(token) {
            tracing::debug!(user = %session.identity.id, "session closed");
        }
        Ok(())
    }
}

impl IdentityProvider for InMemoryIdentityProvider {
    fn resolve(&self, token: &SessionToken) -> Result<Identity, AuthError> {
        let sessions = self.sessions.read().map_err(|_| AuthError::Unavailable)?;
        let session = sessions.get(token).ok_or(AuthError::Unauthenticated)?;

        if let Err(err) = validate_claims(&session.claims, Utc::now()) {
            tracing::debug!(user = %session.identity.id, error = %err, "session rejected");
            return Err(err.into());
        }

        Ok(session.identity.clone())
    }
}

#[cfg(test)]
mod tests {
    use bazaar_core::UserId;

    use super::*;
    use crate::Role;

    #[test]
    fn login_then_resolve_returns_identity() {
        let provider = InMemoryIdentityProvider::new();
        let alice = Identity::new(UserId::new(), "alice", Role::Buyer);

        let token = provider.login(alice.clone(), Duration::hours(1)).unwrap();

        assert_eq!(provider.resolve(&token).unwrap(), alice);
    }

    #[test]
    fn unknown_token_is_unauthenticated() {
        let provider = InMemoryIdentityProvider::new();
        let result = provider.resolve(&SessionToken::new("nope"));
        assert_eq!(result, Err(AuthError::Unauthenticated));
    }

    #[test]
    fn expired_session_is_rejected() {
        let provider = InMemoryIdentityProvider::new();
        let alice = Identity::new(UserId::new(), "alice", Role::Buyer);
        let token = provider.login(alice, Duration::seconds(-1)).unwrap();

        assert!(matches!(
            provider.resolve(&token),
            Err(AuthError::Session(_))
        ));
    }

    #[test]
    fn logout_revokes_token() {
        let provider = InMemoryIdentityProvider::new();
        let alice = Identity::new(UserId::new(), "alice", Role::Vendor);
        let token = provider.login(alice, Duration::hours(1)).unwrap();

        provider.logout(&token).unwrap();

        assert_eq!(provider.resolve(&token), Err(AuthError::Unauthenticated));
    }
}
