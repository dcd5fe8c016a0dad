//! `bazaar-auth`: who is calling, and what they may do.
//!
//! Authentication itself happens outside this workspace; this crate only
//! models the resolved identity, its role, and the lookup from an opaque
//! session token to that identity.

pub mod claims;
pub mod identity;
pub mod provider;
pub mod roles;

pub use claims::{SessionClaims, TokenValidationError, validate_claims};
pub use identity::{Identity, Owned};
pub use provider::{AuthError, IdentityProvider, InMemoryIdentityProvider, SessionToken};
pub use roles::Role;
