//! Authentication and caller resolution
//!
//! The server does not run its own login flow: customers and the
//! owner authenticate against an external identity provider, and
//! every request carries either a bearer token or a session cookie
//! signed with the shared secret. This module verifies that
//! credential and resolves it to an [`Identity`] with a role looked
//! up from the `role` table.

pub mod guard;
pub mod jwt;

pub use guard::{Caller, Identity, OptionalCaller, Owner, Role};
pub use jwt::{Claims, JwtConfig, JwtError, JwtService};
