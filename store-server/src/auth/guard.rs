//! Access guard
//!
//! Resolves a request's credential to a verified [`Identity`]:
//! bearer token preferred, `__session` cookie as fallback. The role
//! comes from the `role` table and defaults to `customer` when no
//! record exists.
//!
//! Two axum extractors expose this to handlers:
//! - [`Owner`] rejects with 401 unless the caller is an owner.
//! - [`OptionalCaller`] never rejects; public endpoints use it to
//!   attach an identity when one happens to be present.

use axum::{extract::FromRequestParts, http::request::Parts};
use http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::AppError;
use crate::core::ServerState;
use crate::db::repository::RoleRepository;

/// Session cookie name set by the identity provider
const SESSION_COOKIE: &str = "__session";

/// Caller role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Customer => "customer",
        }
    }
}

/// A verified caller identity
#[derive(Debug, Clone)]
pub struct Identity {
    pub uid: String,
    pub role: Role,
    pub email: Option<String>,
}

impl Identity {
    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }
}

/// Pull the raw credential out of the request headers:
/// bearer first, session cookie second
fn extract_credential(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(crate::auth::JwtService::extract_from_header);
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get(http::header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split(';')
                .map(str::trim)
                .find_map(|c| c.strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        })
        .map(str::to_string)
}

/// Resolve the caller from request headers, or `None` when no valid
/// credential is present
pub async fn resolve_caller(state: &ServerState, headers: &HeaderMap) -> Option<Identity> {
    let token = extract_credential(headers)?;

    let claims = match state.jwt.validate_token(&token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!(error = %e, "Credential verification failed");
            return None;
        }
    };

    let role = RoleRepository::new(state.db.clone())
        .find_role(&claims.sub)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, uid = %claims.sub, "Role lookup failed");
            None
        })
        .unwrap_or(Role::Customer);

    Some(Identity {
        uid: claims.sub,
        role,
        email: claims.email,
    })
}

/// Extractor for owner-only endpoints (401 on anything else)
#[derive(Debug, Clone)]
pub struct Owner(pub Identity);

impl FromRequestParts<ServerState> for Owner {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let identity = resolve_caller(state, &parts.headers)
            .await
            .ok_or_else(AppError::unauthorized)?;

        if !identity.is_owner() {
            tracing::warn!(uid = %identity.uid, uri = %parts.uri, "Non-owner rejected");
            return Err(AppError::unauthorized());
        }

        Ok(Owner(identity))
    }
}

/// Extractor for endpoints any signed-in caller may use
#[derive(Debug, Clone)]
pub struct Caller(pub Identity);

impl FromRequestParts<ServerState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        resolve_caller(state, &parts.headers)
            .await
            .map(Caller)
            .ok_or_else(AppError::unauthorized)
    }
}

/// Extractor for endpoints where authentication is optional
#[derive(Debug, Clone)]
pub struct OptionalCaller(pub Option<Identity>);

impl FromRequestParts<ServerState> for OptionalCaller {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        Ok(OptionalCaller(resolve_caller(state, &parts.headers).await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{AUTHORIZATION, COOKIE};

    #[test]
    fn prefers_bearer_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer tok-a".parse().unwrap());
        headers.insert(COOKIE, "__session=tok-b; theme=dark".parse().unwrap());
        assert_eq!(extract_credential(&headers).as_deref(), Some("tok-a"));
    }

    #[test]
    fn falls_back_to_session_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "theme=dark; __session=tok-b".parse().unwrap());
        assert_eq!(extract_credential(&headers).as_deref(), Some("tok-b"));
    }

    #[test]
    fn no_credential_resolves_to_none() {
        assert_eq!(extract_credential(&HeaderMap::new()), None);
    }
}
