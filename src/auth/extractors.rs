use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::{debug, warn};
use uuid::Uuid;

use super::jwt::JwtKeys;
use crate::error::AppError;

/// Caller identity on protected routes. Rejects with 401 when the bearer token
/// is missing or does not verify.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

/// Caller identity on public routes; `None` for anonymous or unverifiable callers.
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuthUser(pub Option<Uuid>);

fn identify(parts: &Parts, keys: &JwtKeys) -> Result<Uuid, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("No token provided".into()))?;
    let invalid = || AppError::Unauthorized("Invalid token".into());

    let value = header.to_str().map_err(|_| invalid())?;
    let (scheme, token) = value.split_once(' ').ok_or_else(invalid)?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(invalid());
    }

    match keys.verify(token.trim()) {
        Ok(claims) => Ok(claims.sub),
        Err(e) => {
            warn!(error = %e, "token rejected");
            Err(invalid())
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        identify(parts, &keys).map(AuthUser)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(MaybeAuthUser(None));
        }
        let keys = JwtKeys::from_ref(state);
        match identify(parts, &keys) {
            Ok(id) => Ok(MaybeAuthUser(Some(id))),
            Err(e) => {
                debug!(error = %e, "treating caller as anonymous");
                Ok(MaybeAuthUser(None))
            }
        }
    }
}
