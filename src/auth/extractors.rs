use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use super::jwt::JwtKeys;
use crate::error::AppError;

/// Authenticated caller; rejects the request with 401 otherwise.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i64);

/// Caller that may be anonymous. A header that is present but invalid is
/// still rejected.
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuthUser(pub Option<i64>);

fn bearer_user<S>(parts: &Parts, state: &S) -> Result<Option<i64>, AppError>
where
    JwtKeys: FromRef<S>,
{
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let header = header
        .to_str()
        .map_err(|_| AppError::Unauthorized("invalid Authorization header".into()))?;
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .ok_or_else(|| AppError::Unauthorized("invalid auth scheme".into()))?;

    let keys = JwtKeys::from_ref(state);
    match keys.verify_access(token) {
        Ok(claims) => Ok(Some(claims.sub)),
        Err(e) => {
            warn!(error = %e, "rejected bearer token");
            Err(AppError::Unauthorized("invalid or expired token".into()))
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
        bearer_user(parts, state)?
            .map(AuthUser)
            .ok_or_else(|| AppError::Unauthorized("missing Authorization header".into()))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(bearer_user(parts, state)?))
    }
}
