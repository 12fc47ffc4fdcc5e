use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use std::sync::Arc;

use crate::{
    error::AppError,
    models::UserIdentity,
    policy::{self, Action},
    token::{AuthError, TokenCodec},
};

/// TokenState
///
/// The shared codec as pulled out of the application state.
pub type TokenState = Arc<TokenCodec>;

/// Extracts the bearer credential from the `Authorization` header.
///
/// `Ok(None)` when the header is absent. A header that is present but not of the
/// form `Bearer <token>` counts as a malformed token, not as anonymous access.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AuthError::Malformed)?;
    // The scheme name is case-insensitive (RFC 7235).
    let (scheme, token) = value.split_once(' ').ok_or(AuthError::Malformed)?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(AuthError::Malformed);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::Malformed);
    }
    Ok(Some(token))
}

/// Decodes the request's bearer token, if any, into an identity.
pub fn authenticate(
    codec: &TokenCodec,
    headers: &HeaderMap,
) -> Result<Option<UserIdentity>, AuthError> {
    match bearer_token(headers)? {
        Some(token) => codec.verify(token).map(Some),
        None => Ok(None),
    }
}

/// Caller
///
/// The identity behind a request, or `None` for anonymous access. Extraction only
/// decodes the token: an invalid, expired or malformed one rejects the request
/// (403), while a missing one yields an anonymous caller. What that caller may do
/// is decided per handler through [`Caller::authorize`].
#[derive(Debug, Clone)]
pub struct Caller(pub Option<UserIdentity>);

impl Caller {
    pub fn anonymous() -> Self {
        Caller(None)
    }

    pub fn identity(&self) -> Option<&UserIdentity> {
        self.0.as_ref()
    }

    /// The caller's identity, or `Unauthenticated` (401).
    pub fn require(&self) -> Result<&UserIdentity, AppError> {
        self.identity().ok_or(AppError::Unauthenticated)
    }

    /// Runs the policy engine for `action` and hands back the identity it allowed.
    pub fn authorize(
        &self,
        action: Action,
        resource_owner: Option<&str>,
    ) -> Result<&UserIdentity, AppError> {
        policy::decide(self.identity(), action, resource_owner).into_result()?;
        self.require()
    }
}

impl From<UserIdentity> for Caller {
    fn from(identity: UserIdentity) -> Self {
        Caller(Some(identity))
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
    TokenState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let codec = TokenState::from_ref(state);
        let identity = authenticate(&codec, &parts.headers)?;
        Ok(Caller(identity))
    }
}
