use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{config::AppConfig, models::UserIdentity};

/// Claims
///
/// The signed payload of every bearer token. Carries the full identity so a
/// request can be authorised without a store round trip; a role change therefore
/// only takes effect once the user logs in again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub username: String,
    pub admin: bool,
    /// Issued At (Unix seconds).
    pub iat: i64,
    /// Expiration Time (Unix seconds). The token is rejected from this instant on.
    pub exp: i64,
}

/// Why a presented token was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature does not verify")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
}

/// Which configured lifetime a login token gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenLifetime {
    Standard,
    RememberMe,
}

/// IssuedToken
///
/// A freshly signed token together with the instants it was bound to.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub identity: UserIdentity,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// TokenCodec
///
/// Issues and verifies HS256 bearer tokens. The signing key is fixed at
/// construction and only ever read afterwards, so one instance is shared by all
/// requests behind an `Arc`.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    standard_ttl: Duration,
    remember_me_ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &[u8], standard_ttl: Duration, remember_me_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by `verify_at` against an explicit instant, with no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            standard_ttl,
            remember_me_ttl,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.jwt_secret.as_bytes(),
            Duration::minutes(config.token_ttl_minutes),
            Duration::days(config.remember_me_ttl_days),
        )
    }

    pub fn ttl(&self, lifetime: TokenLifetime) -> Duration {
        match lifetime {
            TokenLifetime::Standard => self.standard_ttl,
            TokenLifetime::RememberMe => self.remember_me_ttl,
        }
    }

    /// Issues a login token using one of the configured lifetimes.
    pub fn issue_for(
        &self,
        identity: &UserIdentity,
        lifetime: TokenLifetime,
    ) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        self.issue(identity, self.ttl(lifetime))
    }

    pub fn issue(
        &self,
        identity: &UserIdentity,
        ttl: Duration,
    ) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        self.issue_at(identity, ttl, Utc::now())
    }

    /// Signs `identity` as of `now`. The instant is truncated to whole seconds so
    /// that `expires_at - issued_at` is exactly `ttl`.
    pub fn issue_at(
        &self,
        identity: &UserIdentity,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        let issued_at = DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now);
        let expires_at = issued_at + ttl;

        let claims = Claims {
            id: identity.id,
            username: identity.username.clone(),
            admin: identity.admin,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(IssuedToken {
            token,
            identity: identity.clone(),
            issued_at,
            expires_at,
        })
    }

    pub fn verify(&self, token: &str) -> Result<UserIdentity, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Checks structure and signature, then expiry against `now`. Returns the
    /// embedded identity exactly as issued.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<UserIdentity, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Malformed,
            }
        })?;

        let claims = data.claims;
        if now.timestamp() >= claims.exp {
            return Err(AuthError::Expired);
        }

        Ok(UserIdentity {
            id: claims.id,
            username: claims.username,
            admin: claims.admin,
        })
    }
}
