//! Access tokens are issued by the identity provider and signed with a shared HMAC secret (HS256).
//!
//! The token subject is the identity provider's user id, and `roles` lists the actor roles the user may act in. The
//! server maps the user id onto a customer, restaurant or courier profile for each request.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use chrono::{Duration, Utc};
use food_order_engine::db_types::Role;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The identity provider's user id
    pub sub: String,
    pub roles: Vec<Role>,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
}

impl JwtClaims {
    pub fn new(sub: &str, roles: &[Role], valid_for: Duration) -> Self {
        let exp = (Utc::now() + valid_for).timestamp().max(0) as usize;
        Self { sub: sub.to_string(), roles: roles.to_vec(), exp }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned().ok_or(AuthError::MissingToken.into());
        ready(claims)
    }
}

pub fn decoding_key(config: &AuthConfig) -> DecodingKey {
    DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes())
}

/// Validates the signature and expiry of an access token and returns its claims.
pub fn validate_token(token: &str, key: &DecodingKey) -> Result<JwtClaims, AuthError> {
    let data = jsonwebtoken::decode::<JwtClaims>(token, key, &Validation::default()).map_err(|e| {
        debug!("🔐️ Access token rejected. {e}");
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::InvalidToken | jsonwebtoken::errors::ErrorKind::Base64(_) => {
                AuthError::PoorlyFormattedToken(e.to_string())
            },
            _ => AuthError::ValidationError(e.to_string()),
        }
    })?;
    Ok(data.claims)
}

/// Signs access tokens with the shared secret. Production tokens come from the identity provider; this is used by
/// tooling and tests.
pub struct TokenIssuer {
    key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes()) }
    }

    pub fn issue_token(&self, claims: &JwtClaims) -> Result<String, AuthError> {
        jsonwebtoken::encode(&Header::default(), claims, &self.key)
            .map_err(|e| AuthError::ValidationError(e.to_string()))
    }
}
