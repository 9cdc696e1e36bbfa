//! Authentication middleware for JWT token validation
//!
//! Tokens are issued by the auth service. This service only verifies them:
//! a valid bearer token attaches an [`AuthUser`] to the request, anything
//! else leaves the request anonymous. Handlers that need a caller take
//! `AuthUser`, handlers where a caller is optional take `Option<AuthUser>`.

use anyhow::{Context, Result, bail};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{config::AppConfig, error::ApiError, state::AppState};

pub const LOGIN_REQUIRED: &str = "You must be logged in to perform this action.";

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Expiration time
    pub exp: u64,
    /// Issued at time
    #[serde(default)]
    pub iat: Option<u64>,
    /// Token type, access when absent
    #[serde(default)]
    pub token_type: Option<TokenType>,
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// Authenticated user information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
}

/// Verifies tokens issued by the auth service
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Verifier for HS256 tokens signed with a shared secret
    pub fn hs256(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verifier for RS256 tokens; `public_key` is PEM text or a path to a PEM file
    pub fn rs256(public_key: &str) -> Result<Self> {
        let pem = load_public_key(public_key)?;
        let decoding_key =
            DecodingKey::from_rsa_pem(pem.as_bytes()).context("Failed to create decoding key")?;

        Ok(Self {
            decoding_key,
            validation: Validation::new(Algorithm::RS256),
        })
    }

    /// Verifier configured by `APP_JWT_PUBLIC_KEY` or `APP_JWT_SECRET`.
    /// Without either every request is anonymous.
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>> {
        match (&config.jwt_public_key, &config.jwt_secret) {
            (Some(public_key), _) => Ok(Some(Self::rs256(public_key)?)),
            (None, Some(secret)) if secret.is_empty() => bail!("APP_JWT_SECRET must not be empty"),
            (None, Some(secret)) => Ok(Some(Self::hs256(secret))),
            (None, None) => Ok(None),
        }
    }

    /// User id of a valid access token
    pub fn verify(&self, token: &str) -> Option<Uuid> {
        match jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) if data.claims.token_type != Some(TokenType::Refresh) => Some(data.claims.sub),
            Ok(_) => {
                debug!("Refresh token presented as access token");
                None
            }
            Err(e) => {
                debug!("Rejected token: {}", e);
                None
            }
        }
    }
}

/// If the public key looks like a file path, read from file (try CWD, then crate root)
fn load_public_key(value: &str) -> Result<String> {
    if value.starts_with("-----BEGIN") {
        return Ok(value.to_string());
    }

    let key = std::fs::read_to_string(value)
        .or_else(|_| {
            let mut path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
            path.push(value);
            std::fs::read_to_string(path)
        })
        .with_context(|| format!("Failed to read public key file {}", value))?;

    Ok(key.trim().to_string())
}

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
}

/// Authentication middleware: attach the caller when the token is valid
pub async fn resolve_principal(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let user = match (&state.jwt, bearer_token(&req)) {
        (Some(verifier), Some(token)) => verifier.verify(&token).map(|id| AuthUser { id }),
        _ => None,
    };

    if let Some(user) = user {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or_else(|| ApiError::Unauthorized(LOGIN_REQUIRED.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn token(secret: &str, sub: Uuid, exp: u64, token_type: Option<TokenType>) -> String {
        let claims = Claims {
            sub,
            exp,
            iat: None,
            token_type,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn in_an_hour() -> u64 {
        (chrono::Utc::now().timestamp() + 3600) as u64
    }

    #[test]
    fn test_verify_valid_access_token() {
        let verifier = JwtVerifier::hs256("secret");
        let user = Uuid::new_v4();

        assert_eq!(verifier.verify(&token("secret", user, in_an_hour(), None)), Some(user));
        assert_eq!(
            verifier.verify(&token("secret", user, in_an_hour(), Some(TokenType::Access))),
            Some(user)
        );
    }

    #[test]
    fn test_verify_rejects_bad_tokens() {
        let verifier = JwtVerifier::hs256("secret");
        let user = Uuid::new_v4();

        assert_eq!(verifier.verify(&token("other", user, in_an_hour(), None)), None);
        assert_eq!(verifier.verify(&token("secret", user, 1_000, None)), None);
        assert_eq!(
            verifier.verify(&token("secret", user, in_an_hour(), Some(TokenType::Refresh))),
            None
        );
        assert_eq!(verifier.verify("not-a-token"), None);
    }

    #[test]
    fn test_inline_pem_is_used_as_is() {
        let pem = "-----BEGIN PUBLIC KEY-----\nabc\n-----END PUBLIC KEY-----";
        assert_eq!(load_public_key(pem).unwrap(), pem);
        assert!(load_public_key("does/not/exist.pem").is_err());
    }
}
