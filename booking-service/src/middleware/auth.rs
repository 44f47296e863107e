//! Bearer-token authentication.
//!
//! Tokens are issued by the identity provider and signed with a shared HS256
//! secret. Their `sub` claim is the user id and `role` selects admin rights.
//! `auth_middleware` validates the token and stores the resulting
//! [`Principal`] in request extensions for handlers to extract.

use axum::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::{header, request::Parts};
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

use crate::models::{Principal, Role};
use crate::startup::AppState;

/// Claims carried by access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    pub sub: String,
    #[serde(default)]
    pub role: Role,
    pub exp: i64,
}

#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &Secret<String>) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Principal, AppError> {
        let data = decode::<AuthClaims>(token, &self.decoding_key, &self.validation)?;
        if data.claims.sub.is_empty() {
            return Err(AppError::Unauthorized(anyhow::anyhow!(
                "Token has no subject"
            )));
        }
        Ok(Principal {
            user_id: data.claims.sub,
            role: data.claims.role,
        })
    }
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Missing or invalid Authorization header"))
        })?;

    let principal = state.jwt.verify(token).map_err(|e| {
        tracing::warn!(error = %e, "Rejected bearer token");
        e
    })?;

    let span = tracing::Span::current();
    span.record("user_id", principal.user_id.as_str());

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Principal>().cloned().ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Request is not authenticated"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn secret() -> Secret<String> {
        Secret::new("test-jwt-secret".to_string())
    }

    fn token(claims: &AuthClaims, key: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(key.as_bytes()),
        )
        .unwrap()
    }

    fn in_an_hour() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn accepts_admin_token() {
        let claims = AuthClaims {
            sub: "admin-1".to_string(),
            role: Role::Admin,
            exp: in_an_hour(),
        };
        let principal = JwtVerifier::new(&secret())
            .verify(&token(&claims, "test-jwt-secret"))
            .unwrap();
        assert_eq!(principal, Principal::admin("admin-1"));
    }

    #[test]
    fn role_defaults_to_user() {
        let raw = serde_json::json!({ "sub": "user-1", "exp": in_an_hour() });
        let jwt = encode(
            &Header::default(),
            &raw,
            &EncodingKey::from_secret(b"test-jwt-secret"),
        )
        .unwrap();
        let principal = JwtVerifier::new(&secret()).verify(&jwt).unwrap();
        assert!(!principal.is_admin());
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let claims = AuthClaims {
            sub: "user-1".to_string(),
            role: Role::User,
            exp: in_an_hour(),
        };
        let err = JwtVerifier::new(&secret())
            .verify(&token(&claims, "someone-else"))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidToken(_)));
    }

    #[test]
    fn rejects_expired_token() {
        let claims = AuthClaims {
            sub: "user-1".to_string(),
            role: Role::User,
            exp: chrono::Utc::now().timestamp() - 3600,
        };
        assert!(JwtVerifier::new(&secret())
            .verify(&token(&claims, "test-jwt-secret"))
            .is_err());
    }
}
