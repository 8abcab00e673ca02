use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    Json,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::models::user::ROLE_ADMIN;

/// Аутентифицированный пользователь. Токены выдает сервис авторизации,
/// здесь они только проверяются.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// Пользователь с ролью `admin`.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

// Claims токена
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub role: String,
    pub exp: usize,
}

type Rejection = (StatusCode, Json<Value>);

fn reject(status: StatusCode, message: &str) -> Rejection {
    (status, Json(json!({ "error": message })))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
}

// Bearer JWT extractor
impl FromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = Rejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Authorization header missing"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Invalid Authorization header"))?;

        let claims = verify_token(token.trim(), &state.config.jwt.secret).map_err(|e| {
            tracing::debug!("JWT rejected: {:?}", e);
            reject(StatusCode::UNAUTHORIZED, "Invalid or expired token")
        })?;

        Ok(AuthUser {
            user_id: claims.user_id,
            role: claims.role,
        })
    }
}

impl FromRequestParts<Arc<crate::AppState>> for AdminUser {
    type Rejection = Rejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(reject(StatusCode::FORBIDDEN, "Admins only"));
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, exp: usize) -> String {
        let claims = Claims { user_id: 42, role: "admin".into(), exp };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn accepts_token_signed_with_same_secret() {
        let exp = (chrono::Utc::now().timestamp() + 3600) as usize;
        let claims = verify_token(&token("s3cret", exp), "s3cret").unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn rejects_foreign_or_expired_tokens() {
        let exp = (chrono::Utc::now().timestamp() + 3600) as usize;
        assert!(verify_token(&token("other", exp), "s3cret").is_err());
        let expired = (chrono::Utc::now().timestamp() - 3600) as usize;
        assert!(verify_token(&token("s3cret", expired), "s3cret").is_err());
    }
}
